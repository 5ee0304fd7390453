use serde::{Deserialize, Serialize};

/// One of the four unit steps a snake can take
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) enum Direction {
    #[serde(rename = "up")]
    North,
    #[serde(rename = "right")]
    East,
    #[serde(rename = "down")]
    South,
    #[serde(rename = "left")]
    West,
}

impl Direction {
    /// Return the `(dx, dy)` unit vector for this direction.  `y` grows
    /// downwards.
    pub(crate) fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub(crate) fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub(crate) fn is_opposite(self, other: Direction) -> bool {
        self.reverse() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::Cell;
    use rstest::rstest;

    #[rstest]
    #[case(Direction::North, Cell::new(2, 7), Cell::new(2, 6))]
    #[case(Direction::South, Cell::new(2, 7), Cell::new(2, 8))]
    #[case(Direction::East, Cell::new(2, 7), Cell::new(3, 7))]
    #[case(Direction::West, Cell::new(2, 7), Cell::new(1, 7))]
    #[case(Direction::West, Cell::new(0, 7), Cell::new(-1, 7))]
    fn test_step(#[case] d: Direction, #[case] from: Cell, #[case] to: Cell) {
        assert_eq!(from.step(d), to);
    }

    #[rstest]
    #[case(Direction::North, Direction::South, true)]
    #[case(Direction::East, Direction::West, true)]
    #[case(Direction::North, Direction::East, false)]
    #[case(Direction::West, Direction::West, false)]
    fn test_is_opposite(#[case] a: Direction, #[case] b: Direction, #[case] opposite: bool) {
        assert_eq!(a.is_opposite(b), opposite);
        assert_eq!(b.is_opposite(a), opposite);
    }

    #[test]
    fn serializes_as_wire_names() {
        assert_eq!(
            serde_json::to_string(&Direction::North).unwrap(),
            "\"up\""
        );
        assert_eq!(
            serde_json::from_str::<Direction>("\"left\"").unwrap(),
            Direction::West
        );
    }
}
