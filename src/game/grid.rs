use super::direction::Direction;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A grid coordinate.  Cells produced by the board are always within its
/// [`Bounds`], but a freshly advanced head may briefly fall outside of them
/// before a wall collision is resolved, hence the signed components.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub(crate) struct Cell {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl Cell {
    pub(crate) const fn new(x: i32, y: i32) -> Cell {
        Cell { x, y }
    }

    /// Return the cell one step away in `direction`, without any bounds
    /// checking
    pub(crate) fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance between two cells
    pub(crate) fn distance(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// The dimensions of a playing field
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Bounds {
    pub(crate) cols: i32,
    pub(crate) rows: i32,
}

impl Bounds {
    pub(crate) const fn new(cols: i32, rows: i32) -> Bounds {
        Bounds { cols, rows }
    }

    pub(crate) fn contains(self, cell: Cell) -> bool {
        (0..self.cols).contains(&cell.x) && (0..self.rows).contains(&cell.y)
    }

    /// Map an out-of-bounds cell onto the opposite edge of the field
    pub(crate) fn wrap(self, cell: Cell) -> Cell {
        Cell {
            x: cell.x.rem_euclid(self.cols),
            y: cell.y.rem_euclid(self.rows),
        }
    }

    pub(crate) fn center(self) -> Cell {
        Cell::new(self.cols / 2, self.rows / 2)
    }


    /// Iterate over every cell in the field in row-major order
    pub(crate) fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Cell::new(x, y)))
    }

    /// Pick a uniformly random cell in the field
    pub(crate) fn random_cell<R: Rng>(self, rng: &mut R) -> Cell {
        Cell::new(rng.random_range(0..self.cols), rng.random_range(0..self.rows))
    }
}
