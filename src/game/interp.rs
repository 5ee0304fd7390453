//! Smooth motion between discrete ticks
use super::grid::Cell;
use super::snake::Snake;
use std::time::Duration;

/// A position in continuous space.  With a cell size of 1, whole numbers land
/// exactly on cells.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    pub(crate) fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Round to the nearest cell
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn to_cell(self, cell_size: f64) -> Cell {
        Cell::new(
            (self.x / cell_size).round() as i32,
            (self.y / cell_size).round() as i32,
        )
    }
}

/// How far through the current tick interval `now` is, clamped to `[0, 1]`
pub(crate) fn alpha(now: Duration, last_tick: Duration, tick: Duration) -> f64 {
    if tick.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_sub(last_tick);
    (elapsed.as_secs_f64() / tick.as_secs_f64()).clamp(0.0, 1.0)
}

/// Compute where to draw each segment of `curr`, moving it `alpha` of the
/// way from where the same segment was in `prev`.
///
/// A segment that jumped more than one cell in either axis (a wall wrap) or
/// that has no previous position (the snake just grew) is drawn at its
/// current cell.
pub(crate) fn interpolate(prev: &Snake, curr: &Snake, alpha: f64, cell_size: f64) -> Vec<Point> {
    let mut prev = prev.cells();
    curr.cells()
        .map(|c| {
            let (x, y) = match prev.next() {
                Some(p) if (c.x - p.x).abs() <= 1 && (c.y - p.y).abs() <= 1 => {
                    let px = f64::from(p.x);
                    let py = f64::from(p.y);
                    (
                        px + (f64::from(c.x) - px) * alpha,
                        py + (f64::from(c.y) - py) * alpha,
                    )
                }
                _ => (f64::from(c.x), f64::from(c.y)),
            };
            Point::new(x * cell_size, y * cell_size)
        })
        .collect()
}
