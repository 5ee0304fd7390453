use super::grid::Cell;
use std::collections::VecDeque;

/// A snake on the field.
///
/// The body is stored head-first: index 0 is the head and the last element is
/// the tip of the tail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    pub(super) body: VecDeque<Cell>,
}

impl Snake {
    /// Create a one-cell snake at `head`
    pub(crate) fn new(head: Cell) -> Snake {
        Snake {
            body: VecDeque::from([head]),
        }
    }

    /// Build a snake from head-first cells.  Returns `None` if `cells` is
    /// empty.
    pub(crate) fn from_cells<I: IntoIterator<Item = Cell>>(cells: I) -> Option<Snake> {
        let body = cells.into_iter().collect::<VecDeque<_>>();
        (!body.is_empty()).then_some(Snake { body })
    }

    /// Return the position of the snake's head
    pub(crate) fn head(&self) -> Cell {
        // A snake is never empty: `new()` and `from_cells()` guarantee one
        // cell, and `truncate_tail()` never removes the head.
        self.body.front().copied().unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.body.len()
    }

    /// Iterate over the snake's cells, head first
    pub(crate) fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.body.iter().copied()
    }

    pub(crate) fn to_vec(&self) -> Vec<Cell> {
        self.cells().collect()
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Are any two segments in the same cell?
    pub(crate) fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.body.len());
        !self.body.iter().all(|c| seen.insert(*c))
    }

    /// Add a new head in front of the current one
    pub(crate) fn push_head(&mut self, cell: Cell) {
        self.body.push_front(cell);
    }

    /// Drop the last segment of the tail.  The head is never removed.
    pub(crate) fn pop_tail(&mut self) -> Option<Cell> {
        if self.body.len() > 1 {
            self.body.pop_back()
        } else {
            None
        }
    }

    /// Remove up to `qty` segments from the end of the tail, always leaving at
    /// least the head.  The removed cells are returned tail-first.
    pub(crate) fn truncate_tail(&mut self, qty: usize) -> Vec<Cell> {
        let qty = qty.min(self.body.len().saturating_sub(1));
        let mut removed = Vec::with_capacity(qty);
        for _ in 0..qty {
            removed.extend(self.body.pop_back());
        }
        removed
    }
}
