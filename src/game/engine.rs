use super::direction::Direction;
use super::grid::{Bounds, Cell};
use super::obstacles::Obstacles;
use super::powerup::{PowerUp, PowerUpKind};
use super::snake::Snake;
use crate::consts;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// What the head ran into
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Collision {
    Wall,
    Body,
    Obstacle,
}

/// Returned when no free cell could be found for the food
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("no free cell for food after {attempts} attempts")]
pub(crate) struct BoardFull {
    attempts: usize,
}

/// Everything on the field: the snake, its heading, the food, the obstacles,
/// and any uncollected power-ups
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Board {
    pub(crate) bounds: Bounds,
    pub(crate) snake: Snake,
    /// The snake as it was before the most recent step, for interpolation
    pub(crate) prev_snake: Snake,
    pub(crate) direction: Direction,
    /// Input buffered until the next step
    pub(crate) next_direction: Direction,
    /// Set once a turn has been accepted; cleared by the next step
    turn_locked: bool,
    pub(crate) food: Cell,
    pub(crate) obstacles: Obstacles,
    pub(crate) power_ups: Vec<PowerUp>,
}

impl Board {
    /// A fresh board with a one-cell snake in the middle, heading east
    pub(crate) fn new(bounds: Bounds) -> Board {
        let snake = Snake::new(bounds.center());
        Board {
            bounds,
            prev_snake: snake.clone(),
            snake,
            direction: Direction::East,
            next_direction: Direction::East,
            turn_locked: false,
            food: Cell::default(),
            obstacles: Obstacles::default(),
            power_ups: Vec::new(),
        }
    }

    /// Buffer a change of direction for the next step.  At most one turn is
    /// accepted per step, and never a turn straight back onto the body.
    /// Returns `true` if the turn was accepted.
    pub(crate) fn set_direction(&mut self, direction: Direction) -> bool {
        if self.turn_locked
            || direction.is_opposite(self.direction)
            || direction == self.next_direction
        {
            return false;
        }
        self.next_direction = direction;
        self.turn_locked = true;
        true
    }

    #[cfg(test)]
    pub(crate) fn turn_locked(&self) -> bool {
        self.turn_locked
    }

    /// Commit the buffered direction and push a new head onto the snake.
    ///
    /// If the new head would leave the field, hit the body, or land on an
    /// obstacle, the snake is left untouched and the collision is returned,
    /// unless `immune` is set, in which case walls wrap around and
    /// everything else is passed through.  The tail is *not* popped; call
    /// [`Board::finish_step()`] once power-ups and food have been dealt with.
    pub(crate) fn step_head(&mut self, immune: bool) -> Result<Cell, Collision> {
        self.prev_snake = self.snake.clone();
        self.direction = self.next_direction;
        self.turn_locked = false;
        let mut head = self.snake.head().step(self.direction);
        let collision = if !self.bounds.contains(head) {
            Some(Collision::Wall)
        } else if self.snake.contains(head) {
            Some(Collision::Body)
        } else if self.obstacles.contains(head) {
            Some(Collision::Obstacle)
        } else {
            None
        };
        match collision {
            Some(c) if !immune => return Err(c),
            Some(Collision::Wall) => head = self.bounds.wrap(head),
            _ => (),
        }
        self.snake.push_head(head);
        Ok(head)
    }

    /// Pop the tail unless the snake grew this step
    pub(crate) fn finish_step(&mut self, grew: bool) {
        if !grew {
            self.snake.pop_tail();
        }
    }

    /// Remove and return the power-up at `cell`, if any
    pub(crate) fn take_power_up(&mut self, cell: Cell) -> Option<PowerUp> {
        let i = self.power_ups.iter().position(|p| p.cell == cell)?;
        Some(self.power_ups.remove(i))
    }

    /// Drop power-ups that have been lying around too long.  Returns the
    /// number removed.
    pub(crate) fn prune_power_ups(&mut self, now: Duration) -> usize {
        let before = self.power_ups.len();
        self.power_ups.retain(|p| !p.expired(now));
        before - self.power_ups.len()
    }

    /// Move the food to a random cell clear of the snake & obstacles
    pub(crate) fn place_food<R: Rng>(&mut self, rng: &mut R) -> Result<Cell, BoardFull> {
        for _ in 0..consts::FOOD_PLACEMENT_ATTEMPTS {
            let c = self.bounds.random_cell(rng);
            if !self.snake.contains(c) && !self.obstacles.contains(c) {
                self.food = c;
                return Ok(c);
            }
        }
        Err(BoardFull {
            attempts: consts::FOOD_PLACEMENT_ATTEMPTS,
        })
    }

    /// Put a new power-up of the given kind on a random free cell.  Returns
    /// `None` if no free cell turned up within the attempt budget.
    pub(crate) fn place_power_up<R: Rng>(
        &mut self,
        kind: PowerUpKind,
        now: Duration,
        rng: &mut R,
    ) -> Option<Cell> {
        for _ in 0..consts::POWER_UP_PLACEMENT_ATTEMPTS {
            let c = self.bounds.random_cell(rng);
            if !self.snake.contains(c)
                && !self.obstacles.contains(c)
                && !self.power_ups.iter().any(|p| p.cell == c)
            {
                self.power_ups.push(PowerUp {
                    kind,
                    cell: c,
                    spawned: now,
                });
                return Some(c);
            }
        }
        None
    }

    /// Is the head sitting on an obstacle, or are any two segments sharing a
    /// cell?  Only reachable while immune.
    pub(crate) fn overlapping(&self) -> bool {
        self.obstacles.contains(self.snake.head()) || self.snake.has_duplicates()
    }
}
