use super::grid::{Bounds, Cell};
use super::snake::Snake;
use crate::consts;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

/// The set of cells that kill the snake on contact, plus the state of the
/// "glitch" transition that plays whenever the set is regenerated mid-game
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Obstacles {
    cells: HashSet<Cell>,
    glitch: Option<Glitch>,
}

/// An in-progress transition from one obstacle layout to another.  Both sets
/// are drawn while it lasts; only the new set blocks movement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Glitch {
    pub(crate) old: HashSet<Cell>,
    pub(crate) started: Duration,
}

impl Obstacles {
    /// The layout used at the start of a session: two vertical bars on either
    /// side of the center of the field
    pub(crate) fn static_pattern(bounds: Bounds) -> Obstacles {
        let center = bounds.center();
        let cells = (0..consts::STATIC_BAR_LENGTH)
            .flat_map(|i| {
                let y = center.y - consts::STATIC_BAR_LENGTH / 2 + i;
                [
                    Cell::new(center.x - consts::STATIC_BAR_OFFSET, y),
                    Cell::new(center.x + consts::STATIC_BAR_OFFSET, y),
                ]
            })
            .filter(|&c| bounds.contains(c))
            .collect();
        Obstacles {
            cells,
            glitch: None,
        }
    }

    /// Generate a layout of random rectangular clusters, keeping clear of the
    /// snake and of the area around its head
    pub(crate) fn random_clusters<R: Rng>(bounds: Bounds, snake: &Snake, rng: &mut R) -> HashSet<Cell> {
        let mut cells = HashSet::new();
        let head = snake.head();
        let margin = consts::CLUSTER_EDGE_MARGIN;
        let qty = rng.random_range(consts::CLUSTER_QTY);
        for _ in 0..qty {
            let width = rng.random_range(consts::CLUSTER_SIDE);
            let height = rng.random_range(consts::CLUSTER_SIDE);
            let max_x = bounds.cols - margin - width;
            let max_y = bounds.rows - margin - height;
            if max_x < margin || max_y < margin {
                // Field too small for a cluster of this size
                continue;
            }
            let origin = Cell::new(rng.random_range(margin..=max_x), rng.random_range(margin..=max_y));
            for dx in 0..width {
                for dy in 0..height {
                    let c = Cell::new(origin.x + dx, origin.y + dy);
                    if !snake.contains(c) && c.distance(head) > consts::HEAD_CLEARANCE {
                        cells.insert(c);
                    }
                }
            }
        }
        cells
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// Remove every obstacle, returning the cells that were cleared.  Any
    /// glitch in progress is cut short.
    pub(crate) fn clear(&mut self) -> Vec<Cell> {
        self.glitch = None;
        self.cells.drain().collect()
    }

    /// Swap in a new layout and start the glitch transition at `now`
    pub(crate) fn begin_glitch(&mut self, new: HashSet<Cell>, now: Duration) {
        let old = std::mem::replace(&mut self.cells, new);
        self.glitch = Some(Glitch { old, started: now });
    }

    pub(crate) fn end_glitch(&mut self) {
        self.glitch = None;
    }

    pub(crate) fn glitch(&self) -> Option<&Glitch> {
        self.glitch.as_ref()
    }

    pub(crate) fn is_glitching(&self) -> bool {
        self.glitch.is_some()
    }
}

impl FromIterator<Cell> for Obstacles {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Obstacles {
        Obstacles {
            cells: iter.into_iter().collect(),
            glitch: None,
        }
    }
}

impl Glitch {
    /// Fraction of the transition that has elapsed at `now`, in `[0, 1]`
    pub(crate) fn progress(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.started);
        (elapsed.as_secs_f64() / consts::GLITCH_DURATION.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Produce the positions and opacities at which to draw the outgoing and
    /// incoming layouts at `now`.  The outgoing layout fades out with a fixed
    /// jitter; the incoming one fades in while its jitter settles.
    pub(crate) fn sample<R: Rng>(&self, new: &Obstacles, now: Duration, rng: &mut R) -> Vec<GlitchSprite> {
        let p = self.progress(now);
        let old_jitter = consts::GLITCH_OLD_JITTER;
        let new_jitter = consts::GLITCH_NEW_JITTER * (1.0 - p);
        let mut sprites = Vec::with_capacity(self.old.len() + new.len());
        for &cell in &self.old {
            sprites.push(GlitchSprite::jittered(cell, old_jitter, 1.0 - p, rng));
        }
        for cell in new.iter() {
            sprites.push(GlitchSprite::jittered(cell, new_jitter, p, rng));
        }
        sprites
    }
}

/// One obstacle drawn mid-glitch, in cell units
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GlitchSprite {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) opacity: f64,
}

impl GlitchSprite {
    fn jittered<R: Rng>(cell: Cell, amplitude: f64, opacity: f64, rng: &mut R) -> GlitchSprite {
        let mut offset = || {
            if amplitude > 0.0 {
                rng.random_range(-amplitude..=amplitude)
            } else {
                0.0
            }
        };
        GlitchSprite {
            x: f64::from(cell.x) + offset(),
            y: f64::from(cell.y) + offset(),
            opacity,
        }
    }
}
