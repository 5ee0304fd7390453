use super::expression::Expression;
use super::grid::Cell;
use crate::consts;
use enum_map::{Enum, EnumMap};
use rand::Rng;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Deserialize, Enum, Eq, Hash, PartialEq, Serialize)]
pub(crate) enum PowerUpKind {
    SlowDown,
    DoublePoints,
    Immunity,
    Shrink,
    ClearObstacles,
    Bomb,
}

/// The shape a power-up is drawn with
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Shape {
    Triangle,
    Quadrilateral,
    Hexagon,
    Circle,
    Star,
    Square,
}

impl Shape {
    /// Glyph used to draw the shape in a terminal cell
    pub(crate) fn symbol(self) -> char {
        match self {
            Shape::Triangle => '▲',
            Shape::Quadrilateral => '◆',
            Shape::Hexagon => '⬢',
            Shape::Circle => '◯',
            Shape::Star => '★',
            Shape::Square => '■',
        }
    }
}

/// What collecting a power-up does
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Effect {
    /// Occupies the active power-up slot for the given duration
    Buff(Duration),
    /// Applied once, synchronously, without occupying the slot
    Instant,
}

/// Static description of a power-up kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PowerUpSpec {
    pub(crate) color: Color,
    pub(crate) shape: Shape,
    pub(crate) effect: Effect,
    /// Base weight for random selection
    pub(crate) weight: f64,
    /// The kind never spawns while the score is below this
    pub(crate) min_score: u32,
    pub(crate) expression: Expression,
    pub(crate) label: &'static str,
}

static POWER_UPS: [PowerUpSpec; PowerUpKind::LENGTH] = [
    PowerUpSpec {
        color: Color::Rgb(0x34, 0x98, 0xdb),
        shape: Shape::Triangle,
        effect: Effect::Buff(Duration::from_secs(10)),
        weight: 3.0,
        min_score: consts::GATED_POWER_UP_SCORE,
        expression: Expression::Relaxed,
        label: "Slow Down",
    },
    PowerUpSpec {
        color: Color::Rgb(0xf1, 0xc4, 0x0f),
        shape: Shape::Quadrilateral,
        effect: Effect::Buff(Duration::from_secs(15)),
        weight: 2.0,
        min_score: 0,
        expression: Expression::Aggressive,
        label: "Double Points",
    },
    PowerUpSpec {
        color: Color::Rgb(0x2e, 0xcc, 0x71),
        shape: Shape::Hexagon,
        effect: Effect::Buff(Duration::from_secs(10)),
        weight: 2.0,
        min_score: 0,
        expression: Expression::Aggressive,
        label: "Immunity",
    },
    PowerUpSpec {
        color: Color::Rgb(0x9b, 0x59, 0xb6),
        shape: Shape::Circle,
        effect: Effect::Instant,
        weight: 1.0,
        min_score: consts::GATED_POWER_UP_SCORE,
        expression: Expression::Surprised,
        label: "Shrink",
    },
    PowerUpSpec {
        color: Color::Rgb(0xe7, 0x4c, 0x3c),
        shape: Shape::Star,
        effect: Effect::Instant,
        weight: 1.0,
        min_score: 0,
        expression: Expression::Focused,
        label: "Clear Obstacles",
    },
    PowerUpSpec {
        color: Color::Rgb(0x95, 0xa5, 0xa6),
        shape: Shape::Square,
        effect: Effect::Instant,
        weight: 1.0,
        min_score: 0,
        expression: Expression::Normal,
        label: "Bomb",
    },
];

impl PowerUpKind {
    pub(crate) fn spec(self) -> &'static PowerUpSpec {
        &POWER_UPS[self.into_usize()]
    }

    pub(crate) fn expression(self) -> Expression {
        self.spec().expression
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.spec().label)
    }
}

/// A power-up lying on the board, waiting to be collected
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct PowerUp {
    pub(crate) kind: PowerUpKind,
    pub(crate) cell: Cell,
    pub(crate) spawned: Duration,
}

impl PowerUp {
    /// Has the power-up been lying uncollected for too long?
    pub(crate) fn expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.spawned) >= consts::POWER_UP_TTL
    }
}

/// Compute the selection weight of every kind, given the current score and
/// the most recently spawned kind
pub(crate) fn weights(
    score: u32,
    last: Option<PowerUpKind>,
    repeat_factor: f64,
) -> EnumMap<PowerUpKind, f64> {
    EnumMap::from_fn(|kind: PowerUpKind| {
        let spec = kind.spec();
        let mut w = if score >= spec.min_score {
            spec.weight
        } else {
            0.0
        };
        if last == Some(kind) {
            w *= repeat_factor;
        }
        w
    })
}

/// Pick a kind at random in proportion to `weights`.  Returns `None` if every
/// weight is zero.
pub(crate) fn choose<R: Rng>(weights: &EnumMap<PowerUpKind, f64>, rng: &mut R) -> Option<PowerUpKind> {
    let total = weights.values().sum::<f64>();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.random::<f64>() * total;
    for (kind, &w) in weights {
        if roll < w {
            return Some(kind);
        }
        roll -= w;
    }
    // Rounding can leave `roll` a hair above the last bucket
    weights.iter().find(|&(_, &w)| w > 0.0).map(|(kind, _)| kind)
}
