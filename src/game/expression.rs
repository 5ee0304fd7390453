use crate::consts;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The snake's face
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Expression {
    #[default]
    Normal,
    Blink,
    Aggressive,
    Relaxed,
    Surprised,
    Focused,
}

/// Which expression the snake wears at any given moment.
///
/// The resting expression is the one implied by the active buff (or
/// `Normal`).  Eating and instant power-ups briefly override it with a
/// "flash" that ends at a fixed time, after which the resting expression
/// shows again.  Every query takes the current time, so the result is a pure
/// function of the events fed in and their timestamps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct ExpressionState {
    resting: Expression,
    flash: Option<Flash>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Flash {
    expression: Expression,
    until: Duration,
}

impl ExpressionState {
    pub(crate) fn new() -> ExpressionState {
        ExpressionState::default()
    }

    pub(crate) fn current(&self, now: Duration) -> Expression {
        match self.flash {
            Some(Flash { expression, until }) if now < until => expression,
            _ => self.resting,
        }
    }

    pub(crate) fn set_resting(&mut self, expression: Expression) {
        self.resting = expression;
    }

    /// Close the eyes briefly after eating
    pub(crate) fn blink(&mut self, now: Duration) {
        self.flash_for(Expression::Blink, now, consts::BLINK_DURATION);
    }

    /// Show `expression` briefly in reaction to an instant effect
    pub(crate) fn react(&mut self, expression: Expression, now: Duration) {
        self.flash_for(expression, now, consts::REACTION_DURATION);
    }

    fn flash_for(&mut self, expression: Expression, now: Duration, length: Duration) {
        self.flash = Some(Flash {
            expression,
            until: now + length,
        });
    }

    pub(crate) fn reset(&mut self) {
        *self = ExpressionState::default();
    }
}

/// The glow that lights the snake up after a meal.
///
/// Each pulse eases from whatever the glow was at the moment of eating up to
/// full brightness, holds, then eases back down to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Glow {
    pulse: Option<Pulse>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pulse {
    started: Duration,
    from: f64,
}

impl Glow {
    pub(crate) fn new() -> Glow {
        Glow::default()
    }

    /// Start a new pulse at `now`
    pub(crate) fn trigger(&mut self, now: Duration) {
        let from = self.value(now);
        self.pulse = Some(Pulse { started: now, from });
    }

    /// Intensity of the glow at `now`, in `[0, 1]`
    pub(crate) fn value(&self, now: Duration) -> f64 {
        let Some(Pulse { started, from }) = self.pulse else {
            return 0.0;
        };
        let t = now.saturating_sub(started);
        // The hold is measured from the trigger, so the rise eats into it
        let hold_end = consts::GLOW_HOLD.max(consts::GLOW_RISE);
        if t < consts::GLOW_RISE {
            let p = ease_in_out_quad(t.as_secs_f64() / consts::GLOW_RISE.as_secs_f64());
            from + (1.0 - from) * p
        } else if t < hold_end {
            1.0
        } else if t < hold_end + consts::GLOW_FALL {
            let p = ease_in_out_quad((t - hold_end).as_secs_f64() / consts::GLOW_FALL.as_secs_f64());
            1.0 - p
        } else {
            0.0
        }
    }

    pub(crate) fn reset(&mut self) {
        self.pulse = None;
    }
}

pub(crate) fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
