//! The terminal's side of sound & particle effects
use super::grid::Cell;
use super::hooks::{EffectSink, Sound};
use crate::consts;
use log::debug;
use ratatui::style::Color;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Pending {
    sounds: Vec<Sound>,
    bursts: Vec<(Cell, Color)>,
}

/// Collects the effects a session reports until the front end drains them.
/// Clones share one queue, so one clone can be handed to the session while
/// the screen keeps another.
#[derive(Clone, Debug, Default)]
pub(crate) struct EffectQueue(Rc<RefCell<Pending>>);

impl EffectQueue {
    pub(crate) fn new() -> EffectQueue {
        EffectQueue::default()
    }

    /// Take everything reported since the last call
    pub(crate) fn drain(&self) -> (Vec<Sound>, Vec<(Cell, Color)>) {
        let mut pending = self.0.borrow_mut();
        (
            std::mem::take(&mut pending.sounds),
            std::mem::take(&mut pending.bursts),
        )
    }
}

impl EffectSink for EffectQueue {
    fn play_sound(&mut self, sound: Sound) {
        self.0.borrow_mut().sounds.push(sound);
    }

    fn spawn_particles(&mut self, cell: Cell, color: Color, _cell_size: u16) {
        self.0.borrow_mut().bursts.push((cell, color));
    }
}

/// Terminals can't mix audio; the only thing worth making noise about is
/// a bonus or the end of the game, and the bell is all there is.
pub(crate) fn ring_for(sound: Sound) -> io::Result<()> {
    debug!("Sound: {sound}");
    if matches!(sound, Sound::Bonus | Sound::GameOver) {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Particle {
    pub(crate) cell: Cell,
    pub(crate) color: Color,
    born: Duration,
}

/// Short-lived sparks drawn where something was eaten or destroyed
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Particles(Vec<Particle>);

impl Particles {
    pub(crate) fn new() -> Particles {
        Particles::default()
    }

    pub(crate) fn add(&mut self, cell: Cell, color: Color, now: Duration) {
        self.0.push(Particle {
            cell,
            color,
            born: now,
        });
    }

    /// Forget particles that have burnt out
    pub(crate) fn prune(&mut self, now: Duration) {
        self.0
            .retain(|p| now.saturating_sub(p.born) < consts::PARTICLE_LIFETIME);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.0.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}
