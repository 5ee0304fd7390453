//! The collaborators a session talks to: shared settings, the score sink,
//! the best-score store, and the sound/particle effect trigger
use super::grid::Cell;
use super::powerup::PowerUpKind;
use crate::scores::{LoadError, SaveError};
use ratatui::style::Color;
use std::fmt;
use std::rc::Rc;

/// Runtime settings that the front end may change at any moment
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) sound: bool,
    pub(crate) master_volume: f64,
    pub(crate) obstacles: bool,
}

impl Settings {
    /// Should sounds be reported at all?
    pub(crate) fn audible(&self) -> bool {
        self.sound && self.master_volume > 0.0
    }

    pub(crate) fn with_volume(mut self, volume: f64) -> Settings {
        self.master_volume = volume.clamp(0.0, 1.0);
        self
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            sound: true,
            master_volume: 1.0,
            obstacles: true,
        }
    }
}

/// A handle on [`Settings`] shared between a session and whatever edits them.
/// Cloning the handle shares the same underlying settings.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedSettings(Rc<std::cell::Cell<Settings>>);

impl SharedSettings {
    pub(crate) fn new(settings: Settings) -> SharedSettings {
        SharedSettings(Rc::new(std::cell::Cell::new(settings)))
    }

    pub(crate) fn get(&self) -> Settings {
        self.0.get()
    }

    pub(crate) fn set(&self, settings: Settings) {
        self.0.set(settings);
    }

    pub(crate) fn toggle_sound(&self) -> bool {
        let mut s = self.get();
        s.sound = !s.sound;
        self.set(s);
        s.sound
    }

    pub(crate) fn toggle_obstacles(&self) -> bool {
        let mut s = self.get();
        s.obstacles = !s.obstacles;
        self.set(s);
        s.obstacles
    }
}

/// Named sound cues
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Sound {
    Eat,
    Bonus,
    Pause,
    GameOver,
    PowerUp(PowerUpKind),
}

impl Sound {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Sound::Eat => "eat",
            Sound::Bonus => "bonus",
            Sound::Pause => "pause",
            Sound::GameOver => "gameOver",
            Sound::PowerUp(PowerUpKind::SlowDown) => "slowDown",
            Sound::PowerUp(PowerUpKind::DoublePoints) => "doublePoints",
            Sound::PowerUp(PowerUpKind::Immunity) => "immunity",
            Sound::PowerUp(PowerUpKind::Shrink) => "shrink",
            Sound::PowerUp(PowerUpKind::ClearObstacles) => "clearObstacles",
            Sound::PowerUp(PowerUpKind::Bomb) => "bomb",
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Receives final scores when a session ends
pub(crate) trait ScoreSink: fmt::Debug {
    fn submit_score(&mut self, score: u32) -> Result<(), SaveError>;
}

/// Reads and writes the all-time best score
pub(crate) trait BestScoreStore: fmt::Debug {
    fn load_best(&self) -> Result<u32, LoadError>;
    fn save_best(&mut self, best: u32) -> Result<(), SaveError>;
}

/// Fire-and-forget sound & particle triggers
pub(crate) trait EffectSink: fmt::Debug {
    fn play_sound(&mut self, sound: Sound);
    fn spawn_particles(&mut self, cell: Cell, color: Color, cell_size: u16);
}

/// A collaborator that accepts everything and does nothing
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Discard;

impl ScoreSink for Discard {
    fn submit_score(&mut self, _score: u32) -> Result<(), SaveError> {
        Ok(())
    }
}

impl BestScoreStore for Discard {
    fn load_best(&self) -> Result<u32, LoadError> {
        Ok(0)
    }

    fn save_best(&mut self, _best: u32) -> Result<(), SaveError> {
        Ok(())
    }
}

impl EffectSink for Discard {
    fn play_sound(&mut self, _sound: Sound) {}

    fn spawn_particles(&mut self, _cell: Cell, _color: Color, _cell_size: u16) {}
}

/// Everything a session needs from the outside world, injected at
/// construction
#[derive(Debug)]
pub(crate) struct Hooks {
    pub(crate) settings: SharedSettings,
    pub(crate) scores: Box<dyn ScoreSink>,
    pub(crate) best: Box<dyn BestScoreStore>,
    pub(crate) effects: Box<dyn EffectSink>,
}

impl Hooks {
    pub(crate) fn new(settings: SharedSettings) -> Hooks {
        Hooks {
            settings,
            scores: Box::new(Discard),
            best: Box::new(Discard),
            effects: Box::new(Discard),
        }
    }

    pub(crate) fn with_scores<S: ScoreSink + 'static>(mut self, scores: S) -> Hooks {
        self.scores = Box::new(scores);
        self
    }

    pub(crate) fn with_best<B: BestScoreStore + 'static>(mut self, best: B) -> Hooks {
        self.best = Box::new(best);
        self
    }

    pub(crate) fn with_effects<E: EffectSink + 'static>(mut self, effects: E) -> Hooks {
        self.effects = Box::new(effects);
        self
    }

    /// Report a sound, honoring the current settings
    pub(crate) fn play_sound(&mut self, sound: Sound) {
        if self.settings.get().audible() {
            self.effects.play_sound(sound);
        }
    }

    pub(crate) fn spawn_particles(&mut self, cell: Cell, color: Color) {
        self.effects.spawn_particles(cell, color, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_settings_see_updates() {
        let a = SharedSettings::new(Settings::default());
        let b = a.clone();
        assert!(!b.toggle_obstacles());
        assert!(!a.get().obstacles);
        a.set(a.get().with_volume(3.0));
        assert_eq!(b.get().master_volume, 1.0);
        a.set(a.get().with_volume(-1.0));
        assert!(!b.get().audible());
    }

    #[test]
    fn sound_names() {
        assert_eq!(Sound::GameOver.to_string(), "gameOver");
        assert_eq!(
            Sound::PowerUp(PowerUpKind::ClearObstacles).to_string(),
            "clearObstacles"
        );
    }
}
