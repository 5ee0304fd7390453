use crate::consts;
use crate::game::grid::Bounds;
use crate::game::hooks::Settings;
use crate::scores::{BestScoreFile, ScoreHistory};
use crate::util::data_file_path;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, PartialEq)]
pub(crate) struct Config {
    /// Gameplay settings
    #[serde(default)]
    pub(crate) game: GameConfig,

    /// Settings about data files
    #[serde(default)]
    pub(crate) files: FileConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("neonsnake").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read or if the file's contents
    /// could not be deserialized.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        toml::from_str(&content).map_err(Into::into)
    }

    /// The store for the all-time best score: the file given in the
    /// configuration or, if that is not set, the default path
    pub(crate) fn best_score_store(&self) -> BestScoreFile {
        BestScoreFile::new(
            self.files
                .best_score_file
                .clone()
                .or_else(|| data_file_path("best.json")),
        )
    }

    /// The sink for final scores: the file given in the configuration or, if
    /// that is not set, the default path
    pub(crate) fn score_history(&self) -> ScoreHistory {
        ScoreHistory::new(
            self.files
                .scores_file
                .clone()
                .or_else(|| data_file_path("scores.json")),
        )
    }
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct GameConfig {
    pub(crate) sound: bool,
    pub(crate) master_volume: f64,
    pub(crate) obstacles: bool,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) repeat_weight_factor: f64,
}

impl GameConfig {
    /// The runtime settings the session starts out with
    pub(crate) fn settings(&self) -> Settings {
        Settings {
            sound: self.sound,
            master_volume: 0.0,
            obstacles: self.obstacles,
        }
        .with_volume(self.master_volume)
    }

    /// Size of the single-player field.  Sizes too small to hold a snake and
    /// its food are bumped up.
    pub(crate) fn bounds(&self) -> Bounds {
        Bounds::new(i32::from(self.width.max(4)), i32::from(self.height.max(4)))
    }
}

impl Default for GameConfig {
    fn default() -> GameConfig {
        GameConfig {
            sound: true,
            master_volume: 1.0,
            obstacles: true,
            width: consts::DEFAULT_BOARD_SIZE.width,
            height: consts::DEFAULT_BOARD_SIZE.height,
            repeat_weight_factor: consts::REPEAT_WEIGHT_FACTOR,
        }
    }
}

#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct FileConfig {
    /// Path at which the best score is stored
    best_score_file: Option<PathBuf>,

    /// Path at which the history of final scores is stored
    scores_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}
