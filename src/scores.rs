//! Local persistence for the best score and the history of final scores
use crate::consts;
use crate::game::hooks::{BestScoreStore, ScoreSink};
use crate::util::ErrorChain;
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The all-time best score, stored as `{"best": N}`
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct BestScoreFile {
    path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
struct BestScoreRecord {
    best: u32,
}

impl BestScoreFile {
    /// `None` means no usable path could be determined; loading then fails
    /// and so does saving.
    pub(crate) fn new(path: Option<PathBuf>) -> BestScoreFile {
        BestScoreFile { path }
    }
}

impl BestScoreStore for BestScoreFile {
    fn load_best(&self) -> Result<u32, LoadError> {
        let path = self.path.as_deref().ok_or_else(|| LoadError::no_path("best score"))?;
        Ok(read_json::<BestScoreRecord>(path, "best score")?
            .unwrap_or_default()
            .best)
    }

    fn save_best(&mut self, best: u32) -> Result<(), SaveError> {
        let path = self.path.as_deref().ok_or_else(|| SaveError::no_path("best score"))?;
        write_json(path, &BestScoreRecord { best }, "best score")
    }
}

/// The most recent final scores, oldest first, stored as a JSON array
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ScoreHistory {
    path: Option<PathBuf>,
}

impl ScoreHistory {
    pub(crate) fn new(path: Option<PathBuf>) -> ScoreHistory {
        ScoreHistory { path }
    }

    pub(crate) fn load(&self) -> Result<Vec<u32>, LoadError> {
        let path = self.path.as_deref().ok_or_else(|| LoadError::no_path("scores"))?;
        Ok(read_json(path, "scores")?.unwrap_or_default())
    }
}

impl ScoreSink for ScoreHistory {
    fn submit_score(&mut self, score: u32) -> Result<(), SaveError> {
        let path = self.path.as_deref().ok_or_else(|| SaveError::no_path("scores"))?;
        let mut scores = match read_json::<Vec<u32>>(path, "scores") {
            Ok(scores) => scores.unwrap_or_default(),
            Err(e) => {
                warn!("{}; starting a new score history", ErrorChain(&e));
                Vec::new()
            }
        };
        scores.push(score);
        let excess = scores.len().saturating_sub(consts::SCORE_HISTORY_LENGTH);
        scores.drain(..excess);
        write_json(path, &scores, "scores")
    }
}

/// Read & deserialize a JSON file.  A missing file yields `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<Option<T>, LoadError> {
    let src = match fs_err::read(path) {
        Ok(src) => src,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LoadError::read(what, e)),
    };
    serde_json::from_slice(&src)
        .map(Some)
        .map_err(|e| LoadError::deserialize(what, e))
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<(), SaveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent).map_err(|e| SaveError::mkdir(what, e))?;
    }
    let mut src = serde_json::to_string(value).map_err(|e| SaveError::serialize(what, e))?;
    src.push('\n');
    fs_err::write(path, &src).map_err(|e| SaveError::write(what, e))?;
    Ok(())
}

#[derive(Debug, Error)]
#[error("Failed to save {what} to disk")]
pub(crate) struct SaveError {
    what: &'static str,
    #[source]
    source: SaveErrorSource,
}

impl SaveError {
    pub(crate) fn no_path(what: &'static str) -> Self {
        SaveError {
            what,
            source: SaveErrorSource::NoPath,
        }
    }

    fn mkdir(what: &'static str, e: std::io::Error) -> Self {
        SaveError {
            what,
            source: SaveErrorSource::Mkdir(e),
        }
    }

    fn serialize(what: &'static str, e: serde_json::Error) -> Self {
        SaveError {
            what,
            source: SaveErrorSource::Serialize(e),
        }
    }

    fn write(what: &'static str, e: std::io::Error) -> Self {
        SaveError {
            what,
            source: SaveErrorSource::Write(e),
        }
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize data")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write file")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read {what} from disk")]
pub(crate) struct LoadError {
    what: &'static str,
    #[source]
    source: LoadErrorSource,
}

impl LoadError {
    pub(crate) fn no_path(what: &'static str) -> Self {
        LoadError {
            what,
            source: LoadErrorSource::NoPath,
        }
    }

    fn read(what: &'static str, e: std::io::Error) -> Self {
        LoadError {
            what,
            source: LoadErrorSource::Read(e),
        }
    }

    fn deserialize(what: &'static str, e: serde_json::Error) -> Self {
        LoadError {
            what,
            source: LoadErrorSource::Deserialize(e),
        }
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to read file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize file contents")]
    Deserialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn best_score_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("best.json");
        let mut store = BestScoreFile::new(Some(path.clone()));
        assert_eq!(store.load_best().unwrap(), 0);
        store.save_best(42).unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "{\"best\":42}\n");
        assert_eq!(store.load_best().unwrap(), 42);
    }

    #[test]
    fn corrupt_best_score() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs_err::write(&path, "not json").unwrap();
        let store = BestScoreFile::new(Some(path));
        let e = store.load_best().unwrap_err();
        assert!(ErrorChain(&e)
            .to_string()
            .starts_with("Failed to read best score from disk: failed to deserialize file contents: "));
    }

    #[test]
    fn no_path() {
        let mut store = BestScoreFile::new(None);
        assert!(store.load_best().is_err());
        let e = store.save_best(1).unwrap_err();
        assert_eq!(
            ErrorChain(&e).to_string(),
            "Failed to save best score to disk: failed to determine path to local data directory"
        );
    }

    #[test]
    fn history_keeps_most_recent() {
        let dir = tempdir().unwrap();
        let mut history = ScoreHistory::new(Some(dir.path().join("scores.json")));
        assert_eq!(history.load().unwrap(), Vec::<u32>::new());
        for score in 0..60 {
            history.submit_score(score).unwrap();
        }
        let scores = history.load().unwrap();
        assert_eq!(scores.len(), consts::SCORE_HISTORY_LENGTH);
        assert_eq!(scores.first(), Some(&10));
        assert_eq!(scores.last(), Some(&59));
    }

    #[test]
    fn history_recovers_from_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");
        fs_err::write(&path, "{\"oops\": true}").unwrap();
        let mut history = ScoreHistory::new(Some(path));
        history.submit_score(7).unwrap();
        assert_eq!(history.load().unwrap(), [7]);
    }
}
