//! High score table persisted as JSON
//!
//! Stored in the platform data directory (e.g. ~/.local/share/tetrion/highscores.json).
//! A missing or unreadable file is treated as an empty table; older files that
//! hold a bare array of scores are upgraded on load.

use crate::error::StoreError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Entries kept in the table
pub const MAX_SCORES: usize = 5;

/// Longest name stored with an entry
pub const MAX_NAME_LEN: usize = 5;

const LEGACY_NAME: &str = "AAA";
const LEGACY_DATE: &str = "2025-03-09";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub name: String,
    /// Local time as "YYYY-MM-DD HH:MM"
    pub date: String,
}

/// Either the current object format or the old plain list of numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScores {
    Entries(Vec<HighScoreEntry>),
    Legacy(Vec<f64>),
}

/// Sorted (best first) table of at most [`MAX_SCORES`] entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// `highscores.json` in the platform data directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tetrion", "tetrion")
            .map(|dirs| dirs.data_dir().join("highscores.json"))
    }

    /// Load the table from `path`, falling back to an empty one
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no high score file");
                return Self::default();
            }
        };

        let entries = match serde_json::from_str::<StoredScores>(&contents) {
            Ok(StoredScores::Entries(entries)) => entries,
            Ok(StoredScores::Legacy(scores)) => {
                debug!(count = scores.len(), "upgrading legacy high score list");
                scores
                    .into_iter()
                    .map(|score| HighScoreEntry {
                        score: score.max(0.0) as u64,
                        name: LEGACY_NAME.to_string(),
                        date: LEGACY_DATE.to_string(),
                    })
                    .collect()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable high score file, starting empty");
                Vec::new()
            }
        };

        let mut scores = Self { entries };
        scores.normalize();
        scores
    }

    /// Write the table as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Whether `score` would make it onto the table.
    ///
    /// Once full, a score has to beat the lowest entry; a tie does not.
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_SCORES {
            return true;
        }
        self.entries.last().is_some_and(|lowest| score > lowest.score)
    }

    /// Add an entry stamped with the current local time
    pub fn record_now(&mut self, score: u64, name: &str) -> bool {
        let date = chrono::Local::now().format(DATE_FORMAT).to_string();
        self.record(score, name, &date)
    }

    /// Add an entry if it qualifies. Blank names are never recorded.
    pub fn record(&mut self, score: u64, name: &str, date: &str) -> bool {
        let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        if name.is_empty() || !self.qualifies(score) {
            return false;
        }

        self.entries.push(HighScoreEntry {
            score,
            name,
            date: date.to_string(),
        });
        self.normalize();
        true
    }

    fn normalize(&mut self) {
        // Stable sort keeps earlier entries ahead of later ties
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_SCORES);
    }
}
