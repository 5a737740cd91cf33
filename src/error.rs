//! Errors from saving settings and high scores

use std::fmt;
use std::io;

/// An error that can be returned when persisting to disk.
///
/// Loading never produces one: unreadable files fall back to defaults.
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
    TomlSer(toml::ser::Error),
    /// No home/config directory could be determined for this platform
    NoConfigDir,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "i/o error: {e}"),
            StoreError::Json(e) => write!(f, "could not encode high scores: {e}"),
            StoreError::TomlSer(e) => write!(f, "could not encode settings: {e}"),
            StoreError::NoConfigDir => write!(f, "could not determine config directory"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Json(e) => Some(e),
            StoreError::TomlSer(e) => Some(e),
            StoreError::NoConfigDir => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(e: toml::ser::Error) -> Self {
        StoreError::TomlSer(e)
    }
}
