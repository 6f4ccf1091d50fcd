//! History configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    core::log::{EventLog, HistoryError},
    persist::{PersistError, SnapshotSink, json::JsonFileSink, sqlite::SqliteSnapshotSink},
    types::{DEFAULT_CAPACITY, DEFAULT_SNAPSHOT_PATH},
};

/// Errors while loading a config or building a log from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    /// Config document is malformed.
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    /// Values are out of range.
    #[error("invalid config: {0}")]
    Invalid(#[from] HistoryError),
    /// Sink could not be opened.
    #[error("opening sink: {0}")]
    Sink(#[from] PersistError),
}

/// Where snapshots go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Keep history in memory only.
    None,
    /// Compact JSON array rewritten on every append.
    Json {
        /// Snapshot file.
        path: PathBuf,
    },
    /// SQLite `history` table rewritten on every append.
    Sqlite {
        /// Database file.
        path: PathBuf,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Json {
            path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

/// Capacity and sink for one history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of retained events.
    pub capacity: usize,
    /// Snapshot destination.
    pub sink: SinkConfig,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sink: SinkConfig::default(),
        }
    }
}

impl HistoryConfig {
    /// Parses a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects a zero capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(HistoryError::ZeroCapacity.into());
        }
        Ok(())
    }

    /// Opens the configured sink and creates an empty log.
    pub fn build_log(&self) -> Result<EventLog, ConfigError> {
        self.validate()?;
        let sink: Option<Box<dyn SnapshotSink>> = match &self.sink {
            SinkConfig::None => None,
            SinkConfig::Json { path } => Some(Box::new(JsonFileSink::new(path))),
            SinkConfig::Sqlite { path } => Some(Box::new(SqliteSnapshotSink::open(path)?)),
        };
        let log = match sink {
            Some(sink) => EventLog::with_sink(self.capacity, sink)?,
            None => EventLog::new(self.capacity)?,
        };
        Ok(log)
    }
}
