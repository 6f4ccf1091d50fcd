/// JSON document sink.
pub mod json;
/// SQLite table sink.
pub mod sqlite;

use thiserror::Error;

use crate::record::EventRecord;

/// Failure to write or read a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding or decoding error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failure reported by a [`SnapshotSink`] implemented outside this crate.
    #[error("{0}")]
    Message(String),
}

/// Result alias for sink operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Destination for full-history snapshots.
///
/// Every call receives the complete current history, oldest first, and must
/// fully supersede whatever the previous call wrote.
pub trait SnapshotSink: Send {
    /// Persists `records` as the new snapshot.
    fn write_snapshot(&mut self, records: &[EventRecord]) -> PersistResult<()>;

    /// Human-readable destination, used in log fields.
    fn destination(&self) -> String {
        String::from("<unnamed>")
    }
}
