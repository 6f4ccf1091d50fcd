//! Runtime event stream payloads.

use crate::types::Timestamp;

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A record was appended.
    Appended {
        /// Record time.
        time: Timestamp,
        /// Record type.
        kind: String,
    },
    /// The oldest record was dropped to make room.
    Evicted {
        /// Time of the dropped record.
        time: Timestamp,
    },
    /// The snapshot after a mutation could not be written.
    PersistFailed {
        /// Rendered sink error.
        reason: String,
    },
}
