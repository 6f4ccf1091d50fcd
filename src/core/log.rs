//! Bounded event history and the observer seam dispatchers feed.

use std::collections::{VecDeque, vec_deque};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    persist::{PersistError, SnapshotSink},
    record::EventRecord,
    types::Timestamp,
};

/// Errors raised by [`EventLog`] itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A log must be able to hold at least one event.
    #[error("history capacity must be at least 1")]
    ZeroCapacity,
    /// An internal precondition did not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),
}

/// Result of a single [`EventLog::append`].
#[derive(Debug, Default)]
pub struct AppendOutcome {
    /// Record pushed out of the head to make room, if any.
    pub evicted: Option<EventRecord>,
    /// Snapshot failure. The append itself has already taken effect.
    pub persist_error: Option<PersistError>,
}

/// Result of [`EventLog::evict_oldest`].
#[derive(Debug)]
pub struct EvictOutcome {
    /// Record removed from the head.
    pub evicted: EventRecord,
    /// Snapshot failure. The eviction itself has already taken effect.
    pub persist_error: Option<PersistError>,
}

/// Receives events chosen for recording by a dispatcher.
pub trait EventObserver {
    /// Records one event observed at `time`.
    fn notify(&mut self, time: Timestamp, kind: &str, origin: Option<&str>, params: &[&str]);
}

/// Fixed-capacity, oldest-first history of protocol events.
///
/// Appending to a full log drops the oldest entry. After every append the
/// whole history is handed to the configured sink, if any.
pub struct EventLog {
    entries: VecDeque<EventRecord>,
    capacity: usize,
    sink: Option<Box<dyn SnapshotSink>>,
    persist_failures: u64,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("sink", &self.sink.as_ref().map(|s| s.destination()))
            .field("persist_failures", &self.persist_failures)
            .finish()
    }
}

impl EventLog {
    /// Creates an empty log with no sink.
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sink: None,
            persist_failures: 0,
        })
    }

    /// Creates an empty log that snapshots into `sink` after every append.
    pub fn with_sink(capacity: usize, sink: Box<dyn SnapshotSink>) -> Result<Self, HistoryError> {
        let mut log = Self::new(capacity)?;
        log.sink = Some(sink);
        Ok(log)
    }

    /// Appends a record, evicting the oldest one first when full, then
    /// snapshots the full history.
    pub fn append<S: AsRef<str>>(
        &mut self,
        time: Timestamp,
        kind: &str,
        origin: Option<&str>,
        params: &[S],
    ) -> AppendOutcome {
        self.push_record(EventRecord::new(time, kind, origin, params))
    }

    /// Same as [`EventLog::append`] for an already built record.
    pub fn push_record(&mut self, record: EventRecord) -> AppendOutcome {
        let evicted = if self.entries.len() >= self.capacity {
            // capacity >= 1, so a full log is never empty here
            self.pop_head()
        } else {
            None
        };
        if let Some(old) = &evicted {
            trace!(time = old.time, kind = %old.kind, "evicted oldest event");
        }

        self.entries.push_back(record);
        debug_assert!(self.entries.len() <= self.capacity);

        AppendOutcome {
            evicted,
            persist_error: self.write_snapshot().err(),
        }
    }

    /// Removes the oldest record and resnapshots.
    ///
    /// Fails with [`HistoryError::InvariantViolation`] on an empty log.
    pub fn evict_oldest(&mut self) -> Result<EvictOutcome, HistoryError> {
        let evicted = self
            .pop_head()
            .ok_or(HistoryError::InvariantViolation("evict_oldest on empty log"))?;
        Ok(EvictOutcome {
            evicted,
            persist_error: self.write_snapshot().err(),
        })
    }

    /// Last appended record.
    pub fn most_recent(&self) -> Option<&EventRecord> {
        self.entries.back()
    }

    /// Owned copy of [`EventLog::most_recent`].
    pub fn most_recent_cloned(&self) -> Option<EventRecord> {
        self.most_recent().cloned()
    }

    /// Number of retained records.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of retained records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, EventRecord> {
        self.entries.iter()
    }

    /// Copies the current history, oldest first.
    pub fn export_snapshot(&self) -> Vec<EventRecord> {
        self.entries.iter().cloned().collect()
    }

    /// Number of snapshot writes that have failed so far.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Writes the current history to the sink without mutating it.
    ///
    /// Returns `Ok` when no sink is attached.
    pub fn resnapshot(&mut self) -> Result<(), PersistError> {
        self.write_snapshot()
    }

    fn pop_head(&mut self) -> Option<EventRecord> {
        self.entries.pop_front()
    }

    fn write_snapshot(&mut self) -> Result<(), PersistError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };

        let records = self.entries.make_contiguous();
        match sink.write_snapshot(records) {
            Ok(()) => {
                debug!(entries = records.len(), dest = %sink.destination(), "history snapshot written");
                Ok(())
            }
            Err(err) => {
                self.persist_failures += 1;
                warn!(
                    error = %err,
                    dest = %sink.destination(),
                    failures = self.persist_failures,
                    "history snapshot failed; in-memory log kept"
                );
                Err(err)
            }
        }
    }
}

impl EventObserver for EventLog {
    fn notify(&mut self, time: Timestamp, kind: &str, origin: Option<&str>, params: &[&str]) {
        let _ = self.append(time, kind, origin, params);
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a EventRecord;
    type IntoIter = vec_deque::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
