//! Event record stored in the history.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One observed protocol event.
///
/// Field order is the on-disk order: `time`, `type`, `origin`, `params`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Seconds since epoch, supplied by whoever constructs the record.
    pub time: Timestamp,
    /// Event name or numeric reply code rendered as a string.
    #[serde(rename = "type")]
    pub kind: String,
    /// Originating entity; empty when unknown.
    pub origin: String,
    /// Protocol arguments in wire order.
    pub params: Vec<String>,
}

impl EventRecord {
    /// Builds a record, mapping a missing origin to the empty string.
    pub fn new<S: AsRef<str>>(
        time: Timestamp,
        kind: impl Into<String>,
        origin: Option<&str>,
        params: &[S],
    ) -> Self {
        Self {
            time,
            kind: kind.into(),
            origin: origin.unwrap_or_default().to_string(),
            params: params.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }
}
