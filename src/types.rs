//! Shared primitive aliases and defaults.

/// Event time in whole seconds since the Unix epoch.
pub type Timestamp = i64;

/// Number of events retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 128;

/// Snapshot file written when no destination is configured.
pub const DEFAULT_SNAPSHOT_PATH: &str = "messages.json";
