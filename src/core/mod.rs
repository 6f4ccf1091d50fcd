//! In-memory authoritative history.

/// Bounded event log and its observer seam.
pub mod log;
