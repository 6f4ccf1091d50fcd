//! Single-writer async runtime shared by concurrent producers.

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
