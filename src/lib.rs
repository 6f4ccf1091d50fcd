//! Bounded, persisted history of chat-protocol events.
//!
//! # Examples
//!
//! In-memory usage with [`core::log::EventLog`]:
//! ```
//! use chanlog::core::log::EventLog;
//!
//! let mut log = EventLog::new(2).expect("capacity");
//! let _ = log.append(1, "JOIN", Some("alice"), &[] as &[&str]);
//! let _ = log.append(2, "CHANNEL", Some("bob"), &["#rust", "hello"]);
//! let outcome = log.append(3, "CHANNEL", Some("carol"), &["#rust", "hi"]);
//!
//! assert_eq!(outcome.evicted.map(|r| r.kind), Some("JOIN".to_string()));
//! assert_eq!(log.size(), 2);
//! assert_eq!(log.most_recent().map(|r| r.origin.as_str()), Some("carol"));
//! ```
//!
//! Feeding protocol events through a recorder into a JSON-backed log:
//! ```no_run
//! use chanlog::{
//!     core::log::EventLog,
//!     dispatch::{EventKind, ProtocolEvent, Recorder},
//!     persist::json::JsonFileSink,
//! };
//!
//! let mut log = EventLog::with_sink(128, Box::new(JsonFileSink::new("messages.json")))
//!     .expect("capacity");
//! let recorder: Recorder = Recorder::default();
//! let event = ProtocolEvent::new(EventKind::Channel, Some("bob"), ["#rust", "hello"]);
//! assert!(recorder.dispatch(&event, &mut log));
//! ```
#![deny(missing_docs)]

/// Configuration for building a history.
pub mod config;
/// Core in-memory history.
pub mod core;
/// Protocol event selection and timestamping.
pub mod dispatch;
/// Snapshot sinks.
pub mod persist;
/// Event record type.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types and defaults.
pub mod types;
