//! Selection of protocol events worth recording.
//!
//! The protocol client hands every parsed event to a [`Recorder`], which
//! stamps the ones its [`RecordPolicy`] accepts and forwards them to an
//! [`EventObserver`] (normally an [`crate::core::log::EventLog`]).

use std::{
    borrow::Cow,
    time::{SystemTime, UNIX_EPOCH},
};

use hashbrown::HashSet;
use tracing::warn;

use crate::{core::log::EventObserver, types::Timestamp};

/// Kind of inbound protocol event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Session established.
    Connect,
    /// Someone joined a channel.
    Join,
    /// Nick change.
    Nick,
    /// Someone left the network.
    Quit,
    /// Someone left a channel.
    Part,
    /// Channel mode change.
    Mode,
    /// Topic change.
    Topic,
    /// Someone was kicked.
    Kick,
    /// Message to a channel.
    Channel,
    /// Private message.
    PrivMsg,
    /// Numeric server reply.
    Numeric(u32),
    /// Anything the client did not classify.
    Unknown(String),
}

impl EventKind {
    /// Name stored as the record `type`.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Connect => Cow::Borrowed("CONNECT"),
            Self::Join => Cow::Borrowed("JOIN"),
            Self::Nick => Cow::Borrowed("NICK"),
            Self::Quit => Cow::Borrowed("QUIT"),
            Self::Part => Cow::Borrowed("PART"),
            Self::Mode => Cow::Borrowed("MODE"),
            Self::Topic => Cow::Borrowed("TOPIC"),
            Self::Kick => Cow::Borrowed("KICK"),
            Self::Channel => Cow::Borrowed("CHANNEL"),
            Self::PrivMsg => Cow::Borrowed("PRIVMSG"),
            Self::Numeric(code) => Cow::Owned(code.to_string()),
            Self::Unknown(name) => Cow::Borrowed(name.as_str()),
        }
    }
}

/// One parsed protocol event as delivered by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Sender, absent for server-level events.
    pub origin: Option<String>,
    /// Arguments in wire order.
    pub params: Vec<String>,
}

impl ProtocolEvent {
    /// Convenience constructor.
    pub fn new<S: Into<String>>(
        kind: EventKind,
        origin: Option<&str>,
        params: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            kind,
            origin: origin.map(str::to_string),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// Set of event names that get recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPolicy {
    recorded: HashSet<String>,
}

impl Default for RecordPolicy {
    /// Nick, quit, part, topic and kick events, plus channel messages.
    fn default() -> Self {
        Self::only(["NICK", "QUIT", "PART", "TOPIC", "KICK", "CHANNEL"])
    }
}

impl RecordPolicy {
    /// Records nothing.
    pub fn none() -> Self {
        Self {
            recorded: HashSet::new(),
        }
    }

    /// Records exactly the named event types.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            recorded: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds an event type.
    pub fn record(mut self, name: impl Into<String>) -> Self {
        self.recorded.insert(name.into());
        self
    }

    /// Whether `event` should reach the log.
    ///
    /// Channel messages only count when they carry exactly a target and a text.
    pub fn accepts(&self, event: &ProtocolEvent) -> bool {
        let name = event.kind.name();
        if !self.recorded.contains(&*name) {
            return false;
        }
        match event.kind {
            EventKind::Channel => event.params.len() == 2,
            _ => true,
        }
    }
}

/// Source of record timestamps.
pub trait Clock: Send {
    /// Current time in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        unix_seconds(SystemTime::now())
    }
}

/// Seconds since epoch, or 0 for instants before it.
fn unix_seconds(at: SystemTime) -> Timestamp {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as Timestamp,
        Err(err) => {
            warn!(
                behind_secs = err.duration().as_secs(),
                "system clock before unix epoch; stamping 0"
            );
            0
        }
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Filters protocol events and forwards accepted ones with a timestamp.
#[derive(Debug, Clone, Default)]
pub struct Recorder<C: Clock = SystemClock> {
    policy: RecordPolicy,
    clock: C,
}

impl<C: Clock> Recorder<C> {
    /// Builds a recorder from a policy and a clock.
    pub fn new(policy: RecordPolicy, clock: C) -> Self {
        Self { policy, clock }
    }

    /// Active policy.
    pub fn policy(&self) -> &RecordPolicy {
        &self.policy
    }

    /// Replaces the clock, e.g. to advance a [`FixedClock`] between events.
    pub fn set_clock(&mut self, clock: C) {
        self.clock = clock;
    }

    /// Forwards `event` to `observer` if the policy accepts it.
    ///
    /// Returns whether the event was recorded.
    pub fn dispatch(&self, event: &ProtocolEvent, observer: &mut impl EventObserver) -> bool {
        if !self.policy.accepts(event) {
            return false;
        }
        let params: Vec<&str> = event.params.iter().map(String::as_str).collect();
        observer.notify(
            self.clock.now(),
            &event.kind.name(),
            event.origin.as_deref(),
            &params,
        );
        true
    }
}
