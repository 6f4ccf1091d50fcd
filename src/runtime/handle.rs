use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::{
    core::log::{EventLog, HistoryError},
    persist::PersistError,
    record::EventRecord,
};

use super::events::HistoryEvent;

/// Errors returned by [`HistoryHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The log rejected the request.
    #[error(transparent)]
    History(#[from] HistoryError),
    /// An explicit snapshot request failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The runtime task has stopped.
    #[error("history runtime is not running")]
    ChannelClosed,
}

/// Queue sizes for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Commands buffered before producers wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber before it lags.
    pub event_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_buffer: 1024,
        }
    }
}

/// Cloneable front end to a log owned by a single task.
///
/// All producers go through one command queue, so evict, insert and snapshot
/// run as one step per append in arrival order.
#[derive(Clone)]
pub struct HistoryHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<HistoryEvent>,
}

enum Command {
    Append {
        record: EventRecord,
        resp: oneshot::Sender<Option<EventRecord>>,
    },
    EvictOldest {
        resp: oneshot::Sender<Result<EventRecord, RuntimeError>>,
    },
    MostRecent {
        resp: oneshot::Sender<Option<EventRecord>>,
    },
    Size {
        resp: oneshot::Sender<usize>,
    },
    Capacity {
        resp: oneshot::Sender<usize>,
    },
    Entries {
        resp: oneshot::Sender<Vec<EventRecord>>,
    },
    Resnapshot {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<EventLog>,
    },
}

/// Moves `log` onto a blocking tokio thread and returns a handle to it.
///
/// Sink writes happen on that thread, never on an async worker. Zero queue
/// sizes are raised to 1.
pub fn spawn_history(log: EventLog, config: RuntimeConfig) -> HistoryHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<HistoryEvent>(config.event_buffer.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::task::spawn_blocking(move || {
        let mut log = log;
        while let Some(cmd) = cmd_rx.blocking_recv() {
            if let Some(resp) = handle_command(cmd, &mut log, &events_tx_loop) {
                let _ = resp.send(log);
                break;
            }
        }
        debug!("history runtime stopped");
    });

    HistoryHandle { cmd_tx, events_tx }
}

impl HistoryHandle {
    /// Subscribes to [`HistoryEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events_tx.subscribe()
    }

    /// Appends a record. Returns the record evicted to make room, if any.
    pub async fn append(&self, record: EventRecord) -> Result<Option<EventRecord>, RuntimeError> {
        self.request(|resp| Command::Append { record, resp }).await
    }

    /// Removes the oldest record.
    pub async fn evict_oldest(&self) -> Result<EventRecord, RuntimeError> {
        self.request(|resp| Command::EvictOldest { resp }).await?
    }

    /// Last appended record.
    pub async fn most_recent(&self) -> Result<Option<EventRecord>, RuntimeError> {
        self.request(|resp| Command::MostRecent { resp }).await
    }

    /// Number of retained records.
    pub async fn size(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Size { resp }).await
    }

    /// Maximum number of retained records.
    pub async fn capacity(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Capacity { resp }).await
    }

    /// Copy of the history, oldest first.
    pub async fn entries(&self) -> Result<Vec<EventRecord>, RuntimeError> {
        self.request(|resp| Command::Entries { resp }).await
    }

    /// Rewrites the snapshot from the current history.
    pub async fn resnapshot(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Resnapshot { resp }).await?
    }

    /// Stops the runtime and hands the log back.
    pub async fn shutdown(&self) -> Result<EventLog, RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

/// Applies one command. Returns the shutdown responder when the loop should stop.
fn handle_command(
    cmd: Command,
    log: &mut EventLog,
    events_tx: &broadcast::Sender<HistoryEvent>,
) -> Option<oneshot::Sender<EventLog>> {
    match cmd {
        Command::Append { record, resp } => {
            let time = record.time;
            let kind = record.kind.clone();
            let outcome = log.push_record(record);

            if let Some(old) = &outcome.evicted {
                let _ = events_tx.send(HistoryEvent::Evicted { time: old.time });
            }
            let _ = events_tx.send(HistoryEvent::Appended { time, kind });
            if let Some(err) = &outcome.persist_error {
                let _ = events_tx.send(HistoryEvent::PersistFailed {
                    reason: err.to_string(),
                });
            }
            let _ = resp.send(outcome.evicted);
        }
        Command::EvictOldest { resp } => {
            let res = log.evict_oldest().map_err(RuntimeError::from).map(|outcome| {
                let _ = events_tx.send(HistoryEvent::Evicted {
                    time: outcome.evicted.time,
                });
                if let Some(err) = &outcome.persist_error {
                    let _ = events_tx.send(HistoryEvent::PersistFailed {
                        reason: err.to_string(),
                    });
                }
                outcome.evicted
            });
            let _ = resp.send(res);
        }
        Command::MostRecent { resp } => {
            let _ = resp.send(log.most_recent_cloned());
        }
        Command::Size { resp } => {
            let _ = resp.send(log.size());
        }
        Command::Capacity { resp } => {
            let _ = resp.send(log.capacity());
        }
        Command::Entries { resp } => {
            let _ = resp.send(log.export_snapshot());
        }
        Command::Resnapshot { resp } => {
            let res = log.resnapshot().map_err(RuntimeError::from);
            if let Err(err) = &res {
                let _ = events_tx.send(HistoryEvent::PersistFailed {
                    reason: err.to_string(),
                });
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => return Some(resp),
    }

    None
}
