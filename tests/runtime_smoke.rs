use std::time::Duration;

use chanlog::{
    core::log::EventLog,
    persist::{PersistError, PersistResult, SnapshotSink},
    record::EventRecord,
    runtime::{
        events::HistoryEvent,
        handle::{RuntimeConfig, RuntimeError, spawn_history},
    },
};

struct BrokenSink;

impl SnapshotSink for BrokenSink {
    fn write_snapshot(&mut self, _records: &[EventRecord]) -> PersistResult<()> {
        Err(PersistError::Message("read-only".to_string()))
    }
}

fn rec(time: i64, origin: &str) -> EventRecord {
    EventRecord::new(time, "CHANNEL", Some(origin), &["#c", "hi"])
}

#[tokio::test]
async fn concurrent_producers_never_exceed_capacity() {
    let handle = spawn_history(EventLog::new(8).expect("log"), RuntimeConfig::default());

    let mut tasks = Vec::new();
    for p in 0..4 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..25 {
                h.append(rec(p * 100 + i, &format!("p{p}"))).await.expect("append");
            }
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    assert_eq!(handle.size().await.expect("size"), 8);
    assert_eq!(handle.capacity().await.expect("capacity"), 8);

    let entries = handle.entries().await.expect("entries");
    for p in 0..4 {
        let mine: Vec<i64> = entries
            .iter()
            .filter(|r| r.origin == format!("p{p}"))
            .map(|r| r.time)
            .collect();
        let mut sorted = mine.clone();
        sorted.sort();
        assert_eq!(mine, sorted, "per-producer order must be kept");
    }

    let log = handle.shutdown().await.expect("shutdown");
    assert_eq!(log.size(), 8);
}

#[tokio::test]
async fn events_report_append_eviction_and_persist_failure() {
    let log = EventLog::with_sink(1, Box::new(BrokenSink)).expect("log");
    let handle = spawn_history(log, RuntimeConfig::default());
    let mut sub = handle.subscribe();

    assert_eq!(handle.append(rec(1, "a")).await.expect("append"), None);
    let evicted = handle.append(rec(2, "b")).await.expect("append");
    assert_eq!(evicted.map(|r| r.time), Some(1));

    let mut seen = Vec::new();
    while seen.len() < 5 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        seen.push(evt);
    }

    assert_eq!(
        seen[0],
        HistoryEvent::Appended {
            time: 1,
            kind: "CHANNEL".to_string()
        }
    );
    assert!(matches!(seen[1], HistoryEvent::PersistFailed { .. }));
    assert_eq!(seen[2], HistoryEvent::Evicted { time: 1 });
    assert_eq!(
        seen[3],
        HistoryEvent::Appended {
            time: 2,
            kind: "CHANNEL".to_string()
        }
    );
    assert!(matches!(seen[4], HistoryEvent::PersistFailed { .. }));

    assert_eq!(
        handle.most_recent().await.expect("most recent").map(|r| r.time),
        Some(2)
    );
    assert!(matches!(
        handle.resnapshot().await,
        Err(RuntimeError::Persist(_))
    ));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn handle_errors_after_shutdown() {
    let handle = spawn_history(EventLog::new(2).expect("log"), RuntimeConfig::default());
    assert!(matches!(
        handle.evict_oldest().await,
        Err(RuntimeError::History(_))
    ));

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(
        handle.size().await,
        Err(RuntimeError::ChannelClosed)
    ));
}

#[tokio::test]
async fn explicit_eviction_broadcasts_persist_failure() {
    let log = EventLog::with_sink(3, Box::new(BrokenSink)).expect("log");
    let handle = spawn_history(log, RuntimeConfig::default());
    handle.append(rec(1, "a")).await.expect("append");

    let mut sub = handle.subscribe();
    let evicted = handle.evict_oldest().await.expect("evict");
    assert_eq!(evicted.time, 1);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        seen.push(evt);
    }
    assert_eq!(seen[0], HistoryEvent::Evicted { time: 1 });
    assert!(matches!(seen[1], HistoryEvent::PersistFailed { .. }));

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn zero_queue_sizes_are_usable() {
    let cfg = RuntimeConfig {
        command_queue_bound: 0,
        event_buffer: 0,
    };
    let handle = spawn_history(EventLog::new(1).expect("log"), cfg);
    let mut sub = handle.subscribe();

    handle.append(rec(1, "a")).await.expect("append");
    assert_eq!(handle.size().await.expect("size"), 1);
    assert!(matches!(
        sub.recv().await.expect("recv"),
        HistoryEvent::Appended { time: 1, .. }
    ));

    handle.shutdown().await.expect("shutdown");
}
