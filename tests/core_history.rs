use std::sync::{Arc, Mutex};

use chanlog::{
    core::log::EventLog,
    persist::{PersistError, PersistResult, SnapshotSink},
    record::EventRecord,
};

const NO_PARAMS: &[&str] = &[];

struct RecordingSink {
    writes: Arc<Mutex<Vec<Vec<EventRecord>>>>,
}

impl SnapshotSink for RecordingSink {
    fn write_snapshot(&mut self, records: &[EventRecord]) -> PersistResult<()> {
        self.writes.lock().expect("lock").push(records.to_vec());
        Ok(())
    }
}

struct BrokenSink;

impl SnapshotSink for BrokenSink {
    fn write_snapshot(&mut self, _records: &[EventRecord]) -> PersistResult<()> {
        Err(PersistError::Message("disk on fire".to_string()))
    }
}

fn summary(log: &EventLog) -> Vec<(i64, String, String, Vec<String>)> {
    log.iter()
        .map(|r| (r.time, r.kind.clone(), r.origin.clone(), r.params.clone()))
        .collect()
}

#[test]
fn oldest_entry_is_evicted_when_full() {
    let mut log = EventLog::new(2).expect("log");
    let _ = log.append(1, "join", Some("alice"), NO_PARAMS);
    let _ = log.append(2, "msg", Some("bob"), &["hello"]);
    let _ = log.append(3, "msg", Some("carol"), &["hi", "there"]);

    assert_eq!(
        summary(&log),
        vec![
            (2, "msg".to_string(), "bob".to_string(), vec!["hello".to_string()]),
            (
                3,
                "msg".to_string(),
                "carol".to_string(),
                vec!["hi".to_string(), "there".to_string()]
            ),
        ]
    );
    assert!(log.iter().all(|r| r.origin != "alice"));
}

#[test]
fn most_recent_tracks_last_append() {
    let mut log = EventLog::new(3).expect("log");
    assert!(log.most_recent().is_none());

    for t in 0..10 {
        let _ = log.append(t, "NICK", Some("x"), &["y"]);
        assert_eq!(log.most_recent().map(|r| r.time), Some(t));
        assert!(log.size() <= log.capacity());
    }
}

#[test]
fn reads_are_idempotent() {
    let mut log = EventLog::new(4).expect("log");
    let _ = log.append(5, "TOPIC", Some("op"), &["#c", "new topic"]);

    let first = (log.size(), log.most_recent_cloned());
    for _ in 0..5 {
        assert_eq!((log.size(), log.most_recent_cloned()), first);
    }
}

#[test]
fn every_append_triggers_exactly_one_full_snapshot() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let sink = RecordingSink {
        writes: Arc::clone(&writes),
    };
    let mut log = EventLog::with_sink(2, Box::new(sink)).expect("log");

    let _ = log.append(1, "QUIT", Some("a"), &["bye"]);
    let _ = log.append(2, "QUIT", Some("b"), &["bye"]);
    let _ = log.append(3, "QUIT", Some("c"), &["bye"]);

    let writes = writes.lock().expect("lock");
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].len(), 1);
    assert_eq!(writes[1].len(), 2);
    assert_eq!(writes[2], log.export_snapshot());
}

#[test]
fn sink_failure_does_not_roll_back_append() {
    let mut log = EventLog::with_sink(2, Box::new(BrokenSink)).expect("log");

    let outcome = log.append(1, "PART", Some("a"), &["#c"]);
    assert!(outcome.persist_error.is_some());
    let _ = log.append(2, "PART", Some("b"), &["#c"]);

    assert_eq!(log.size(), 2);
    assert_eq!(log.most_recent().map(|r| r.time), Some(2));
    assert_eq!(log.persist_failures(), 2);
}

#[test]
fn explicit_eviction_reports_sink_failure() {
    let mut log = EventLog::with_sink(3, Box::new(BrokenSink)).expect("log");
    let _ = log.append(1, "NICK", Some("a"), &["b"]);

    let outcome = log.evict_oldest().expect("evict");
    assert_eq!(outcome.evicted.time, 1);
    assert!(outcome.persist_error.is_some());
    assert!(log.is_empty());
    assert_eq!(log.persist_failures(), 2);
}

#[test]
fn explicit_eviction_drains_head_then_fails() {
    let mut log = EventLog::new(3).expect("log");
    let _ = log.append(1, "NICK", Some("a"), &["b"]);
    let _ = log.append(2, "NICK", Some("b"), &["c"]);

    assert_eq!(log.evict_oldest().expect("evict").evicted.time, 1);
    assert_eq!(log.evict_oldest().expect("evict").evicted.time, 2);
    assert!(log.evict_oldest().is_err());
    assert!(log.is_empty());
}
