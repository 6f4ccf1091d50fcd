//! SQLite-backed snapshot sink.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::record::EventRecord;

use super::{PersistResult, SnapshotSink};

/// Mirrors the history into a `history` table, one row per record.
///
/// Each snapshot replaces every row inside a single transaction, so the table
/// always holds exactly one complete history.
pub struct SqliteSnapshotSink {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteSnapshotSink {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init_connection(conn, Some(path.as_ref().to_path_buf()))
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, None)
    }

    fn init_connection(conn: Connection, path: Option<PathBuf>) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn, path })
    }

    /// Reads the stored history back, oldest first.
    pub fn load_records(&self) -> PersistResult<Vec<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT time, type, origin, params FROM history ORDER BY pos ASC")?;

        let rows = stmt.query_map([], |row| {
            let time: i64 = row.get(0)?;
            let kind: String = row.get(1)?;
            let origin: String = row.get(2)?;
            let params: String = row.get(3)?;
            Ok((time, kind, origin, params))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (time, kind, origin, params) = row?;
            out.push(EventRecord {
                time,
                kind,
                origin,
                params: serde_json::from_str(&params)?,
            });
        }
        Ok(out)
    }
}

impl SnapshotSink for SqliteSnapshotSink {
    fn write_snapshot(&mut self, records: &[EventRecord]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM history", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO history(pos, time, type, origin, params) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (pos, rec) in records.iter().enumerate() {
                let params_json = serde_json::to_string(&rec.params)?;
                stmt.execute(params![
                    pos as i64,
                    rec.time,
                    rec.kind,
                    rec.origin,
                    params_json,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn destination(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => String::from(":memory:"),
        }
    }
}
