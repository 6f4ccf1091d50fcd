//! Snapshot sink writing one compact JSON array to a file.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::record::EventRecord;

use super::{PersistError, PersistResult, SnapshotSink};

/// Writes the history as `[{"time":..,"type":..,"origin":..,"params":[..]},..]`.
///
/// Each write goes to a temp file next to the destination and is renamed over
/// it, so readers never observe a truncated document.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    staging: Option<PathBuf>,
}

impl JsonFileSink {
    /// Creates a sink targeting `path`. Nothing is touched until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            staging: None,
        }
    }

    /// Stages temp files in `dir` instead of the destination's directory.
    ///
    /// `dir` must be on the same filesystem as the destination.
    pub fn with_staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses a snapshot previously written by this sink.
    pub fn read_snapshot(path: impl AsRef<Path>) -> PersistResult<Vec<EventRecord>> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn staging_dir(&self) -> &Path {
        if let Some(dir) = &self.staging {
            return dir;
        }
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl SnapshotSink for JsonFileSink {
    fn write_snapshot(&mut self, records: &[EventRecord]) -> PersistResult<()> {
        let payload = serde_json::to_vec(records)?;

        let mut tmp = NamedTempFile::new_in(self.staging_dir())?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_data()?;
        tmp.persist(&self.path)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(())
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}
