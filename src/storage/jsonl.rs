//! Append-only JSON-lines audit log.
//!
//! Each inserted entry becomes one line holding a serialized [`LogEntry`].
//! Writes are flushed per entry; there is no fsync and no rotation.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SinkError;
use crate::model::{LogCreateModel, LogEntry};
use crate::storage::traits::LogSink;

/// File-backed log sink writing one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesLogSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesLogSink {
    /// Open (or create) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// The file this sink appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry back from disk.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Io` on read failure or `SinkError::Serialization`
    /// for a malformed line.
    pub fn read_all(&self) -> Result<Vec<LogEntry>, SinkError> {
        let file = File::open(&self.path)?;
        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            out.push(serde_json::from_str(&line)?);
        }
        Ok(out)
    }
}

impl LogSink for JsonLinesLogSink {
    fn insert(&self, log: LogCreateModel) -> Result<(), SinkError> {
        let entry = LogEntry::from_model(log);
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Backend("poisoned lock: jsonl.insert".to_string()))?;
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}
