use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use parking_lot::RwLock;
use thiserror::Error;

use super::entry::LogEntry;
use crate::constants::HISTORY_COLUMNS;

#[derive(Debug, Error)]
pub enum LogWriteError {
    #[error("failed to encode log entries: {0}")]
    Encode(#[from] csv::Error),

    #[error("failed to write prediction log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LogReadError {
    #[error("failed to open prediction log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed prediction log: {0}")]
    Parse(#[from] csv::Error),

    #[error("unexpected prediction log header: {0}")]
    Header(String),
}

/// Append-only CSV log of every prediction.
///
/// Appends take the write lock, reads take the read lock, so a reader never
/// observes half of a batch.
pub struct PredictionLog {
    path: PathBuf,
    lock: RwLock<()>,
}

/// Serialise a batch, optionally preceded by the header row.
fn encode(entries: &[LogEntry], with_header: bool) -> Result<Vec<u8>, LogWriteError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(entries.len() * 160));

    if with_header {
        writer.write_record(HISTORY_COLUMNS)?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }

    writer
        .into_inner()
        .map_err(|e| LogWriteError::Encode(csv::Error::from(e.into_error())))
}

impl PredictionLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Append a batch of entries, all or nothing.
    ///
    /// The header is written only when the file is absent or empty. On any
    /// write failure the file is truncated back to its previous length.
    pub fn append(&self, entries: &[LogEntry]) -> Result<(), LogWriteError> {
        if entries.is_empty() {
            return Ok(());
        }

        let _guard = self.lock.write();

        let existing_len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(source) => return Err(self.io_error(source)),
        };

        let buffer = encode(entries, existing_len == 0)?;
        self.commit(&buffer, existing_len)
            .map_err(|source| self.io_error(source))?;

        log::debug!(
            "Appended {} entr{} to {}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            self.path.display()
        );
        Ok(())
    }

    fn commit(&self, buffer: &[u8], existing_len: u64) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if let Err(e) = file.write_all(buffer).and_then(|_| file.sync_data()) {
            if let Err(rollback) = file.set_len(existing_len) {
                log::error!(
                    "Failed to roll back partial append to {}: {}",
                    self.path.display(),
                    rollback
                );
            }
            return Err(e);
        }

        Ok(())
    }

    fn io_error(&self, source: io::Error) -> LogWriteError {
        LogWriteError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Every entry ever appended, oldest first.
    ///
    /// `None` when no prediction has been logged yet.
    pub fn read_all(&self) -> Result<Option<Vec<LogEntry>>, LogReadError> {
        let _guard = self.lock.read();

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LogReadError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let empty = file
            .metadata()
            .map(|meta| meta.len() == 0)
            .map_err(|source| LogReadError::Io {
                path: self.path.clone(),
                source,
            })?;
        if empty {
            return Ok(Some(Vec::new()));
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers()?;
        if !headers.iter().eq(HISTORY_COLUMNS.iter().copied()) {
            return Err(LogReadError::Header(headers.iter().collect::<Vec<_>>().join(",")));
        }

        let entries = reader
            .deserialize()
            .collect::<Result<Vec<LogEntry>, csv::Error>>()?;
        Ok(Some(entries))
    }

    /// Number of logged predictions (0 when the log does not exist).
    pub fn count(&self) -> Result<usize, LogReadError> {
        Ok(self.read_all()?.map_or(0, |entries| entries.len()))
    }
}
