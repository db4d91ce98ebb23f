//! Registry storage: full read and atomic full rewrite of the row table.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use bids_model::{SessionLabel, SubjectId};
use csv::{ReaderBuilder, WriterBuilder};
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::RegistryError;

/// Column headers of the participants table, in file order.
pub const REGISTRY_COLUMNS: [&str; 3] = ["participant_id", "session_id", "mr_id"];

/// One registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRow {
    pub subject: SubjectId,
    pub session: SessionLabel,
    pub source_scan_id: String,
}

impl RegistryRow {
    pub fn new(subject: SubjectId, session: SessionLabel, source_scan_id: impl Into<String>) -> Self {
        Self {
            subject,
            session,
            source_scan_id: source_scan_id.into(),
        }
    }
}

/// Tabular store behind the registry.
///
/// Implementations only need whole-table reads and whole-table rewrites;
/// `replace` must leave the previous table intact when it fails.
pub trait RegistryStore {
    /// Held for the duration of a read-modify-write cycle.
    type Guard;

    fn lock(&self) -> Result<Self::Guard, RegistryError>;
    fn load(&self) -> Result<Vec<RegistryRow>, RegistryError>;
    fn replace(&self, rows: &[RegistryRow]) -> Result<(), RegistryError>;
    /// Human-readable location used in error messages.
    fn location(&self) -> String;
}

/// `participants.tsv` on disk.
#[derive(Debug, Clone)]
pub struct TsvRegistryStore {
    path: PathBuf,
}

impl TsvRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Writes a header-only table when none exists yet.
    ///
    /// Returns `true` when the file was created.
    pub fn initialize(&self) -> Result<bool, RegistryError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.replace(&[])?;
        Ok(true)
    }

    fn read_error(&self, err: csv::Error) -> RegistryError {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => RegistryError::Read {
                location: self.location(),
                source,
            },
            _ => RegistryError::corrupt(self.location(), message),
        }
    }

    fn write_error(&self, source: io::Error) -> RegistryError {
        RegistryError::Write {
            location: self.location(),
            source,
        }
    }

    fn parse_row(&self, line: usize, record: &csv::StringRecord) -> Result<RegistryRow, RegistryError> {
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let participant = field(0);
        let subject = participant
            .strip_prefix("sub-")
            .and_then(|id| SubjectId::new(id).ok())
            .ok_or_else(|| {
                RegistryError::corrupt(
                    self.location(),
                    format!("line {line}: invalid participant_id '{participant}'"),
                )
            })?;
        let session = field(1).parse::<SessionLabel>().map_err(|err| {
            RegistryError::corrupt(self.location(), format!("line {line}: {err}"))
        })?;
        let scan = field(2);
        if scan.is_empty() {
            return Err(RegistryError::corrupt(
                self.location(),
                format!("line {line}: empty mr_id"),
            ));
        }
        Ok(RegistryRow::new(subject, session, scan))
    }
}

impl RegistryStore for TsvRegistryStore {
    type Guard = FileLockGuard;

    fn lock(&self) -> Result<FileLockGuard, RegistryError> {
        let lock_path = self.lock_path();
        let lock_error = |source| RegistryError::Lock {
            location: lock_path.display().to_string(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(lock_error)?;
        file.lock_exclusive().map_err(lock_error)?;
        debug!(path = %lock_path.display(), "registry lock acquired");
        Ok(FileLockGuard { file })
    }

    fn load(&self) -> Result<Vec<RegistryRow>, RegistryError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Read {
                    location: self.location(),
                    source,
                });
            }
        };
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.read_error(e))?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();
        if headers != REGISTRY_COLUMNS {
            return Err(RegistryError::corrupt(
                self.location(),
                format!(
                    "expected columns {} but found {}",
                    REGISTRY_COLUMNS.join(", "),
                    headers.join(", ")
                ),
            ));
        }

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| self.read_error(e))?;
            // header is line 1
            rows.push(self.parse_row(idx + 2, &record)?);
        }
        Ok(rows)
    }

    fn replace(&self, rows: &[RegistryRow]) -> Result<(), RegistryError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        {
            let mut writer = WriterBuilder::new()
                .delimiter(b'\t')
                .from_writer(temp.as_file_mut());
            let csv_error = |err: csv::Error| self.write_error(io::Error::other(err.to_string()));
            writer.write_record(REGISTRY_COLUMNS).map_err(csv_error)?;
            for row in rows {
                writer
                    .write_record([
                        row.subject.label(),
                        row.session.to_string(),
                        row.source_scan_id.clone(),
                    ])
                    .map_err(csv_error)?;
            }
            writer.flush().map_err(|e| self.write_error(e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;
        debug!(path = %self.path.display(), rows = rows.len(), "registry rewritten");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Exclusive advisory lock on the registry's `.lock` sibling, released on drop.
#[derive(Debug)]
pub struct FileLockGuard {
    file: File,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRegistryStore {
    rows: Mutex<Vec<RegistryRow>>,
    fail_writes: AtomicBool,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<RegistryRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `replace` fail with a write error.
    pub fn fail_writes(&self, enable: bool) {
        self.fail_writes.store(enable, Ordering::Release);
    }

    pub fn rows(&self) -> Vec<RegistryRow> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl RegistryStore for MemoryRegistryStore {
    type Guard = ();

    fn lock(&self) -> Result<(), RegistryError> {
        Ok(())
    }

    fn load(&self) -> Result<Vec<RegistryRow>, RegistryError> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .map_err(|_| RegistryError::corrupt(self.location(), "store mutex poisoned"))
    }

    fn replace(&self, rows: &[RegistryRow]) -> Result<(), RegistryError> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(RegistryError::Write {
                location: self.location(),
                source: io::Error::other("writes disabled"),
            });
        }
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| RegistryError::corrupt(self.location(), "store mutex poisoned"))?;
        *guard = rows.to_vec();
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
