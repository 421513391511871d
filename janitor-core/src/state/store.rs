use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

use janitor_model::{
    LibraryTotals, MediaType, ReplacementRecord, ScanRecord, ScanStats,
};

use super::document::StateDocument;
use crate::error::StateError;

/// `mark_scanned` persists on every N-th call; other mutators persist
/// immediately.
pub const FLUSH_EVERY: u32 = 10;

/// Sole owner of scan records, replacement history and library totals.
///
/// Mutations apply to memory first and are then written to a JSON document.
/// A file that cannot be read yields an empty store, and a failed write is
/// logged while memory stays authoritative.
///
/// Writes are synchronous so they land in mutation order. Inside a
/// multi-threaded tokio runtime they run under `block_in_place`, which hands
/// the worker's other tasks to another thread for the duration.
pub struct StateStore {
    path: Option<PathBuf>,
    inner: Mutex<Inner>,
    // Serialises snapshot+write so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

struct Inner {
    doc: StateDocument,
    unflushed_marks: u32,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("StateStore");
        debug.field("path", &self.path);
        match self.inner.try_lock() {
            Some(inner) => {
                debug
                    .field("scanned", &inner.doc.scanned_files.len())
                    .field("replacements", &inner.doc.replacements.len())
                    .field("unflushed_marks", &inner.unflushed_marks);
            }
            None => {
                debug.field("state", &"<locked>");
            }
        }
        debug.finish()
    }
}

impl StateStore {
    /// Opens the store backed by `path`, starting empty when the file is
    /// missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = match load_document(&path) {
            Ok(Some(doc)) => {
                info!(
                    path = %path.display(),
                    scanned = doc.scanned_files.len(),
                    "loaded scan state"
                );
                doc
            }
            Ok(None) => {
                debug!(path = %path.display(), "no state file, starting fresh");
                StateDocument::default()
            }
            Err(err) => {
                warn!(error = %err, "failed to load scan state, starting fresh");
                StateDocument::default()
            }
        };
        Self::with_document(Some(path), doc)
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::with_document(None, StateDocument::default())
    }

    fn with_document(path: Option<PathBuf>, doc: StateDocument) -> Self {
        Self {
            path,
            inner: Mutex::new(Inner {
                doc,
                unflushed_marks: 0,
            }),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_scanned(&self, path: &str) -> bool {
        self.inner.lock().doc.scanned_files.contains_key(path)
    }

    pub fn scan_record(&self, path: &str) -> Option<ScanRecord> {
        self.inner.lock().doc.scanned_files.get(path).cloned()
    }

    /// Records a finished validation. Persisted every [`FLUSH_EVERY`] calls.
    pub fn mark_scanned(&self, path: &str, valid: bool, media_type: MediaType) {
        let flush = {
            let mut inner = self.inner.lock();
            inner.doc.scanned_files.insert(
                path.to_string(),
                ScanRecord {
                    timestamp: Utc::now(),
                    valid,
                    media_type,
                },
            );
            inner.unflushed_marks += 1;
            if inner.unflushed_marks >= FLUSH_EVERY {
                inner.unflushed_marks = 0;
                true
            } else {
                false
            }
        };
        if flush {
            self.persist();
        }
    }

    /// Appends to the replacement history and forgets the scan record so the
    /// incoming file is scanned fresh.
    pub fn mark_replaced(
        &self,
        path: &str,
        wrong_file: bool,
        title: &str,
        reason: &str,
        media_type: MediaType,
    ) {
        {
            let mut inner = self.inner.lock();
            inner.doc.scanned_files.remove(path);
            inner.doc.push_replacement(ReplacementRecord {
                path: path.to_string(),
                title: title.to_string(),
                reason: reason.to_string(),
                wrong_file,
                media_type,
                timestamp: Utc::now(),
            });
        }
        self.persist();
    }

    pub fn mark_scan_started(&self) {
        self.inner.lock().doc.scan_started = Some(Utc::now());
        self.persist();
    }

    pub fn mark_scan_completed(&self) {
        self.inner.lock().doc.scan_completed = Some(Utc::now());
        self.persist();
    }

    pub fn scan_completed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().doc.scan_completed
    }

    pub fn is_initial_scan_done(&self) -> bool {
        self.scan_completed_at().is_some()
    }

    /// Library sizes from the last successful refresh.
    pub fn set_library_totals(&self, movies: u64, tv: u64) {
        self.inner.lock().doc.library_totals = LibraryTotals { movies, tv };
        self.persist();
    }

    pub fn library_totals(&self) -> LibraryTotals {
        self.inner.lock().doc.library_totals
    }

    pub fn get_scanned_paths(&self) -> HashSet<String> {
        self.inner.lock().doc.scanned_files.keys().cloned().collect()
    }

    /// Aggregate counters for status and summaries.
    pub fn get_stats(&self) -> ScanStats {
        let inner = self.inner.lock();
        let doc = &inner.doc;
        let valid_files =
            doc.scanned_files.values().filter(|r| r.valid).count() as u64;
        let total_scanned = doc.scanned_files.len() as u64;
        let counts = doc.replaced_counts;

        ScanStats {
            total_scanned,
            valid_files,
            invalid_files: total_scanned - valid_files,
            total_replaced: counts.total(),
            movies_replaced: counts.movies,
            tv_replaced: counts.tv,
            movies_scanned: doc.scanned_of(MediaType::Movie) + counts.movies,
            tv_scanned: doc.scanned_of(MediaType::Tv) + counts.tv,
            movies_total: doc.library_totals.movies,
            tv_total: doc.library_totals.tv,
            scan_started: doc.scan_started,
            scan_completed: doc.scan_completed,
            initial_scan_done: doc.scan_completed.is_some(),
        }
    }

    /// Replacement history, most recent first.
    pub fn replacements(&self, limit: usize) -> Vec<ReplacementRecord> {
        self.inner
            .lock()
            .doc
            .replacements
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drops everything and persists the empty document.
    pub fn clear(&self) {
        {
            let mut inner = self.inner.lock();
            inner.doc = StateDocument::default();
            inner.unflushed_marks = 0;
        }
        info!("scan state cleared");
        self.persist();
    }

    /// Writes any deferred `mark_scanned` updates.
    pub fn flush(&self) {
        let pending = {
            let mut inner = self.inner.lock();
            std::mem::take(&mut inner.unflushed_marks)
        };
        if pending > 0 {
            self.persist();
        }
    }

    fn persist(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let _guard = self.write_lock.lock();
        let snapshot = {
            let inner = self.inner.lock();
            serde_json::to_vec_pretty(&inner.doc)
        };
        let bytes = match snapshot {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "failed to serialise scan state");
                return;
            }
        };
        if let Err(err) = blocking_io(|| write_atomically(path, &bytes)) {
            warn!(error = %err, "failed to save scan state");
        }
    }
}

fn blocking_io<R>(io: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(io)
        }
        _ => io(),
    }
}

fn load_document(path: &Path) -> Result<Option<StateDocument>, StateError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(None);
        }
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StateError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StateError> {
    let to_write_error = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(to_write_error)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(to_write_error)?;
    std::fs::rename(&tmp, path).map_err(to_write_error)
}
