use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use super::loader::{FaqError, load_book, load_book_or_empty};
use super::FaqBook;

/// What the watcher remembers about the backing file between polls.
///
/// Length is kept next to the modification time so a rewrite within the
/// filesystem's timestamp granularity is still noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub len: u64,
}

/// Thread-safe handle to the current FAQ book.
///
/// Readers take a cheap `Arc` snapshot; reloads swap the whole book so a
/// request never sees a half-replaced table.
#[derive(Debug, Clone)]
pub struct FaqStore {
    path: PathBuf,
    current: Arc<RwLock<Arc<FaqBook>>>,
}

impl FaqStore {
    /// Load the book at `path`. A missing or malformed file yields an empty book.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let book = load_book_or_empty(&path);
        Self::with_book(path, book)
    }

    pub fn with_book(path: impl Into<PathBuf>, book: FaqBook) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(RwLock::new(Arc::new(book))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the book currently being served.
    pub fn current(&self) -> Arc<FaqBook> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace(&self, book: FaqBook) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(book);
    }

    /// Re-read the file. On failure the previous book stays in place.
    pub fn reload(&self) -> Result<usize, FaqError> {
        let book = load_book(&self.path)?;
        let rows = book.len();
        self.replace(book);
        Ok(rows)
    }

    /// Modification time and size of the backing file, if it can be read.
    pub fn stamp(&self) -> Option<FileStamp> {
        let metadata = std::fs::metadata(&self.path).ok()?;
        Some(FileStamp {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}
