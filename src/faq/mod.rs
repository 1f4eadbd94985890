//! FAQ answer book.
//!
//! The book is an ordered table of `(role, keywords, answer)` rows. A query is
//! answered by the first row whose role matches (or is [`COMMON_ROLE`]) and
//! one of whose comma-separated keywords occurs in the query text.
//!
//! # Structure
//!
//! - [`loader`]: reading a book from a YAML/JSON file
//! - [`store`]: shared, swappable handle to the current book
//! - [`watcher`]: polling reload when the file changes on disk

pub mod loader;
pub mod store;
pub mod watcher;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use loader::{FaqError, load_book};
pub use store::{FaqStore, FileStamp};

/// Rows with this role answer every caller regardless of their role.
pub const COMMON_ROLE: &str = "common";

/// Answer returned when no row matches.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I don't know that. Please contact the school office for more details.";

/// One row of the FAQ table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    /// Trimmed, lower-cased role this row answers for.
    pub role: String,
    /// Comma-separated keyword list, kept as written.
    pub keywords: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(
        role: impl AsRef<str>,
        keywords: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            role: role.as_ref().trim().to_lowercase(),
            keywords: keywords.into(),
            answer: answer.into(),
        }
    }

    fn serves(&self, role: &str) -> bool {
        self.role == role || self.role == COMMON_ROLE
    }

    /// Keywords with surrounding whitespace removed, blanks skipped.
    pub fn keyword_list(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    fn matches(&self, query: &str) -> bool {
        self.keyword_list()
            .any(|keyword| query.contains(&keyword.to_lowercase()))
    }
}

/// A normalised question: both parts trimmed and lower-cased, neither empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqQuery {
    role: String,
    text: String,
}

impl FaqQuery {
    /// Returns `None` when either the role or the message is blank.
    pub fn new(role: &str, message: &str) -> Option<Self> {
        let role = role.trim().to_lowercase();
        let text = message.trim().to_lowercase();
        if role.is_empty() || text.is_empty() {
            return None;
        }
        Some(Self { role, text })
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Loaded FAQ table plus where and when it came from.
#[derive(Debug, Clone)]
pub struct FaqBook {
    entries: Vec<FaqEntry>,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl FaqBook {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries,
            source: None,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// First row, in table order, that serves the role and matches the text.
    pub fn lookup(&self, query: &FaqQuery) -> Option<&FaqEntry> {
        self.entries
            .iter()
            .find(|entry| entry.serves(query.role()) && entry.matches(query.text()))
    }

    /// The matched answer, or [`FALLBACK_ANSWER`].
    pub fn answer(&self, query: &FaqQuery) -> &str {
        self.lookup(query)
            .map_or(FALLBACK_ANSWER, |entry| entry.answer.as_str())
    }
}

impl Default for FaqBook {
    fn default() -> Self {
        Self::empty()
    }
}
