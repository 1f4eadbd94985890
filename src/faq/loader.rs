//! Reading FAQ tables from disk.
//!
//! The table is a YAML sequence (JSON works too, being valid YAML):
//!
//! ```yaml
//! - role: student
//!   keywords: exam, timetable
//!   answer: Exams start in May.
//! - role: common
//!   keywords: holiday
//!   answer: The school closes in July.
//! ```
//!
//! Missing or null cells load as empty strings and numeric or boolean cells
//! are stringified, so spreadsheet exports load without cleanup.

use std::path::Path;

use serde::Deserialize;

use super::{FaqBook, FaqEntry};

/// Errors that can occur while loading an FAQ table.
#[derive(Debug, thiserror::Error)]
pub enum FaqError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a sequence of FAQ rows.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A spreadsheet-style cell.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl Cell {
    fn into_text(cell: Option<Self>) -> String {
        match cell {
            Some(Cell::Text(text)) => text,
            Some(Cell::Integer(n)) => n.to_string(),
            Some(Cell::Float(n)) => n.to_string(),
            Some(Cell::Flag(b)) => b.to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    role: Option<Cell>,
    #[serde(default)]
    keywords: Option<Cell>,
    #[serde(default)]
    answer: Option<Cell>,
}

impl From<RawRow> for FaqEntry {
    fn from(row: RawRow) -> Self {
        FaqEntry::new(
            Cell::into_text(row.role),
            Cell::into_text(row.keywords),
            Cell::into_text(row.answer),
        )
    }
}

/// Parse FAQ rows from YAML or JSON text.
pub fn parse_entries(text: &str) -> Result<Vec<FaqEntry>, FaqError> {
    // An empty document is an empty table rather than an error.
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<RawRow> = serde_yaml::from_str(text)?;
    Ok(rows.into_iter().map(FaqEntry::from).collect())
}

/// Load the FAQ table at `path`.
pub fn load_book(path: &Path) -> Result<FaqBook, FaqError> {
    let text = std::fs::read_to_string(path)?;
    let entries = parse_entries(&text)?;
    Ok(FaqBook::new(entries).with_source(path))
}

/// Load the FAQ table, falling back to an empty book on failure so the
/// service can still start and answer with the fallback.
pub fn load_book_or_empty(path: &Path) -> FaqBook {
    match load_book(path) {
        Ok(book) => {
            tracing::info!(
                name: "faq.loaded",
                path = %path.display(),
                rows = book.len(),
                "FAQ table loaded"
            );
            book
        }
        Err(e) => {
            tracing::error!(
                name: "faq.load_failed",
                path = %path.display(),
                error = %e,
                "Failed to load FAQ table, starting with an empty one"
            );
            FaqBook::empty().with_source(path)
        }
    }
}
