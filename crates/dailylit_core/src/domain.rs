//! crates/dailylit_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Active,
    Paused,
    Completed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Active => "active",
            DocumentStatus::Paused => "paused",
            DocumentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(DocumentStatus::Active),
            "paused" => Ok(DocumentStatus::Paused),
            "completed" => Ok(DocumentStatus::Completed),
            other => Err(format!("Invalid status: '{}'", other)),
        }
    }
}

/// The on-disk format a document was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    PlainText,
    Pdf,
}

impl SourceKind {
    /// The short tag stored alongside the document (`txt` / `pdf`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::PlainText => "txt",
            SourceKind::Pdf => "pdf",
        }
    }

    /// Maps a file extension to a source kind, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" => Some(SourceKind::PlainText),
            "pdf" => Some(SourceKind::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::from_extension(s).ok_or_else(|| format!("Unsupported file type: {}", s))
    }
}

/// Represents a long text ("book") being delivered in daily installments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub source_locator: String,
    pub source_kind: SourceKind,
    pub total_words: usize,
    pub total_pages: usize,
    pub created_at: DateTime<Utc>,
    pub status: DocumentStatus,
}

/// Per-document reading progress. One per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressCursor {
    /// Number of pages already delivered.
    pub current_page: usize,
    /// Absolute word offset reached by the last delivery.
    pub current_word_position: usize,
    pub pages_per_day: usize,
    pub last_sent_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
}

impl ProgressCursor {
    /// A fresh cursor pointing at the start of the document.
    pub fn new(pages_per_day: usize) -> Self {
        Self {
            current_page: 0,
            current_word_position: 0,
            pages_per_day: pages_per_day.max(1),
            last_sent_date: None,
            completed_date: None,
        }
    }
}

/// A document together with its cursor, as handed out by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub document: Document,
    pub progress: ProgressCursor,
}

impl Book {
    pub fn id(&self) -> Uuid {
        self.document.id
    }

    /// Rounded percentage of pages delivered so far.
    pub fn percent_complete(&self) -> u32 {
        percent_of(self.progress.current_page, self.document.total_pages)
    }
}

/// Append-only audit record of one successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub sent_date: NaiveDate,
    pub start_page: usize,
    pub end_page: usize,
    pub word_start: usize,
    pub word_end: usize,
    pub created_at: DateTime<Utc>,
}

/// One delivery unit: a sentence-aligned slice of a document.
///
/// Chunks are never persisted; they are re-derived from the source text and
/// the words-per-page setting every time they are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-indexed position in the document.
    pub page: usize,
    pub text: String,
    /// First word of the chunk, 1-indexed and inclusive.
    pub word_start: usize,
    /// Last word of the chunk, inclusive.
    pub word_end: usize,
}

/// Data needed to register a freshly ingested document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub author: Option<String>,
    pub source_locator: String,
    pub source_kind: SourceKind,
    pub total_words: usize,
    pub total_pages: usize,
    pub pages_per_day: usize,
}

/// The state change applied after a successful send.
///
/// The store applies the cursor update, the optional status change and the
/// history append as one unit, and only if the cursor is still at
/// `expected_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryCommit {
    pub document_id: Uuid,
    pub expected_page: usize,
    pub new_page: usize,
    pub word_position: usize,
    pub sent_date: NaiveDate,
    pub completed: bool,
    pub history: HistoryEntry,
}

/// `round(part / whole * 100)` with ties rounded to even.
pub fn percent_of(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round_ties_even() as u32
}
