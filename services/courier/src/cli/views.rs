//! Serializable views of the domain types, for `--json` output.

use chrono::{DateTime, NaiveDate, Utc};
use dailylit_core::domain::{Book, HistoryEntry};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub status: &'static str,
    pub source_kind: &'static str,
    pub source_locator: String,
    pub total_words: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub current_word_position: usize,
    pub pages_per_day: usize,
    pub percent_complete: u32,
    pub last_sent_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        let document = &book.document;
        let progress = &book.progress;
        Self {
            id: document.id,
            title: document.title.clone(),
            author: document.author.clone(),
            status: document.status.as_str(),
            source_kind: document.source_kind.as_str(),
            source_locator: document.source_locator.clone(),
            total_words: document.total_words,
            total_pages: document.total_pages,
            current_page: progress.current_page,
            current_word_position: progress.current_word_position,
            pages_per_day: progress.pages_per_day,
            percent_complete: book.percent_complete(),
            last_sent_date: progress.last_sent_date,
            completed_date: progress.completed_date,
            created_at: document.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub sent_date: NaiveDate,
    pub start_page: usize,
    pub end_page: usize,
    pub word_start: usize,
    pub word_end: usize,
}

impl From<&HistoryEntry> for HistoryView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            sent_date: entry.sent_date,
            start_page: entry.start_page,
            end_page: entry.end_page,
            word_start: entry.word_start,
            word_end: entry.word_end,
        }
    }
}

/// A book together with its delivery history.
#[derive(Debug, Serialize)]
pub struct BookDetailView {
    #[serde(flatten)]
    pub book: BookView,
    pub history: Vec<HistoryView>,
}
