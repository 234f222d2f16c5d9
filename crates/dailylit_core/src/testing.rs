//! In-memory implementations of the ports, shared by the unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::delivery::{DeliveryConfig, DeliveryPorts, DeliveryScheduler};
use crate::domain::{
    Book, DeliveryCommit, Document, DocumentStatus, HistoryEntry, NewDocument, ProgressCursor,
    SourceKind,
};
use crate::ports::{
    Backoff, DatabaseService, FixedClock, MailService, OutgoingMessage, PortError, PortResult,
    SourceReader,
};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct MemoryState {
    books: Vec<Book>,
    history: Vec<HistoryEntry>,
    settings: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
    /// Makes every store call fail for these documents.
    broken: Mutex<Vec<Uuid>>,
}

impl MemoryDatabase {
    pub fn insert(&self, book: Book) {
        self.state.lock().unwrap().books.push(book);
    }

    pub fn book(&self, id: Uuid) -> Book {
        self.state
            .lock()
            .unwrap()
            .books
            .iter()
            .find(|b| b.id() == id)
            .cloned()
            .unwrap()
    }

    pub fn history_of(&self, id: Uuid) -> Vec<HistoryEntry> {
        self.state
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|h| h.document_id == id)
            .cloned()
            .collect()
    }

    pub fn break_document(&self, id: Uuid) {
        self.broken.lock().unwrap().push(id);
    }

    fn check(&self, id: Uuid) -> PortResult<()> {
        if self.broken.lock().unwrap().contains(&id) {
            Err(PortError::Unavailable("disk on fire".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_book<T>(&self, id: Uuid, f: impl FnOnce(&mut Book) -> T) -> PortResult<T> {
        self.check(id)?;
        let mut state = self.state.lock().unwrap();
        let book = state
            .books
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", id)))?;
        Ok(f(book))
    }
}

#[async_trait]
impl DatabaseService for MemoryDatabase {
    async fn create_document(&self, document: NewDocument) -> PortResult<Book> {
        let book = Book {
            document: Document {
                id: Uuid::new_v4(),
                title: document.title,
                author: document.author,
                source_locator: document.source_locator,
                source_kind: document.source_kind,
                total_words: document.total_words,
                total_pages: document.total_pages,
                created_at: Utc::now(),
                status: DocumentStatus::Active,
            },
            progress: ProgressCursor::new(document.pages_per_day),
        };
        self.insert(book.clone());
        Ok(book)
    }

    async fn get_book(&self, document_id: Uuid) -> PortResult<Book> {
        self.with_book(document_id, |book| book.clone())
    }

    async fn list_books(&self) -> PortResult<Vec<Book>> {
        Ok(self.state.lock().unwrap().books.clone())
    }

    async fn list_active_books(&self) -> PortResult<Vec<Book>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .books
            .iter()
            .filter(|b| b.document.status == DocumentStatus::Active)
            .cloned()
            .collect())
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<Document> {
        let document = self.with_book(document_id, |book| book.document.clone())?;
        let mut state = self.state.lock().unwrap();
        state.books.retain(|b| b.id() != document_id);
        state.history.retain(|h| h.document_id != document_id);
        Ok(document)
    }

    async fn set_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        today: NaiveDate,
    ) -> PortResult<()> {
        self.with_book(document_id, |book| {
            book.document.status = status;
            book.progress.completed_date = match status {
                DocumentStatus::Completed => book.progress.completed_date.or(Some(today)),
                _ => None,
            };
        })
    }

    async fn set_pages_per_day(&self, document_id: Uuid, pages_per_day: usize) -> PortResult<()> {
        self.with_book(document_id, |book| book.progress.pages_per_day = pages_per_day)
    }

    async fn reset_progress(&self, document_id: Uuid) -> PortResult<()> {
        self.with_book(document_id, |book| {
            book.document.status = DocumentStatus::Active;
            book.progress = ProgressCursor::new(book.progress.pages_per_day);
        })?;
        self.state
            .lock()
            .unwrap()
            .history
            .retain(|h| h.document_id != document_id);
        Ok(())
    }

    async fn record_delivery(&self, commit: DeliveryCommit) -> PortResult<()> {
        self.with_book(commit.document_id, |book| {
            if book.progress.current_page != commit.expected_page {
                return Err(PortError::Conflict(format!(
                    "Document {} moved past page {}",
                    commit.document_id, commit.expected_page
                )));
            }
            book.progress.current_page = commit.new_page;
            book.progress.current_word_position = commit.word_position;
            book.progress.last_sent_date = Some(commit.sent_date);
            if commit.completed {
                book.progress.completed_date = Some(commit.sent_date);
                book.document.status = DocumentStatus::Completed;
            }
            Ok(())
        })??;
        self.state.lock().unwrap().history.push(commit.history);
        Ok(())
    }

    async fn mark_completed(&self, document_id: Uuid, today: NaiveDate) -> PortResult<()> {
        self.with_book(document_id, |book| {
            book.document.status = DocumentStatus::Completed;
            book.progress.completed_date = Some(today);
        })
    }

    async fn get_history(&self, document_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        self.check(document_id)?;
        Ok(self.history_of(document_id))
    }

    async fn get_setting(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.state.lock().unwrap().settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> PortResult<()> {
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_settings(&self) -> PortResult<BTreeMap<String, String>> {
        Ok(self.state.lock().unwrap().settings.clone())
    }
}

/// Fails the first `failures` sends, then succeeds. Records every attempt.
#[derive(Default)]
pub struct ScriptedMailer {
    failures: AtomicU32,
    attempts: AtomicU32,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl ScriptedMailer {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailService for ScriptedMailer {
    async fn send(&self, message: &OutgoingMessage) -> PortResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(PortError::Unavailable("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Serves texts from memory, keyed by locator. Unknown locators fail.
#[derive(Default)]
pub struct MemoryReader {
    texts: Mutex<HashMap<String, String>>,
}

impl MemoryReader {
    pub fn with(locator: &str, text: &str) -> Self {
        let reader = Self::default();
        reader.put(locator, text);
        reader
    }

    pub fn put(&self, locator: &str, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(locator.to_string(), text.to_string());
    }
}

#[async_trait]
impl SourceReader for MemoryReader {
    async fn read_text(&self, locator: &str, _kind: SourceKind) -> PortResult<String> {
        self.texts
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No such file: {}", locator)))
    }
}

/// Counts pauses instead of sleeping.
#[derive(Default)]
pub struct CountingBackoff {
    pauses: AtomicU32,
}

impl CountingBackoff {
    pub fn pauses(&self) -> u32 {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backoff for CountingBackoff {
    async fn pause(&self, _attempt: u32) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn book(locator: &str, total_pages: usize, pages_per_day: usize) -> Book {
    Book {
        document: Document {
            id: Uuid::new_v4(),
            title: "Sample".to_string(),
            author: Some("Author".to_string()),
            source_locator: locator.to_string(),
            source_kind: SourceKind::PlainText,
            total_words: total_pages * 4,
            total_pages,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            status: DocumentStatus::Active,
        },
        progress: ProgressCursor::new(pages_per_day),
    }
}

/// A scheduler wired to in-memory ports, with handles to inspect them.
pub struct Harness {
    pub db: Arc<MemoryDatabase>,
    pub reader: Arc<MemoryReader>,
    pub mailer: Arc<ScriptedMailer>,
    pub backoff: Arc<CountingBackoff>,
    pub scheduler: Arc<DeliveryScheduler>,
}

impl Harness {
    pub fn new(today: NaiveDate, words_per_page: usize, mailer: ScriptedMailer) -> Self {
        let db = Arc::new(MemoryDatabase::default());
        let reader = Arc::new(MemoryReader::default());
        let mailer = Arc::new(mailer);
        let backoff = Arc::new(CountingBackoff::default());
        let scheduler = Arc::new(DeliveryScheduler::new(
            DeliveryPorts {
                db: db.clone(),
                reader: reader.clone(),
                mailer: mailer.clone(),
                backoff: backoff.clone(),
                clock: Arc::new(FixedClock(today)),
            },
            DeliveryConfig {
                words_per_page,
                default_recipient: "reader@example.com".to_string(),
                ..DeliveryConfig::default()
            },
        ));
        Self {
            db,
            reader,
            mailer,
            backoff,
            scheduler,
        }
    }

    /// Another scheduler over the same ports whose clock reads `today`.
    pub fn scheduler_on(&self, today: NaiveDate) -> DeliveryScheduler {
        DeliveryScheduler::new(
            DeliveryPorts {
                db: self.db.clone(),
                reader: self.reader.clone(),
                mailer: self.mailer.clone(),
                backoff: self.backoff.clone(),
                clock: Arc::new(FixedClock(today)),
            },
            DeliveryConfig {
                words_per_page: self.scheduler.planner().words_per_page(),
                default_recipient: "reader@example.com".to_string(),
                ..DeliveryConfig::default()
            },
        )
    }
}
