//! crates/dailylit_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases, mail
//! transports or file formats.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{
    Book, DeliveryCommit, Document, DocumentStatus, HistoryEntry, NewDocument, SourceKind,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, SMTP).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Conflicting update: {0}")]
    Conflict(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Setting key for the pages-per-day applied to newly ingested documents.
pub const DEFAULT_PAGES_PER_DAY_KEY: &str = "default_pages_per_day";
/// Setting key for the address installments are sent to.
pub const RECIPIENT_ADDRESS_KEY: &str = "recipient_address";

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Documents ---
    /// Inserts the document and its fresh cursor together.
    async fn create_document(&self, document: NewDocument) -> PortResult<Book>;

    async fn get_book(&self, document_id: Uuid) -> PortResult<Book>;

    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn list_active_books(&self) -> PortResult<Vec<Book>>;

    async fn delete_document(&self, document_id: Uuid) -> PortResult<Document>;

    // --- Operator actions ---
    /// Changes the status, keeping `completed_date` set iff the status is completed.
    async fn set_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        today: NaiveDate,
    ) -> PortResult<()>;

    async fn set_pages_per_day(&self, document_id: Uuid, pages_per_day: usize) -> PortResult<()>;

    /// Rewinds the cursor, clears both dates and the history, and reactivates the document.
    async fn reset_progress(&self, document_id: Uuid) -> PortResult<()>;

    // --- Delivery ---
    /// Applies a successful delivery atomically.
    ///
    /// Returns `PortError::Conflict` without changing anything if the cursor
    /// has moved away from `commit.expected_page`.
    async fn record_delivery(&self, commit: DeliveryCommit) -> PortResult<()>;

    /// Marks a document whose cursor already reached the end as completed.
    async fn mark_completed(&self, document_id: Uuid, today: NaiveDate) -> PortResult<()>;

    async fn get_history(&self, document_id: Uuid) -> PortResult<Vec<HistoryEntry>>;

    // --- Settings ---
    async fn get_setting(&self, key: &str) -> PortResult<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> PortResult<()>;

    async fn get_settings(&self) -> PortResult<BTreeMap<String, String>>;
}

/// A fully rendered message, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
    pub recipient: String,
}

#[async_trait]
pub trait MailService: Send + Sync {
    /// Sends one message. Each call either fully succeeds or fully fails.
    async fn send(&self, message: &OutgoingMessage) -> PortResult<()>;
}

#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Extracts the whole text of a stored document as a single string.
    async fn read_text(&self, locator: &str, kind: SourceKind) -> PortResult<String>;
}

#[async_trait]
pub trait Backoff: Send + Sync {
    /// Waits before retry number `attempt` (1-based count of failures so far).
    async fn pause(&self, attempt: u32);
}

/// Source of the current calendar date for the daily cycle.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// A backoff that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

#[async_trait]
impl Backoff for NoBackoff {
    async fn pause(&self, _attempt: u32) {}
}

/// A clock frozen on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
