//! crates/dailylit_core/src/library.rs
//!
//! Ingestion of new documents and the operator actions on existing ones.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::delivery::DeliveryError;
use crate::domain::{Book, Document, DocumentStatus, HistoryEntry, NewDocument, SourceKind};
use crate::ports::{
    Clock, DatabaseService, PortError, PortResult, SourceReader, DEFAULT_PAGES_PER_DAY_KEY,
    RECIPIENT_ADDRESS_KEY,
};
use crate::text::{count_words, ChunkPlanner};

/// Operator request to register a document.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Where the source file is stored; its extension selects the reader.
    pub source_locator: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages_per_day: Option<i64>,
}

/// Clamps an operator-supplied pages-per-day to at least one.
pub fn clamp_pages_per_day(requested: i64) -> usize {
    if requested < 1 {
        warn!(requested, "Pages per day must be positive; using 1.");
        1
    } else {
        requested as usize
    }
}

/// Parses a stored pages-per-day setting, clamping non-positive values.
pub fn parse_pages_per_day(raw: &str) -> Result<usize, DeliveryError> {
    raw.trim()
        .parse::<i64>()
        .map(clamp_pages_per_day)
        .map_err(|_| {
            DeliveryError::InvalidConfiguration(format!(
                "{} is not a number: '{}'",
                DEFAULT_PAGES_PER_DAY_KEY, raw
            ))
        })
}

pub struct Library {
    db: Arc<dyn DatabaseService>,
    reader: Arc<dyn SourceReader>,
    clock: Arc<dyn Clock>,
    planner: ChunkPlanner,
    default_pages_per_day: usize,
}

impl Library {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        reader: Arc<dyn SourceReader>,
        clock: Arc<dyn Clock>,
        planner: ChunkPlanner,
        default_pages_per_day: usize,
    ) -> Self {
        Self {
            db,
            reader,
            clock,
            planner,
            default_pages_per_day: default_pages_per_day.max(1),
        }
    }

    /// Reads, measures and registers a document with a fresh cursor.
    pub async fn ingest(&self, request: IngestRequest) -> PortResult<Book> {
        let path = Path::new(&request.source_locator);
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let source_kind = SourceKind::from_extension(extension).ok_or_else(|| {
            PortError::Unsupported(format!("Unsupported file type: '{}'", extension))
        })?;

        let text = self.reader.read_text(&request.source_locator, source_kind).await?;
        let total_words = count_words(&text);
        let total_pages = self.planner.page_count(total_words);

        let title = non_blank(request.title).unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| request.source_locator.clone())
        });
        let pages_per_day = match request.pages_per_day {
            Some(requested) => clamp_pages_per_day(requested),
            None => self.default_pages_per_day().await?,
        };

        let book = self
            .db
            .create_document(NewDocument {
                title,
                author: non_blank(request.author),
                source_locator: request.source_locator,
                source_kind,
                total_words,
                total_pages,
                pages_per_day,
            })
            .await?;
        info!(
            document_id = %book.id(),
            total_words,
            total_pages,
            pages_per_day,
            "Document ingested."
        );
        Ok(book)
    }

    pub async fn book(&self, document_id: Uuid) -> PortResult<Book> {
        self.db.get_book(document_id).await
    }

    pub async fn books(&self) -> PortResult<Vec<Book>> {
        self.db.list_books().await
    }

    pub async fn history(&self, document_id: Uuid) -> PortResult<Vec<HistoryEntry>> {
        self.db.get_history(document_id).await
    }

    pub async fn set_status(&self, document_id: Uuid, status: DocumentStatus) -> PortResult<()> {
        self.db
            .set_status(document_id, status, self.clock.today())
            .await?;
        info!(document_id = %document_id, status = %status, "Status updated.");
        Ok(())
    }

    /// Returns the value actually stored after clamping.
    pub async fn set_pages_per_day(&self, document_id: Uuid, requested: i64) -> PortResult<usize> {
        let pages_per_day = clamp_pages_per_day(requested);
        self.db.set_pages_per_day(document_id, pages_per_day).await?;
        Ok(pages_per_day)
    }

    pub async fn reset(&self, document_id: Uuid) -> PortResult<()> {
        self.db.reset_progress(document_id).await?;
        info!(document_id = %document_id, "Progress reset.");
        Ok(())
    }

    /// Deletes the document with its cursor and history. The source file is left to the caller.
    pub async fn delete(&self, document_id: Uuid) -> PortResult<Document> {
        let document = self.db.delete_document(document_id).await?;
        info!(document_id = %document_id, "Document deleted.");
        Ok(document)
    }

    pub async fn settings(&self) -> PortResult<BTreeMap<String, String>> {
        self.db.get_settings().await
    }

    /// Pages per day for new documents: the stored setting, else the configured default.
    pub async fn default_pages_per_day(&self) -> PortResult<usize> {
        let stored = self.db.get_setting(DEFAULT_PAGES_PER_DAY_KEY).await?;
        Ok(match stored.as_deref().map(parse_pages_per_day) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring stored default.");
                self.default_pages_per_day
            }
            None => self.default_pages_per_day,
        })
    }

    pub async fn set_default_pages_per_day(&self, requested: i64) -> PortResult<usize> {
        let value = clamp_pages_per_day(requested);
        self.db
            .set_setting(DEFAULT_PAGES_PER_DAY_KEY, &value.to_string())
            .await?;
        Ok(value)
    }

    pub async fn set_recipient(&self, address: &str) -> PortResult<()> {
        self.db.set_setting(RECIPIENT_ADDRESS_KEY, address.trim()).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
