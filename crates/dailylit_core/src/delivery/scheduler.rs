//! crates/dailylit_core/src/delivery/scheduler.rs
//!
//! The per-document delivery state machine.
//!
//! One call to [`DeliveryScheduler::deliver`] moves a document through at most
//! one installment: it checks eligibility, re-derives the pages from the source
//! text, sends the next slice with bounded retry and commits the new cursor
//! together with a history entry.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::delivery::outcome::{DeliveryError, DeliveryOutcome, DeliveryReceipt};
use crate::domain::{percent_of, Book, DeliveryCommit, DocumentStatus, HistoryEntry};
use crate::message::{compose, compose_test_message, Installment, DEFAULT_SUBJECT_PREFIX};
use crate::ports::{
    Backoff, Clock, DatabaseService, MailService, OutgoingMessage, PortError, PortResult,
    SourceReader, RECIPIENT_ADDRESS_KEY,
};
use crate::text::{ChunkPlanner, DEFAULT_WORDS_PER_PAGE};

/// Send attempts per installment before giving up until the next cycle.
pub const MAX_SEND_ATTEMPTS: u32 = 3;

/// Settings the scheduler is constructed with.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub words_per_page: usize,
    pub subject_prefix: String,
    /// Used when no `recipient_address` setting is stored.
    pub default_recipient: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            words_per_page: DEFAULT_WORDS_PER_PAGE,
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            default_recipient: String::new(),
        }
    }
}

/// The external capabilities the scheduler drives.
#[derive(Clone)]
pub struct DeliveryPorts {
    pub db: Arc<dyn DatabaseService>,
    pub reader: Arc<dyn SourceReader>,
    pub mailer: Arc<dyn MailService>,
    pub backoff: Arc<dyn Backoff>,
    pub clock: Arc<dyn Clock>,
}

pub struct DeliveryScheduler {
    ports: DeliveryPorts,
    planner: ChunkPlanner,
    config: DeliveryConfig,
}

impl DeliveryScheduler {
    pub fn new(ports: DeliveryPorts, config: DeliveryConfig) -> Self {
        Self {
            ports,
            planner: ChunkPlanner::new(config.words_per_page),
            config,
        }
    }

    pub fn db(&self) -> &Arc<dyn DatabaseService> {
        &self.ports.db
    }

    pub fn planner(&self) -> ChunkPlanner {
        self.planner
    }

    /// Loads a document and runs one delivery cycle for it.
    pub async fn deliver_by_id(
        &self,
        document_id: Uuid,
        force: bool,
    ) -> PortResult<DeliveryOutcome> {
        let book = self.ports.db.get_book(document_id).await?;
        self.deliver(&book, force).await
    }

    /// Runs one delivery cycle for `book`.
    ///
    /// `force` skips the once-per-day check but never reopens a completed
    /// document. Only storage faults are returned as `Err`; every expected
    /// condition comes back as a [`DeliveryOutcome`] and leaves the stored
    /// state untouched.
    #[instrument(skip_all, fields(document_id = %book.id(), force = force))]
    pub async fn deliver(&self, book: &Book, force: bool) -> PortResult<DeliveryOutcome> {
        let document = &book.document;
        let progress = &book.progress;
        let today = self.ports.clock.today();

        match document.status {
            DocumentStatus::Paused => return Ok(DeliveryOutcome::NotSent(DeliveryError::Inactive)),
            DocumentStatus::Completed => {
                return Ok(DeliveryOutcome::NotSent(DeliveryError::AlreadyCompleted))
            }
            DocumentStatus::Active => {}
        }

        if !force && progress.last_sent_date == Some(today) {
            return Ok(DeliveryOutcome::NotSent(DeliveryError::AlreadyProcessed));
        }

        if progress.current_page >= document.total_pages {
            self.ports.db.mark_completed(document.id, today).await?;
            info!("Marked completed (already finished).");
            return Ok(DeliveryOutcome::MarkedCompleted);
        }

        let text = match self
            .ports
            .reader
            .read_text(&document.source_locator, document.source_kind)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to load source text.");
                return Ok(DeliveryOutcome::NotSent(DeliveryError::UnreadableSource(e.to_string())));
            }
        };

        let chunks = self.planner.plan(&text);
        if chunks.is_empty() {
            warn!("Source has no content.");
            return Ok(DeliveryOutcome::NotSent(DeliveryError::EmptyContent));
        }

        let start_page = progress.current_page + 1;
        let end_page =
            (progress.current_page + progress.pages_per_day.max(1)).min(document.total_pages);
        let window = progress.current_page.min(chunks.len())..end_page.min(chunks.len());
        let selection = &chunks[window];
        let (first, last) = match (selection.first(), selection.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                warn!(
                    current_page = progress.current_page,
                    chunk_count = chunks.len(),
                    "No chunk selection."
                );
                return Ok(DeliveryOutcome::NotSent(DeliveryError::SelectionUnavailable));
            }
        };
        let (word_start, word_end) = (first.word_start, last.word_end);

        let content = selection
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let rendered = compose(
            &self.config.subject_prefix,
            &Installment {
                title: &document.title,
                author: document.author.as_deref(),
                end_page,
                total_pages: document.total_pages,
                percent: percent_of(end_page, document.total_pages),
                content: &content,
            },
        );
        let message = OutgoingMessage {
            subject: rendered.subject,
            plain_body: rendered.plain_body,
            html_body: rendered.html_body,
            recipient: self.recipient().await?,
        };

        let attempts = match self.send_with_retry(&message).await {
            Ok(attempts) => attempts,
            Err(e) => {
                error!(error = %e, "Email send failed.");
                return Ok(DeliveryOutcome::NotSent(DeliveryError::SendFailure(e.to_string())));
            }
        };

        let completed = end_page >= document.total_pages;
        self.ports
            .db
            .record_delivery(DeliveryCommit {
                document_id: document.id,
                expected_page: progress.current_page,
                new_page: end_page,
                word_position: word_end,
                sent_date: today,
                completed,
                history: HistoryEntry {
                    id: Uuid::new_v4(),
                    document_id: document.id,
                    sent_date: today,
                    start_page,
                    end_page,
                    word_start,
                    word_end,
                    created_at: chrono::Utc::now(),
                },
            })
            .await?;

        info!(start_page, end_page, word_start, word_end, completed, "Sent pages.");
        Ok(DeliveryOutcome::Sent(DeliveryReceipt {
            start_page,
            end_page,
            word_start,
            word_end,
            sent_date: today,
            completed,
            attempts,
        }))
    }

    /// Sends a fixed message to the configured recipient, without retry.
    pub async fn send_test_message(&self) -> PortResult<String> {
        let rendered = compose_test_message(&self.config.subject_prefix);
        let recipient = self.recipient().await?;
        self.ports
            .mailer
            .send(&OutgoingMessage {
                subject: rendered.subject,
                plain_body: rendered.plain_body,
                html_body: rendered.html_body,
                recipient: recipient.clone(),
            })
            .await?;
        Ok(recipient)
    }

    async fn recipient(&self) -> PortResult<String> {
        let stored = self.ports.db.get_setting(RECIPIENT_ADDRESS_KEY).await?;
        Ok(stored
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.config.default_recipient.clone()))
    }

    /// Returns the attempt number that succeeded, or the last error.
    async fn send_with_retry(&self, message: &OutgoingMessage) -> PortResult<u32> {
        let mut last_error = None;
        for attempt in 1..=MAX_SEND_ATTEMPTS {
            match self.ports.mailer.send(message).await {
                Ok(()) => return Ok(attempt),
                Err(e) => {
                    warn!(attempt, error = %e, "Send attempt failed.");
                    last_error = Some(e);
                    if attempt < MAX_SEND_ATTEMPTS {
                        self.ports.backoff.pause(attempt).await;
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| PortError::Unexpected("no send attempt was made".to_string())))
    }
}
