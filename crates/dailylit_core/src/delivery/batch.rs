use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::delivery::outcome::{DeliveryError, DeliveryOutcome};
use crate::delivery::scheduler::DeliveryScheduler;
use crate::ports::{PortError, PortResult};

/// Result of one document within a batch run.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub document_id: Uuid,
    pub title: String,
    /// `Err` holds a storage fault hit while processing this document only.
    pub result: Result<DeliveryOutcome, PortError>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_success())
    }

    pub fn is_skipped(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_skipped())
    }

    pub fn message(&self) -> String {
        match &self.result {
            Ok(outcome) => outcome.message(),
            Err(e) => e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_success()).count()
    }

    /// Documents already sent today.
    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded() - self.skipped()
    }
}

/// Runs the scheduler once over every active document, one after another.
pub struct BatchRunner {
    scheduler: Arc<DeliveryScheduler>,
}

impl BatchRunner {
    pub fn new(scheduler: Arc<DeliveryScheduler>) -> Self {
        Self { scheduler }
    }

    /// Processes all active documents. A failure on one document is logged and
    /// recorded in the report; the run carries on with the next one. Only a
    /// failure to list the active documents is returned as an error.
    pub async fn run(&self) -> PortResult<BatchReport> {
        let books = self.scheduler.db().list_active_books().await?;
        info!(count = books.len(), "Starting delivery run.");

        let mut report = BatchReport::default();
        for book in books {
            let result = self.scheduler.deliver(&book, false).await;
            match &result {
                Ok(DeliveryOutcome::NotSent(reason))
                    if *reason != DeliveryError::AlreadyProcessed =>
                {
                    warn!(
                        document_id = %book.id(),
                        detail = reason.detail().unwrap_or_default(),
                        "{}",
                        reason
                    )
                }
                Ok(outcome) => info!(document_id = %book.id(), "{}", outcome.message()),
                Err(e) => error!(document_id = %book.id(), error = %e, "Delivery aborted."),
            }
            report.entries.push(BatchEntry {
                document_id: book.id(),
                title: book.document.title.clone(),
                result,
            });
        }

        info!(
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Delivery run finished."
        );
        Ok(report)
    }
}
