use chrono::NaiveDate;

/// Why a delivery did not happen.
///
/// These are expected conditions, reported to the operator. None of them
/// changes the document's cursor or history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Book is not active.")]
    Inactive,
    #[error("Book already completed.")]
    AlreadyCompleted,
    /// Idempotency no-op: the document was already sent today.
    #[error("Already sent today.")]
    AlreadyProcessed,
    #[error("Failed to read book content.")]
    UnreadableSource(String),
    #[error("No content to send.")]
    EmptyContent,
    /// The cursor points past the chunks the source currently produces.
    #[error("Unable to select next chunk.")]
    SelectionUnavailable,
    #[error("Email send failed.")]
    SendFailure(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DeliveryError {
    /// Underlying cause, for the log rather than the operator message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            DeliveryError::UnreadableSource(detail)
            | DeliveryError::SendFailure(detail)
            | DeliveryError::InvalidConfiguration(detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

/// What a successful send delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub start_page: usize,
    pub end_page: usize,
    pub word_start: usize,
    pub word_end: usize,
    pub sent_date: NaiveDate,
    /// True if this installment finished the document.
    pub completed: bool,
    /// Number of send attempts it took, starting at 1.
    pub attempts: u32,
}

/// Result of running the scheduler once for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent(DeliveryReceipt),
    /// The cursor had already reached the end; the document was closed without sending.
    MarkedCompleted,
    NotSent(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DeliveryOutcome::NotSent(_))
    }

    /// True for the same-day no-op, which is neither a success nor a failure.
    pub fn is_skipped(&self) -> bool {
        matches!(self, DeliveryOutcome::NotSent(DeliveryError::AlreadyProcessed))
    }

    /// Operator-facing status line.
    pub fn message(&self) -> String {
        match self {
            DeliveryOutcome::Sent(receipt) => {
                format!("Sent pages {}-{}.", receipt.start_page, receipt.end_page)
            }
            DeliveryOutcome::MarkedCompleted => "Book already completed.".to_string(),
            DeliveryOutcome::NotSent(reason) => reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_operator_wording() {
        let receipt = DeliveryReceipt {
            start_page: 4,
            end_page: 5,
            word_start: 1201,
            word_end: 2003,
            sent_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            completed: false,
            attempts: 1,
        };
        assert_eq!(DeliveryOutcome::Sent(receipt).message(), "Sent pages 4-5.");
        assert_eq!(DeliveryOutcome::MarkedCompleted.message(), "Book already completed.");
        assert_eq!(
            DeliveryOutcome::NotSent(DeliveryError::AlreadyProcessed).message(),
            "Already sent today."
        );
        assert_eq!(
            DeliveryOutcome::NotSent(DeliveryError::SendFailure("timeout".into())).message(),
            "Email send failed."
        );
    }

    #[test]
    fn only_not_sent_is_a_failure() {
        assert!(DeliveryOutcome::MarkedCompleted.is_success());
        assert!(!DeliveryOutcome::NotSent(DeliveryError::EmptyContent).is_success());
    }

    #[test]
    fn only_already_processed_is_skipped() {
        assert!(DeliveryOutcome::NotSent(DeliveryError::AlreadyProcessed).is_skipped());
        assert!(!DeliveryOutcome::NotSent(DeliveryError::EmptyContent).is_skipped());
        assert!(!DeliveryOutcome::MarkedCompleted.is_skipped());
    }

    #[test]
    fn detail_is_kept_out_of_message() {
        let error = DeliveryError::UnreadableSource("No such file".into());
        assert_eq!(error.to_string(), "Failed to read book content.");
        assert_eq!(error.detail(), Some("No such file"));
        assert_eq!(DeliveryError::Inactive.detail(), None);
    }
}
