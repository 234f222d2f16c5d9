pub mod delivery;
pub mod domain;
pub mod library;
pub mod message;
pub mod ports;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use delivery::{
    BatchReport, BatchRunner, DeliveryConfig, DeliveryError, DeliveryOutcome, DeliveryPorts,
    DeliveryScheduler,
};
pub use domain::{Book, Chunk, Document, DocumentStatus, HistoryEntry, ProgressCursor, SourceKind};
pub use library::{IngestRequest, Library};
pub use ports::{Backoff, Clock, DatabaseService, MailService, PortError, PortResult, SourceReader};
