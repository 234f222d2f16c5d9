//! Delivery: the per-document state machine and the daily batch over it.

pub mod batch;
pub mod outcome;
pub mod scheduler;

pub use batch::{BatchEntry, BatchReport, BatchRunner};
pub use outcome::{DeliveryError, DeliveryOutcome, DeliveryReceipt};
pub use scheduler::{DeliveryConfig, DeliveryPorts, DeliveryScheduler, MAX_SEND_ATTEMPTS};
