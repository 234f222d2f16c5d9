//! services/courier/src/error.rs
//!
//! Defines the primary error type for the courier service.

use crate::config::ConfigError;
use dailylit_core::ports::PortError;

/// The primary error type for the `courier` service.
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure applying the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., copying an upload).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a failure encoding command output.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// An operator request that cannot be carried out as given.
    #[error("{0}")]
    Invalid(String),
}
