//! services/courier/src/state.rs
//!
//! Defines the application's shared state and how it is wired up at startup.

use crate::adapters::{
    clock::{SystemClock, TokioBackoff},
    db::DbAdapter,
    mailer::SmtpMailer,
    source::FileSourceReader,
};
use crate::config::Config;
use crate::error::CourierError;
use dailylit_core::delivery::{DeliveryPorts, DeliveryScheduler};
use dailylit_core::library::Library;
use dailylit_core::ports::{DEFAULT_PAGES_PER_DAY_KEY, RECIPIENT_ADDRESS_KEY};
use dailylit_core::text::ChunkPlanner;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Commands)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub library: Arc<Library>,
    pub scheduler: Arc<DeliveryScheduler>,
}

impl AppState {
    /// Wires the core components over the given ports.
    pub fn new(config: Arc<Config>, ports: DeliveryPorts) -> Self {
        let library = Arc::new(Library::new(
            ports.db.clone(),
            ports.reader.clone(),
            ports.clock.clone(),
            ChunkPlanner::new(config.words_per_page),
            config.default_pages_per_day,
        ));
        let scheduler = Arc::new(DeliveryScheduler::new(ports, config.delivery()));
        Self {
            config,
            library,
            scheduler,
        }
    }

    /// Opens the database, applies migrations, seeds settings and builds the
    /// production adapters.
    pub async fn connect(config: Arc<Config>) -> Result<Self, CourierError> {
        info!("Connecting to database...");
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if let Some(parent) = Path::new(options.clone().get_filename().as_ref()).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Arc::new(DbAdapter::new(pool));
        info!("Running database migrations...");
        db.run_migrations().await?;
        info!("Database migrations complete.");

        let mut defaults = vec![(
            DEFAULT_PAGES_PER_DAY_KEY,
            config.default_pages_per_day.to_string(),
        )];
        if let Some(address) = &config.email_address {
            defaults.push((RECIPIENT_ADDRESS_KEY, address.clone()));
        }
        db.seed_settings(&defaults).await?;

        let ports = DeliveryPorts {
            db,
            reader: Arc::new(FileSourceReader::new()),
            mailer: Arc::new(SmtpMailer::new(&config.smtp())?),
            backoff: Arc::new(TokioBackoff::new(config.send_retry_delay)),
            clock: Arc::new(SystemClock),
        };
        Ok(Self::new(config, ports))
    }
}
