//! services/courier/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use dailylit_core::delivery::DeliveryConfig;
use dailylit_core::library::clamp_pages_per_day;
use dailylit_core::message::DEFAULT_SUBJECT_PREFIX;
use dailylit_core::text::DEFAULT_WORDS_PER_PAGE;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::adapters::mailer::SmtpSettings;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    /// Optional plain-text log file, appended to alongside stdout.
    pub log_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub words_per_page: usize,
    pub default_pages_per_day: usize,
    pub subject_prefix: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub email_address: Option<String>,
    pub email_password: Option<String>,
    pub send_retry_delay: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        // --- Storage and Logging ---
        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://data/books.db".to_string());

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;
        let log_path = var("LOG_PATH").map(PathBuf::from);
        let upload_dir = var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/uploads"));

        // --- Delivery Settings ---
        let words_per_page: usize =
            parse_or(var("WORDS_PER_PAGE"), "WORDS_PER_PAGE", DEFAULT_WORDS_PER_PAGE)?;
        if words_per_page == 0 {
            return Err(ConfigError::InvalidValue(
                "WORDS_PER_PAGE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let default_pages_per_day = clamp_pages_per_day(parse_or(
            var("DEFAULT_PAGES_PER_DAY"),
            "DEFAULT_PAGES_PER_DAY",
            1,
        )?);
        let subject_prefix =
            var("SUBJECT_PREFIX").unwrap_or_else(|| DEFAULT_SUBJECT_PREFIX.to_string());

        // --- Mail Transport ---
        let smtp_server = var("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string());
        let smtp_port = parse_or(var("SMTP_PORT"), "SMTP_PORT", 587)?;
        let email_address = var("EMAIL_ADDRESS").or_else(|| var("GMAIL_ADDRESS"));
        let email_password = var("EMAIL_PASSWORD").or_else(|| var("GMAIL_APP_PASSWORD"));
        let send_retry_delay = Duration::from_secs(parse_or(
            var("SEND_RETRY_DELAY_SECS"),
            "SEND_RETRY_DELAY_SECS",
            300,
        )?);

        Ok(Self {
            database_url,
            log_level,
            log_path,
            upload_dir,
            words_per_page,
            default_pages_per_day,
            subject_prefix,
            smtp_server,
            smtp_port,
            email_address,
            email_password,
            send_retry_delay,
        })
    }

    pub fn delivery(&self) -> DeliveryConfig {
        DeliveryConfig {
            words_per_page: self.words_per_page,
            subject_prefix: self.subject_prefix.clone(),
            default_recipient: self.email_address.clone().unwrap_or_default(),
        }
    }

    pub fn smtp(&self) -> SmtpSettings {
        SmtpSettings {
            server: self.smtp_server.clone(),
            port: self.smtp_port,
            address: self.email_address.clone(),
            password: self.email_password.clone(),
        }
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        None => Ok(default),
    }
}
