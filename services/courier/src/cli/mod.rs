//! services/courier/src/cli/mod.rs
//!
//! Command line surface of the `courier` binary.

use clap::{Parser, Subcommand};
use dailylit_core::domain::DocumentStatus;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

pub mod handlers;
mod views;

pub use handlers::{execute, CommandOutput};

/// Delivers long texts by email, a few pages a day.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send today's installment of every active book
    Run,

    /// Send the next installment of one book now
    Send {
        id: Uuid,
        /// Send even if this book was already sent today
        #[arg(long)]
        force: bool,
    },

    /// Register a .txt or .pdf file for delivery
    Add {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        pages_per_day: Option<i64>,
    },

    /// List all books with their progress
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one book and its delivery history
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },

    /// Pause, resume or complete a book
    Status {
        id: Uuid,
        #[arg(value_parser = DocumentStatus::from_str)]
        status: DocumentStatus,
    },

    /// Change how many pages a book sends per day
    Pages {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        pages: i64,
    },

    /// Start a book over from the first page
    Reset { id: Uuid },

    /// Remove a book, its progress and its history
    Delete {
        id: Uuid,
        /// Leave the stored source file in place
        #[arg(long)]
        keep_file: bool,
    },

    /// Print the stored settings
    Settings,

    /// Set the pages per day used for newly added books
    SetDefaultPages {
        #[arg(allow_negative_numbers = true)]
        pages: i64,
    },

    /// Set the address installments are sent to
    SetRecipient { address: String },

    /// Send a test message to check the mail settings
    TestEmail,
}
