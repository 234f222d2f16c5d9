//! services/courier/src/cli/handlers.rs
//!
//! Executes parsed commands against the shared state and renders their output.

use dailylit_core::delivery::BatchRunner;
use dailylit_core::domain::Book;
use dailylit_core::library::IngestRequest;
use std::fmt::Write as _;
use std::path::Path;
use tracing::{error, info, warn};

use super::views::{BookDetailView, BookView, HistoryView};
use super::Command;
use crate::adapters::source::{remove_upload, store_upload};
use crate::error::CourierError;
use crate::state::AppState;

/// What a command printed, and whether it achieved what was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

pub async fn execute(state: &AppState, command: Command) -> Result<CommandOutput, CourierError> {
    let library = &state.library;
    match command {
        Command::Run => {
            let report = BatchRunner::new(state.scheduler.clone()).run().await?;
            let mut text = String::new();
            for entry in &report.entries {
                let _ = writeln!(text, "{}: {}", entry.title, entry.message());
            }
            let _ = write!(
                text,
                "Processed {} book(s): {} succeeded, {} skipped, {} failed.",
                report.entries.len(),
                report.succeeded(),
                report.skipped(),
                report.failed()
            );
            Ok(CommandOutput {
                text,
                success: report.failed() == 0,
            })
        }

        Command::Send { id, force } => {
            let outcome = state.scheduler.deliver_by_id(id, force).await?;
            Ok(CommandOutput {
                text: outcome.message(),
                success: outcome.is_success(),
            })
        }

        Command::Add {
            path,
            title,
            author,
            pages_per_day,
        } => add(state, &path, title, author, pages_per_day).await,

        Command::List { json } => {
            let books = library.books().await?;
            if json {
                let views: Vec<BookView> = books.iter().map(BookView::from).collect();
                return Ok(CommandOutput::ok(serde_json::to_string_pretty(&views)?));
            }
            if books.is_empty() {
                return Ok(CommandOutput::ok("No books yet."));
            }
            let lines: Vec<String> = books.iter().map(summary_line).collect();
            Ok(CommandOutput::ok(lines.join("\n")))
        }

        Command::Show { id, json } => {
            let book = library.book(id).await?;
            let history = library.history(id).await?;
            if json {
                let view = BookDetailView {
                    book: BookView::from(&book),
                    history: history.iter().map(HistoryView::from).collect(),
                };
                return Ok(CommandOutput::ok(serde_json::to_string_pretty(&view)?));
            }

            let document = &book.document;
            let progress = &book.progress;
            let mut text = String::new();
            let _ = writeln!(text, "Title: {}", document.title);
            let author = document.author.as_deref().unwrap_or("Unknown");
            let _ = writeln!(text, "Author: {}", author);
            let _ = writeln!(text, "Status: {}", document.status);
            let _ = writeln!(
                text,
                "Source: {} ({})",
                document.source_locator, document.source_kind
            );
            let _ = writeln!(text, "Words: {}", document.total_words);
            let _ = writeln!(
                text,
                "Progress: Page {} of {} ({}%)",
                progress.current_page,
                document.total_pages,
                book.percent_complete()
            );
            let _ = writeln!(text, "Pages per day: {}", progress.pages_per_day);
            let _ = writeln!(text, "Last sent: {}", date_or(progress.last_sent_date, "never"));
            let _ = writeln!(text, "Completed: {}", date_or(progress.completed_date, "-"));
            if history.is_empty() {
                let _ = write!(text, "History: none");
            } else {
                let _ = write!(text, "History:");
                for entry in &history {
                    let _ = write!(
                        text,
                        "\n  {}  pages {}-{}  words {}-{}",
                        entry.sent_date,
                        entry.start_page,
                        entry.end_page,
                        entry.word_start,
                        entry.word_end
                    );
                }
            }
            Ok(CommandOutput::ok(text))
        }

        Command::Status { id, status } => {
            library.set_status(id, status).await?;
            Ok(CommandOutput::ok(format!("Status set to {}.", status)))
        }

        Command::Pages { id, pages } => {
            let stored = library.set_pages_per_day(id, pages).await?;
            Ok(CommandOutput::ok(format!("Pages per day set to {}.", stored)))
        }

        Command::Reset { id } => {
            library.reset(id).await?;
            Ok(CommandOutput::ok("Progress reset."))
        }

        Command::Delete { id, keep_file } => {
            let document = library.delete(id).await?;
            if !keep_file {
                if let Err(e) = remove_upload(Path::new(&document.source_locator)).await {
                    warn!(
                        error = %e,
                        path = %document.source_locator,
                        "Could not remove source file."
                    );
                }
            }
            Ok(CommandOutput::ok(format!("Deleted '{}'.", document.title)))
        }

        Command::Settings => {
            let settings = library.settings().await?;
            let lines: Vec<String> = settings
                .iter()
                .map(|(key, value)| format!("{} = {}", key, value))
                .collect();
            Ok(CommandOutput::ok(lines.join("\n")))
        }

        Command::SetDefaultPages { pages } => {
            let stored = library.set_default_pages_per_day(pages).await?;
            Ok(CommandOutput::ok(format!("Default pages per day set to {}.", stored)))
        }

        Command::SetRecipient { address } => {
            if !address.contains('@') {
                return Err(CourierError::Invalid(format!(
                    "'{}' is not an email address",
                    address
                )));
            }
            library.set_recipient(&address).await?;
            Ok(CommandOutput::ok(format!("Recipient set to {}.", address.trim())))
        }

        Command::TestEmail => match state.scheduler.send_test_message().await {
            Ok(recipient) => Ok(CommandOutput::ok(format!("Test email sent to {}.", recipient))),
            Err(e) => {
                error!(error = %e, "Test email failed.");
                Ok(CommandOutput::failed(format!("Test email failed: {}", e)))
            }
        },
    }
}

async fn add(
    state: &AppState,
    path: &Path,
    title: Option<String>,
    author: Option<String>,
    pages_per_day: Option<i64>,
) -> Result<CommandOutput, CourierError> {
    let stored = store_upload(&state.config.upload_dir, path).await?;
    info!(from = %path.display(), to = %stored.display(), "Stored upload.");

    let request = IngestRequest {
        source_locator: stored.to_string_lossy().into_owned(),
        title: title.or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        }),
        author,
        pages_per_day,
    };
    match state.library.ingest(request).await {
        Ok(book) => Ok(CommandOutput::ok(format!(
            "Added '{}' ({}): {} words, {} pages, {} per day.",
            book.document.title,
            book.id(),
            book.document.total_words,
            book.document.total_pages,
            book.progress.pages_per_day
        ))),
        Err(e) => {
            remove_upload(&stored).await?;
            Err(e.into())
        }
    }
}

fn summary_line(book: &Book) -> String {
    format!(
        "{}  {:<9}  {}/{} ({}%)  {}",
        book.id(),
        book.document.status,
        book.progress.current_page,
        book.document.total_pages,
        book.percent_complete(),
        book.document.title
    )
}

fn date_or(date: Option<chrono::NaiveDate>, fallback: &str) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
