//! crates/dailylit_core/src/message.rs
//!
//! Renders the subject and bodies of a daily installment.
//!
//! The layout is kept byte-for-byte stable: readers filter on the subject
//! line and existing mailboxes contain years of these messages.

/// Prefix placed in brackets at the start of every subject line.
pub const DEFAULT_SUBJECT_PREFIX: &str = "DailyLit";

/// Everything needed to render one installment.
#[derive(Debug, Clone, Copy)]
pub struct Installment<'a> {
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub end_page: usize,
    pub total_pages: usize,
    pub percent: u32,
    pub content: &'a str,
}

impl Installment<'_> {
    /// The page the next installment starts on, capped at the last page.
    pub fn next_page(&self) -> usize {
        if self.end_page < self.total_pages {
            self.end_page + 1
        } else {
            self.end_page
        }
    }
}

/// Subject and bodies of a message, without a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

pub fn compose(prefix: &str, installment: &Installment<'_>) -> RenderedMessage {
    let author = installment.author.unwrap_or("Unknown");
    let subject = format!(
        "[{}] {} - Day {} of ~{}",
        prefix, installment.title, installment.end_page, installment.total_pages
    );

    let plain_body = format!(
        "Book: {title}\n\
         Author: {author}\n\
         Progress: Page {end} of {total} ({percent}%)\n\n\
         {content}\n\n\
         Tomorrow: Page {next}\n",
        title = installment.title,
        author = author,
        end = installment.end_page,
        total = installment.total_pages,
        percent = installment.percent,
        content = installment.content,
        next = installment.next_page(),
    );

    let html_body = format!(
        "<html>\n      <body>\n        \
         <p><strong>Book:</strong> {title}<br/>\n        \
         <strong>Author:</strong> {author}<br/>\n        \
         <strong>Progress:</strong> Page {end} of {total} ({percent}%)</p>\n        \
         <hr/>\n        \
         <p>{content}</p>\n        \
         <hr/>\n        \
         <p>Tomorrow: Page {next}</p>\n      \
         </body>\n    </html>",
        title = installment.title,
        author = author,
        end = installment.end_page,
        total = installment.total_pages,
        percent = installment.percent,
        content = installment.content.replace('\n', "<br/>"),
        next = installment.next_page(),
    );

    RenderedMessage {
        subject,
        plain_body,
        html_body,
    }
}

/// A short message used to check the mail transport configuration.
pub fn compose_test_message(prefix: &str) -> RenderedMessage {
    let body = "This is a test email from DailyLit Redux.";
    RenderedMessage {
        subject: format!("[{}] Test Email", prefix),
        plain_body: body.to_string(),
        html_body: format!("<p>{}</p>", body),
    }
}
