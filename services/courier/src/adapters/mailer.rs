//! services/courier/src/adapters/mailer.rs
//!
//! This module contains the SMTP adapter, the concrete implementation of the
//! `MailService` port. Messages go out as multipart/alternative (plain + HTML)
//! over STARTTLS using `lettre`.

use async_trait::async_trait;
use dailylit_core::ports::{MailService, OutgoingMessage, PortError, PortResult};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub address: Option<String>,
    pub password: Option<String>,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Option<Mailbox>,
}

impl SmtpMailer {
    /// Builds the transport. Missing credentials are not an error here:
    /// every send fails instead, so commands that never mail still work.
    pub fn new(settings: &SmtpSettings) -> PortResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| PortError::Unavailable(e.to_string()))?
            .port(settings.port);

        let sender = match (&settings.address, &settings.password) {
            (Some(address), Some(password)) => {
                builder = builder.credentials(Credentials::new(address.clone(), password.clone()));
                Some(parse_mailbox(address)?)
            }
            _ => None,
        };

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

fn parse_mailbox(address: &str) -> PortResult<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| PortError::Unexpected(format!("Invalid address '{}': {}", address, e)))
}

#[async_trait]
impl MailService for SmtpMailer {
    async fn send(&self, message: &OutgoingMessage) -> PortResult<()> {
        let sender = self.sender.clone().ok_or_else(|| {
            PortError::Unavailable("EMAIL_ADDRESS and EMAIL_PASSWORD must both be set".to_string())
        })?;

        let email = Message::builder()
            .from(sender)
            .to(parse_mailbox(&message.recipient)?)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.plain_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        info!(recipient = %message.recipient, subject = %message.subject, "Email sent.");
        Ok(())
    }
}
