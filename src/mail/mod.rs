//! Outbound mail delivery.
//!
//! [`MailSender`] is the capability the lifecycle manager depends on. Two
//! backends are provided:
//!
//! - [`SmtpMailer`]: delivers through an SMTP relay using lettre
//! - [`ConsoleMailer`]: logs the message and reports success, for local runs
//!   without an SMTP relay

mod smtp;

pub use smtp::{MailerConfig, SmtpMailer, TlsMode};

use async_trait::async_trait;
use thiserror::Error;

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),
}

/// Delivers a single message. Implementations own their timeout policy.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl MailSender for ConsoleMailer {
    async fn send_mail(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Console mailer: message not delivered\n{}",
            mail.html
        );
        Ok(())
    }
}
