//! Attempt lifecycle: send a tracked simulation email, then record the click.
//!
//! [`PhishingService`] owns every state change of an [`Attempt`]. The store
//! only persists what it is handed, and the mailer only delivers.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::db::AttemptStore;
use crate::mail::{MailError, MailSender, OutgoingMail};
use crate::models::{Attempt, AttemptFilter};

pub const PHISHING_SUBJECT: &str = "Phishing email";

/// Path prefix of tracking links, relative to the public base URL.
pub const CLICK_PATH: &str = "/api/phishing/click/";

/// Settings injected into the service at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhishingConfig {
    /// Public base URL of this application, used verbatim for tracking links.
    pub app_url: String,
}

impl PhishingConfig {
    pub fn new(app_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PhishingError {
    #[error("recipient email must not be empty")]
    InvalidEmail,

    /// The attempt was still stored with status `failed`.
    #[error("Failed to send email: {0}")]
    SendFailed(#[source] MailError),

    #[error("Phishing attempt not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct PhishingService {
    mailer: Arc<dyn MailSender>,
    store: Arc<dyn AttemptStore>,
    config: PhishingConfig,
}

impl PhishingService {
    pub fn new(
        mailer: Arc<dyn MailSender>,
        store: Arc<dyn AttemptStore>,
        config: PhishingConfig,
    ) -> Self {
        Self {
            mailer,
            store,
            config,
        }
    }

    /// Send a simulation email to `email` and persist the attempt.
    ///
    /// The mailer is called exactly once and the attempt is written exactly
    /// once, after the send outcome is known. A failed send is stored as
    /// `failed` and then reported as [`PhishingError::SendFailed`].
    pub async fn send_phishing_email(&self, email: &str) -> Result<Attempt, PhishingError> {
        if email.trim().is_empty() {
            return Err(PhishingError::InvalidEmail);
        }

        let mut attempt = Attempt::new(self.store.new_attempt_id(), email);
        let mail = self.render_mail(&attempt);

        match self.mailer.send_mail(&mail).await {
            Ok(()) => {
                attempt.mark_sent();
                self.store.insert_attempt(&attempt)?;
                tracing::info!(attempt_id = %attempt.id, "Phishing email sent");
                Ok(attempt)
            }
            Err(e) => {
                attempt.mark_failed();
                self.store.insert_attempt(&attempt)?;
                tracing::warn!(attempt_id = %attempt.id, error = %e, "Phishing email send failed");
                Err(PhishingError::SendFailed(e))
            }
        }
    }

    /// Mark the attempt behind a tracking link as clicked.
    ///
    /// Clicking again, or clicking an attempt whose send failed, is allowed
    /// and re-applies the transition.
    pub fn record_click(&self, id: &str) -> Result<Attempt, PhishingError> {
        let id = Uuid::parse_str(id).map_err(|_| PhishingError::NotFound)?;
        let mut attempt = self
            .store
            .get_attempt(id)?
            .ok_or(PhishingError::NotFound)?;

        attempt.mark_clicked();
        if !self.store.update_attempt(&attempt)? {
            return Err(PhishingError::NotFound);
        }

        tracing::info!(attempt_id = %attempt.id, "Phishing link clicked");
        Ok(attempt)
    }

    pub fn get_attempt(&self, id: &str) -> Result<Attempt, PhishingError> {
        let id = Uuid::parse_str(id).map_err(|_| PhishingError::NotFound)?;
        self.store.get_attempt(id)?.ok_or(PhishingError::NotFound)
    }

    pub fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<Attempt>, PhishingError> {
        Ok(self.store.list_attempts(filter)?)
    }

    /// `<app_url>/api/phishing/click/<id>`
    pub fn tracking_link(&self, id: Uuid) -> String {
        format!(
            "{}{}{}",
            self.config.app_url.trim_end_matches('/'),
            CLICK_PATH,
            id
        )
    }

    fn render_mail(&self, attempt: &Attempt) -> OutgoingMail {
        let link = self.tracking_link(attempt.id);
        OutgoingMail {
            to: attempt.email.clone(),
            subject: PHISHING_SUBJECT.to_string(),
            html: format!(
                "<p>This is a phishing simulation test.</p>\n\
                 <p>Click <a href=\"{link}\">here</a> to test your phishing awareness.</p>\n"
            ),
        }
    }
}
