use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One simulated phishing email sent to one recipient.
///
/// An attempt is built in memory when a send is requested. Its id is allocated
/// up front because the tracking link embedded in the email carries it. The
/// record is first written once the send outcome is known, so the stored
/// status is always a decided one.
///
/// # Lifecycle
/// Created → Sent | Failed → Clicked. A click can be recorded more than once,
/// and a failed attempt can still be clicked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: Uuid,
    /// Recipient address. Never changes after creation.
    pub email: String,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attempt {
    /// Build a fresh in-memory attempt in the `Created` state.
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            status: AttemptStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_sent(&mut self) {
        self.transition(AttemptStatus::Sent);
    }

    pub fn mark_failed(&mut self) {
        self.transition(AttemptStatus::Failed);
    }

    pub fn mark_clicked(&mut self) {
        self.transition(AttemptStatus::Clicked);
    }

    fn transition(&mut self, next: AttemptStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal attempt transition {} -> {}",
            self.status.as_str(),
            next.as_str()
        );
        self.status = next;
        self.updated_at = Utc::now();
    }
}

/// The delivery and engagement state of an attempt.
///
/// - `Created`: In memory only, send outcome not yet known (never persisted)
/// - `Sent`: The mail sender accepted the message
/// - `Failed`: The mail sender rejected the message; kept for auditing
/// - `Clicked`: The tracking link was visited
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Created,
    Sent,
    Failed,
    Clicked,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Clicked => "clicked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            "clicked" => Some(Self::Clicked),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` keeps the status moving forward.
    pub fn can_transition_to(&self, next: AttemptStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Sent)
                | (Self::Created, Self::Failed)
                | (Self::Sent, Self::Clicked)
                | (Self::Failed, Self::Clicked)
                | (Self::Clicked, Self::Clicked)
        )
    }
}

/// Input for requesting a simulation email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPhishingInput {
    /// Recipient address. Must be non-empty; format checks happen elsewhere.
    pub email: String,
}

/// Filter for listing stored attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttemptFilter {
    #[serde(default)]
    pub status: Option<AttemptStatus>,
    #[serde(default)]
    pub email: Option<String>,
}
