use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::StoredApplication;
use super::notifier::NotificationError;
use super::repository::PersistenceError;
use super::validation::{InvalidField, ValidationError};

/// Stages of a single submission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Validated,
    Persisted,
    Notified,
    Completed,
    ValidationFailed,
    PersistenceFailed,
    NotificationFailed,
}

impl PipelineState {
    /// States reachable in one step from `self`.
    pub const fn successors(self) -> &'static [PipelineState] {
        match self {
            PipelineState::Received => &[PipelineState::Validated, PipelineState::ValidationFailed],
            PipelineState::Validated => {
                &[PipelineState::Persisted, PipelineState::PersistenceFailed]
            }
            PipelineState::Persisted => {
                &[PipelineState::Notified, PipelineState::NotificationFailed]
            }
            PipelineState::Notified => &[PipelineState::Completed],
            PipelineState::Completed
            | PipelineState::ValidationFailed
            | PipelineState::PersistenceFailed
            | PipelineState::NotificationFailed => &[],
        }
    }

    pub fn can_transition_to(self, next: PipelineState) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    pub const fn label(self) -> &'static str {
        match self {
            PipelineState::Received => "received",
            PipelineState::Validated => "validated",
            PipelineState::Persisted => "persisted",
            PipelineState::Notified => "notified",
            PipelineState::Completed => "completed",
            PipelineState::ValidationFailed => "validation_failed",
            PipelineState::PersistenceFailed => "persistence_failed",
            PipelineState::NotificationFailed => "notification_failed",
        }
    }
}

/// Result of one run through the intake pipeline. Expected failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Stored and the applicant was emailed.
    Completed { stored: StoredApplication },
    /// The submission was incomplete; nothing was stored.
    Rejected(ValidationError),
    /// The store refused or could not be reached; nothing was stored and no email was sent.
    PersistenceFailed(PersistenceError),
    /// Stored, but the confirmation email could not be sent.
    StoredNotNotified {
        stored: StoredApplication,
        error: NotificationError,
    },
}

/// Caller-visible classification of a [`SubmissionOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Rejected,
    PersistenceError,
    Completed,
    StoredNotNotified,
}

impl OutcomeKind {
    pub const fn label(self) -> &'static str {
        match self {
            OutcomeKind::Rejected => "rejected",
            OutcomeKind::PersistenceError => "persistence_error",
            OutcomeKind::Completed => "completed",
            OutcomeKind::StoredNotNotified => "stored_not_notified",
        }
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            OutcomeKind::Rejected => StatusCode::BAD_REQUEST,
            OutcomeKind::PersistenceError => StatusCode::INTERNAL_SERVER_ERROR,
            OutcomeKind::Completed | OutcomeKind::StoredNotNotified => StatusCode::OK,
        }
    }

    /// Whether the application reached the store.
    pub fn is_stored(self) -> bool {
        matches!(self, OutcomeKind::Completed | OutcomeKind::StoredNotNotified)
    }

    fn message(self) -> &'static str {
        match self {
            OutcomeKind::Rejected => "Missing or invalid required fields",
            OutcomeKind::PersistenceError => "Your application could not be saved, please try again later",
            OutcomeKind::Completed => "Application accepted! Check your email for confirmation.",
            OutcomeKind::StoredNotNotified => {
                "Application saved, but the confirmation email could not be sent"
            }
        }
    }
}

impl SubmissionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            SubmissionOutcome::Completed { .. } => OutcomeKind::Completed,
            SubmissionOutcome::Rejected(_) => OutcomeKind::Rejected,
            SubmissionOutcome::PersistenceFailed(_) => OutcomeKind::PersistenceError,
            SubmissionOutcome::StoredNotNotified { .. } => OutcomeKind::StoredNotNotified,
        }
    }

    pub fn terminal_state(&self) -> PipelineState {
        match self {
            SubmissionOutcome::Completed { .. } => PipelineState::Completed,
            SubmissionOutcome::Rejected(_) => PipelineState::ValidationFailed,
            SubmissionOutcome::PersistenceFailed(_) => PipelineState::PersistenceFailed,
            SubmissionOutcome::StoredNotNotified { .. } => PipelineState::NotificationFailed,
        }
    }

    pub fn stored(&self) -> Option<&StoredApplication> {
        match self {
            SubmissionOutcome::Completed { stored }
            | SubmissionOutcome::StoredNotNotified { stored, .. } => Some(stored),
            SubmissionOutcome::Rejected(_) | SubmissionOutcome::PersistenceFailed(_) => None,
        }
    }

    /// Sanitized payload for callers. Infrastructure causes stay in the logs.
    pub fn view(&self) -> OutcomeView {
        let kind = self.kind();
        let (missing_fields, invalid_fields) = match self {
            SubmissionOutcome::Rejected(error) => (
                Some(error.missing_labels()),
                error.invalid_fields.clone(),
            ),
            _ => (None, Vec::new()),
        };
        let stored = self.stored();

        OutcomeView {
            outcome: kind,
            message: kind.message().to_string(),
            missing_fields,
            invalid_fields,
            application_id: stored.and_then(|stored| stored.id),
            submitted_at: stored.map(|stored| stored.submitted_at),
        }
    }
}

/// JSON body returned for every intake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeView {
    pub outcome: OutcomeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_fields: Vec<InvalidField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl OutcomeView {
    /// Rejection for requests whose body never became a submission.
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self {
            outcome: OutcomeKind::Rejected,
            message: message.into(),
            missing_fields: None,
            invalid_fields: Vec::new(),
            application_id: None,
            submitted_at: None,
        }
    }
}
