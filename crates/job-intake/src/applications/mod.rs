//! Job application intake: validate the submission, store it, then confirm by email.
//!
//! Each stage only runs when the one before it succeeded. A failed confirmation email never
//! rolls back a stored application; callers learn about it through
//! [`SubmissionOutcome::StoredNotNotified`].

pub mod domain;
pub mod intake;
pub mod notifier;
pub mod outcome;
pub mod repository;
pub mod router;
pub mod service;
pub mod smtp;
pub mod sql;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{ApplicationRecord, Field, RawSubmission, ResumePayload, StoredApplication};
pub use intake::MAX_UPLOAD_BYTES;
pub use notifier::{
    ApplicantNotifier, ConfirmationMessage, NotificationError, CONFIRMATION_SUBJECT,
};
pub use outcome::{OutcomeKind, OutcomeView, PipelineState, SubmissionOutcome};
pub use repository::{ApplicationStore, PersistenceError};
pub use router::application_router;
pub use service::ApplicationIntakeService;
pub use smtp::SmtpNotifier;
pub use sql::SqlApplicationStore;
pub use validation::{validate, InvalidField, ValidationError};
