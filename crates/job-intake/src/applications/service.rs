use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::domain::RawSubmission;
use super::notifier::ApplicantNotifier;
use super::outcome::{PipelineState, SubmissionOutcome};
use super::repository::ApplicationStore;
use super::validation::validate;

/// Service composing the validator, the application store, and the applicant notifier.
pub struct ApplicationIntakeService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> ApplicationIntakeService<S, N>
where
    S: ApplicationStore + 'static,
    N: ApplicantNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Run one submission through validate → persist → notify.
    ///
    /// The notifier is only reached after the store confirmed the insert, and a notification
    /// failure never undoes or hides the stored record.
    pub async fn submit(&self, submission: RawSubmission) -> SubmissionOutcome {
        let mut run = PipelineRun::start();

        let record = match validate(&submission) {
            Ok(record) => {
                run.advance(PipelineState::Validated);
                record
            }
            Err(err) => {
                run.advance(PipelineState::ValidationFailed);
                info!(
                    missing = ?err.missing_labels(),
                    invalid = err.invalid_fields.len(),
                    "application rejected"
                );
                return SubmissionOutcome::Rejected(err);
            }
        };

        let stored = match self.store.persist(&record).await {
            Ok(stored) => {
                run.advance(PipelineState::Persisted);
                stored
            }
            Err(err) => {
                run.advance(PipelineState::PersistenceFailed);
                error!(error = %err, "application could not be stored");
                return SubmissionOutcome::PersistenceFailed(err);
            }
        };
        info!(
            application_id = ?stored.id,
            submitted_at = %stored.submitted_at,
            "application stored"
        );

        match self
            .notifier
            .notify(&record.email, &record.first_name)
            .await
        {
            Ok(()) => {
                run.advance(PipelineState::Notified);
                run.advance(PipelineState::Completed);
                SubmissionOutcome::Completed { stored }
            }
            Err(err) => {
                run.advance(PipelineState::NotificationFailed);
                warn!(
                    application_id = ?stored.id,
                    error = %err,
                    "application stored but confirmation email failed"
                );
                SubmissionOutcome::StoredNotNotified { stored, error: err }
            }
        }
    }
}

/// Tracks the current stage of one run and only moves along legal edges.
struct PipelineRun {
    state: PipelineState,
}

impl PipelineRun {
    fn start() -> Self {
        Self {
            state: PipelineState::Received,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal pipeline transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = self.state.label(), to = next.label(), "pipeline transition");
        self.state = next;
    }
}
