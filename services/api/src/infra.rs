use async_trait::async_trait;
use chrono::Utc;
use job_intake::applications::{
    ApplicantNotifier, ApplicationRecord, ApplicationStore, ConfirmationMessage,
    NotificationError, PersistenceError, StoredApplication,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store used by `--dry-run`. Nothing survives a restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationStore {
    records: Arc<Mutex<Vec<ApplicationRecord>>>,
}

impl InMemoryApplicationStore {
    #[cfg(test)]
    pub(crate) fn records(&self) -> Vec<ApplicationRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn persist(
        &self,
        record: &ApplicationRecord,
    ) -> Result<StoredApplication, PersistenceError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("in-memory store poisoned".to_string()))?;
        guard.push(record.clone());
        Ok(StoredApplication {
            id: i64::try_from(guard.len()).ok(),
            submitted_at: Utc::now(),
        })
    }
}

/// Logs the confirmation instead of sending it. Used by `--dry-run`.
#[derive(Default, Clone, Copy)]
pub(crate) struct LoggingNotifier;

#[async_trait]
impl ApplicantNotifier for LoggingNotifier {
    async fn notify(&self, recipient: &str, first_name: &str) -> Result<(), NotificationError> {
        let message = ConfirmationMessage::compose(first_name);
        info!(
            %recipient,
            subject = message.subject,
            "dry run: confirmation email not sent"
        );
        Ok(())
    }
}
