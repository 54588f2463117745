use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::applications::domain::{ApplicationRecord, RawSubmission, StoredApplication};
use crate::applications::notifier::{ApplicantNotifier, NotificationError};
use crate::applications::repository::{ApplicationStore, PersistenceError};
use crate::applications::{application_router, ApplicationIntakeService};

pub(super) const RESUME: &[u8] = b"%PDF-1.7 resume body";

pub(super) fn submission() -> RawSubmission {
    RawSubmission::new()
        .with("first_name", "Ann")
        .with("last_name", "Lee")
        .with("email", "ann@example.com")
        .with("date_of_birth", "1990-01-01")
        .with("education_degree", "Bachelor's")
        .with_resume(RESUME.to_vec())
}

pub(super) fn build_service() -> (
    ApplicationIntakeService<MemoryStore, RecordingNotifier>,
    Arc<MemoryStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ApplicationIntakeService::new(store.clone(), notifier.clone());
    (service, store, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    rows: Arc<Mutex<Vec<ApplicationRecord>>>,
}

impl MemoryStore {
    pub(super) fn rows(&self) -> Vec<ApplicationRecord> {
        self.rows.lock().expect("store mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn persist(
        &self,
        record: &ApplicationRecord,
    ) -> Result<StoredApplication, PersistenceError> {
        let mut guard = self.rows.lock().expect("store mutex poisoned");
        guard.push(record.clone());
        Ok(StoredApplication {
            id: Some(guard.len() as i64),
            submitted_at: Utc
                .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
        })
    }
}

pub(super) struct UnavailableStore;

#[async_trait]
impl ApplicationStore for UnavailableStore {
    async fn persist(
        &self,
        _record: &ApplicationRecord,
    ) -> Result<StoredApplication, PersistenceError> {
        Err(PersistenceError::Unavailable(
            "connection refused".to_string(),
        ))
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    /// `(recipient, first_name)` pairs in send order.
    pub(super) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicantNotifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, first_name: &str) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push((recipient.to_string(), first_name.to_string()));
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl ApplicantNotifier for FailingNotifier {
    async fn notify(&self, _recipient: &str, _first_name: &str) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected(
            "535 authentication failed".to_string(),
        ))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn application_router_with_service(
    service: ApplicationIntakeService<MemoryStore, RecordingNotifier>,
) -> axum::Router {
    application_router(Arc::new(service))
}
