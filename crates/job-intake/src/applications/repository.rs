use async_trait::async_trait;

use super::domain::{ApplicationRecord, StoredApplication};

/// Durable storage for validated applications.
///
/// Implementations write the whole record in one atomic step and stamp `submitted_at`
/// themselves; callers never supply it.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn persist(
        &self,
        record: &ApplicationRecord,
    ) -> Result<StoredApplication, PersistenceError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("application store unavailable: {0}")]
    Unavailable(String),
    #[error("application store rejected the insert: {0}")]
    Rejected(String),
}

impl PersistenceError {
    pub fn cause(&self) -> &str {
        match self {
            PersistenceError::Unavailable(cause) | PersistenceError::Rejected(cause) => cause,
        }
    }
}
