use async_trait::async_trait;

pub const CONFIRMATION_SUBJECT: &str = "Received Job Application";

/// Outbound hook that tells an applicant their submission arrived.
#[async_trait]
pub trait ApplicantNotifier: Send + Sync {
    async fn notify(&self, recipient: &str, first_name: &str) -> Result<(), NotificationError>;
}

/// Fixed plain-text confirmation sent after a successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationMessage {
    pub subject: &'static str,
    pub body: String,
}

impl ConfirmationMessage {
    pub fn compose(first_name: &str) -> Self {
        Self {
            subject: CONFIRMATION_SUBJECT,
            body: format!(
                "Thank You {first_name} for applying!\n\n\
                 After reviewing your application, our team will get back to you soon."
            ),
        }
    }
}

/// Confirmation dispatch error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid mail address: {0}")]
    InvalidAddress(String),
    #[error("mail relay rejected the message: {0}")]
    Rejected(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

impl NotificationError {
    pub fn cause(&self) -> &str {
        match self {
            NotificationError::InvalidAddress(cause)
            | NotificationError::Rejected(cause)
            | NotificationError::Transport(cause) => cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_greets_the_applicant_by_first_name() {
        let message = ConfirmationMessage::compose("Ann");
        assert_eq!(message.subject, "Received Job Application");
        assert!(message.body.starts_with("Thank You Ann for applying!\n\n"));
        assert!(message.body.ends_with("our team will get back to you soon."));
    }
}
