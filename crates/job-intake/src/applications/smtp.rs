use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::notifier::{ApplicantNotifier, ConfirmationMessage, NotificationError};
use crate::config::{MailConfig, SmtpTls};

/// Sends confirmations over SMTP, with implicit TLS (SMTPS) unless configured otherwise.
///
/// A transport is built per message and dropped afterwards, so every confirmation opens and
/// closes its own session.
pub struct SmtpNotifier {
    server: String,
    port: u16,
    credentials: Option<Credentials>,
    sender: String,
    tls: SmtpTls,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Self {
        let credentials = config.username.as_ref().map(|username| {
            let password = config
                .password
                .as_ref()
                .map(|secret| secret.expose().to_string())
                .unwrap_or_default();
            Credentials::new(username.clone(), password)
        });

        Self {
            server: config.server.clone(),
            port: config.port,
            credentials,
            sender: config.sender.clone(),
            tls: config.tls,
        }
    }

    fn build_message(
        &self,
        recipient: &str,
        first_name: &str,
    ) -> Result<Message, NotificationError> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|err| NotificationError::InvalidAddress(format!("sender: {err}")))?;
        let to: Mailbox = recipient
            .trim()
            .parse()
            .map_err(|err| NotificationError::InvalidAddress(format!("recipient: {err}")))?;

        let confirmation = ConfirmationMessage::compose(first_name);
        Message::builder()
            .from(from)
            .to(to)
            .subject(confirmation.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation.body)
            .map_err(|err| NotificationError::InvalidAddress(err.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let builder = match self.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.server)
                .map_err(|err| NotificationError::Transport(err.to_string()))?,
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)
                    .map_err(|err| NotificationError::Transport(err.to_string()))?
            }
            SmtpTls::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.server),
        }
        .port(self.port);

        let builder = match &self.credentials {
            Some(credentials) => builder.credentials(credentials.clone()),
            None => builder,
        };
        Ok(builder.build())
    }
}

#[async_trait]
impl ApplicantNotifier for SmtpNotifier {
    async fn notify(&self, recipient: &str, first_name: &str) -> Result<(), NotificationError> {
        let message = self.build_message(recipient, first_name)?;
        let transport = self.transport()?;

        let response = transport.send(message).await.map_err(|err| {
            if err.is_permanent() {
                NotificationError::Rejected(err.to_string())
            } else {
                NotificationError::Transport(err.to_string())
            }
        })?;

        debug!(
            server = %self.server,
            code = %response.code(),
            "confirmation accepted by relay"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn config() -> MailConfig {
        MailConfig {
            server: "smtp.example.com".to_string(),
            port: 465,
            username: Some("hr@example.com".to_string()),
            password: Some(Secret::new("app-password")),
            sender: "Careers <hr@example.com>".to_string(),
            tls: SmtpTls::Implicit,
        }
    }

    /// Minimal plaintext relay that greets, advertises AUTH and refuses every login.
    async fn refusing_relay() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind relay");
        let port = listener.local_addr().expect("relay addr").port();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("client connects");
            let (reader, mut writer) = socket.into_split();
            let mut lines = BufReader::new(reader).lines();

            writer.write_all(b"220 relay.test ESMTP\r\n").await.ok();
            while let Ok(Some(line)) = lines.next_line().await {
                let command = line.to_ascii_uppercase();
                let reply: &[u8] = if command.starts_with("EHLO") {
                    b"250-relay.test\r\n250 AUTH PLAIN LOGIN\r\n"
                } else if command.starts_with("AUTH") {
                    b"535 5.7.8 Username and Password not accepted\r\n"
                } else if command.starts_with("QUIT") {
                    writer.write_all(b"221 bye\r\n").await.ok();
                    break;
                } else {
                    b"502 5.5.1 unrecognized command\r\n"
                };
                if writer.write_all(reply).await.is_err() {
                    break;
                }
            }
        });

        port
    }

    #[test]
    fn builds_plain_text_confirmation_for_the_applicant() {
        let notifier = SmtpNotifier::new(&config());
        let message = notifier
            .build_message("ann@example.com", "Ann")
            .expect("message builds");

        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
        assert!(raw.contains("Subject: Received Job Application"));
        assert!(raw.contains("To: ann@example.com"));
        assert!(raw.contains("From: Careers <hr@example.com>"));
        assert!(raw.contains("Thank You Ann for applying!"));
    }

    #[test]
    fn malformed_recipient_is_an_address_error() {
        let notifier = SmtpNotifier::new(&config());
        match notifier.build_message("not-an-address", "Ann") {
            Err(NotificationError::InvalidAddress(cause)) => assert!(cause.contains("recipient")),
            other => panic!("expected invalid address, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_login_is_a_permanent_rejection() {
        let port = refusing_relay().await;
        let notifier = SmtpNotifier::new(&MailConfig {
            server: "127.0.0.1".to_string(),
            port,
            tls: SmtpTls::Plain,
            ..config()
        });

        match notifier.notify("ann@example.com", "Ann").await {
            Err(NotificationError::Rejected(cause)) => assert!(cause.contains("535")),
            other => panic!("expected rejected login, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_relay_fails_without_panicking() {
        let notifier = SmtpNotifier::new(&MailConfig {
            server: "127.0.0.1".to_string(),
            port: 1,
            ..config()
        });

        let err = notifier
            .notify("ann@example.com", "Ann")
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(
            err,
            NotificationError::Transport(_) | NotificationError::Rejected(_)
        ));
    }
}
