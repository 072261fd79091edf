// src/services/mailer.rs

//! Notification delivery.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::SharedConfig;
use crate::pipeline::Notification;

/// Trait for notification delivery backends.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// SMTP delivery via lettre.
///
/// The transport is unpooled: every `send` opens its own connection and the
/// connection is closed when the call returns, whether or not delivery
/// succeeded.
pub struct SmtpMailer {
    server: String,
    port: u16,
    starttls: bool,
    from: Mailbox,
    credentials: Option<Credentials>,
}

impl SmtpMailer {
    /// Create a mailer from the shared configuration.
    pub fn new(config: &SharedConfig) -> Result<Self> {
        let from = config
            .from_address
            .parse()
            .map_err(|e| AppError::config(format!("FROM_ADDRESS is invalid: {e}")))?;
        let credentials = config
            .smtp_credentials()
            .map(|(user, pass)| Credentials::new(user.to_string(), pass.to_string()));

        Ok(Self {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            starttls: config.smtp_starttls,
            from,
            credentials,
        })
    }

    /// Build the MIME message for a notification.
    pub fn build_message(&self, notification: &Notification) -> Result<Message> {
        let to: Mailbox = notification.to.parse().map_err(|e| {
            AppError::mail(format!("invalid recipient '{}': {e}", notification.to))
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                notification.text_body.clone(),
                notification.html_body.clone(),
            ))
            .map_err(AppError::mail)
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)
                .map_err(AppError::mail)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.server.as_str())
        };

        let mut builder = builder.port(self.port);
        if let Some(credentials) = &self.credentials {
            builder = builder.credentials(credentials.clone());
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build_message(notification)?;
        let transport = self.transport()?;

        log::debug!(
            "Connecting to {}:{} for {}",
            self.server,
            self.port,
            notification.to
        );
        let response = transport.send(message).await.map_err(AppError::mail)?;
        log::info!(
            "Email sent to {} ({})",
            notification.to,
            response.code()
        );
        Ok(())
    }
}

/// Prints notifications to stdout instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        log::info!("Print-only mode: email to {} not sent", notification.to);
        println!("{}", render_console(notification));
        Ok(())
    }
}

/// Both alternatives of a message, as they would go out.
fn render_console(notification: &Notification) -> String {
    format!(
        "To: {}\nSubject: {}\n\n--- text/plain ---\n{}\n\n--- text/html ---\n{}\n",
        notification.to, notification.subject, notification.text_body, notification.html_body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SharedConfig {
        SharedConfig::from_yaml(
            "SMTP_SERVER: localhost\nSMTP_PORT: 2525\nFROM_ADDRESS: SONAR <sonar@example.org>\n",
        )
        .unwrap()
    }

    fn notification(to: &str) -> Notification {
        Notification {
            to: to.to_string(),
            subject: "Your arXiv SONAR".to_string(),
            text_body: "plain".to_string(),
            html_body: "<p>html</p>".to_string(),
        }
    }

    #[test]
    fn test_build_message_headers() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let message = mailer.build_message(&notification("alice@example.org")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("<sonar@example.org>"));
        assert!(raw.contains("To: alice@example.org"));
        assert!(raw.contains("Subject: Your arXiv SONAR"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_invalid_recipient_is_mail_error() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let err = mailer.build_message(&notification("nobody")).unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_mail_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut config = config();
        config.smtp_server = "127.0.0.1".into();
        config.smtp_port = port;

        let mailer = SmtpMailer::new(&config).unwrap();
        let err = mailer.send(&notification("alice@example.org")).await.unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
    }

    #[test]
    fn test_console_output_has_both_parts() {
        let out = render_console(&notification("alice@example.org"));
        assert!(out.starts_with("To: alice@example.org\nSubject: Your arXiv SONAR"));
        assert!(out.contains("--- text/plain ---\nplain"));
        assert!(out.contains("--- text/html ---\n<p>html</p>"));
    }

    #[tokio::test]
    async fn test_console_mailer_never_fails() {
        assert!(ConsoleMailer.send(&notification("alice@example.org")).await.is_ok());
    }
}
