//! Mailer trait and SMTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Email, EmailBody, MailError};

/// What the provider handed back for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

/// Async email transport.
///
/// A single call is a single attempt: retries belong to
/// [`send_with_retry`](super::send_with_retry), not to implementations.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError>;

    /// Lightweight handshake with the provider.
    async fn verify(&self) -> Result<bool, MailError>;
}

#[async_trait]
impl<M: Mailer> Mailer for Arc<M> {
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError> {
        (**self).send(email).await
    }

    async fn verify(&self) -> Result<bool, MailError> {
        (**self).verify().await
    }
}

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    #[serde(rename = "smtp_host", default = "default_host")]
    pub host: String,

    #[serde(rename = "smtp_port", default = "default_port")]
    pub port: u16,

    #[serde(rename = "smtp_username")]
    pub username: Option<String>,

    #[serde(rename = "smtp_password")]
    pub password: Option<String>,

    /// TLS mode: "starttls" (default), "tls", or "none".
    #[serde(rename = "smtp_tls", default = "default_tls")]
    pub tls: String,

    /// Command timeout in seconds.
    #[serde(rename = "smtp_timeout", default = "default_timeout")]
    pub timeout: u64,
}

fn default_host() -> String {
    "email-smtp.us-east-1.amazonaws.com".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_tls() -> String {
    "starttls".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// SMTP-based mailer using lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn from_config(config: MailerConfig) -> Result<Self, MailError> {
        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout)));

        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: Arc::new(builder.build()),
        })
    }

    /// Build a lettre Message, stamping it with a fresh Message-ID that is
    /// also reported back as the provider message id.
    fn build_message(email: &Email) -> Result<(Message, String), MailError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.from.clone()))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

        let builder = Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .message_id(Some(message_id.clone()));

        let message = match &email.body {
            EmailBody::Text(text) => builder.body(text.clone()),
            EmailBody::Html(html) => builder.singlepart(SinglePart::html(html.clone())),
        }
        .map_err(|e| MailError::Build(e.to_string()))?;

        Ok((message, message_id))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError> {
        let (message, message_id) = Self::build_message(email)?;

        let response = self.transport.send(message).await?;
        tracing::debug!(to = %email.to, code = %response.code(), "smtp accepted message");

        Ok(SendReceipt {
            message_id: Some(message_id),
        })
    }

    async fn verify(&self) -> Result<bool, MailError> {
        Ok(self.transport.test_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_uses_sender_domain() {
        let email = Email::builder()
            .from("\"Acme\" <news@acme.test>")
            .to("user@example.com")
            .subject("Hi")
            .html("<p>hi</p>")
            .build()
            .unwrap();

        let (_, message_id) = SmtpMailer::build_message(&email).unwrap();
        assert!(message_id.starts_with('<'));
        assert!(message_id.ends_with("@acme.test>"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let email = Email::builder()
            .from("news@acme.test")
            .to("not an address")
            .subject("Hi")
            .text("hi")
            .build()
            .unwrap();

        let err = SmtpMailer::build_message(&email).unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(addr) if addr == "not an address"));
    }
}
