//! Outbound mail transport and the retry controller wrapped around it.
//!
//! [`Mailer`] is the seam to the provider. [`SmtpMailer`] implements it over
//! [lettre](https://lettre.rs) and is what the server uses against Amazon SES;
//! tests substitute scripted mailers.
//!
//! # Environment Variables
//!
//! [`MailerConfig`] is read with [`EnvConfig`](crate::config::EnvConfig):
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SMTP_HOST` | No | SMTP relay (default: `email-smtp.us-east-1.amazonaws.com`) |
//! | `SMTP_PORT` | No | Port (default: 587) |
//! | `SMTP_USERNAME` | No | Username for authentication |
//! | `SMTP_PASSWORD` | No | Password for authentication |
//! | `SMTP_TLS` | No | `starttls` (default), `tls`, or `none` |
//! | `SMTP_TIMEOUT` | No | Command timeout in seconds (default: 10) |

mod mailer;
mod message;
pub mod retry;

pub use mailer::{Mailer, MailerConfig, SendReceipt, SmtpMailer};
pub use message::{format_from_address, Email, EmailBody, EmailBuilder};
pub use retry::{send_with_retry, send_with_retry_until, Delivery, RetryPolicy};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("connection timed out: {0}")]
    Timeout(String),

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    /// Any other provider or protocol failure. `code` is the SMTP reply code
    /// when the server answered.
    #[error("{message}")]
    Smtp {
        code: Option<String>,
        message: String,
    },
}

impl MailError {
    pub fn smtp(message: impl Into<String>) -> Self {
        MailError::Smtp {
            code: None,
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed: timeouts, resets, and provider
    /// throttling ("Throttling", "rate limit", "rate exceeded" in the reply).
    /// Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            MailError::Timeout(_) | MailError::ConnectionReset(_) => true,
            MailError::Smtp { message, .. } => {
                let message = message.to_ascii_lowercase();
                ["throttl", "rate limit", "rate exceeded"]
                    .iter()
                    .any(|marker| message.contains(marker))
            }
            MailError::InvalidAddress(_) | MailError::Build(_) => false,
        }
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        if err.is_timeout() || io_kind(&err) == Some(std::io::ErrorKind::TimedOut) {
            return MailError::Timeout(err.to_string());
        }
        if io_kind(&err) == Some(std::io::ErrorKind::ConnectionReset) {
            return MailError::ConnectionReset(err.to_string());
        }
        MailError::Smtp {
            code: err.status().map(|code| code.to_string()),
            message: err.to_string(),
        }
    }
}

/// First I/O error kind found in an error's source chain.
fn io_kind(err: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = current.source();
    }
    None
}
