//! Email message types and builder.

use serde::{Deserialize, Serialize};

use super::MailError;

/// The body content of an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailBody {
    Text(String),
    Html(String),
}

/// A complete single-recipient message ready for a [`Mailer`](super::Mailer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    /// Sender mailbox, e.g. `"Acme" <news@acme.test>`.
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: EmailBody,
}

impl Email {
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }
}

/// Render a sender mailbox as `"Name" <address>`.
///
/// Quotes and backslashes in the display name are escaped so the result
/// always parses as a mailbox.
pub fn format_from_address(name: &str, email: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("\"{escaped}\" <{email}>")
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<String>,
    to: Option<String>,
    subject: Option<String>,
    body: Option<EmailBody>,
}

impl EmailBuilder {
    pub fn from(mut self, mailbox: impl Into<String>) -> Self {
        self.from = Some(mailbox.into());
        self
    }

    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to = Some(address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set an HTML body, replacing any body set before.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.body = Some(EmailBody::Html(html.into()));
        self
    }

    /// Set a plain text body, replacing any body set before.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(EmailBody::Text(text.into()));
        self
    }

    pub fn build(self) -> Result<Email, MailError> {
        let to = self
            .to
            .ok_or_else(|| MailError::Build("recipient required".into()))?;
        let from = self
            .from
            .ok_or_else(|| MailError::Build("from address required".into()))?;
        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;
        let body = self
            .body
            .ok_or_else(|| MailError::Build("body required (text or html)".into()))?;

        Ok(Email {
            from,
            to,
            subject,
            body,
        })
    }
}
