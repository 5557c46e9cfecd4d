use serde::{Deserialize, Serialize};

use super::Contact;

/// One message to one address, sent as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmailRequest {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
}

/// A blocking, untracked send to a short contact list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    pub contacts: Vec<Contact>,
    pub subject: String,
    pub template: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
}

/// A tracked bulk run under a caller-chosen job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCampaignRequest {
    pub job_id: String,
    pub contacts: Vec<Contact>,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    /// Only shapes the reported `totalBatches`; capped by the configured
    /// default batch size.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Pause between two recipients, in milliseconds.
    #[serde(default, rename = "delayBetweenBatches")]
    pub inter_delay_ms: Option<u64>,
}

impl BulkCampaignRequest {
    pub fn new(
        job_id: impl Into<String>,
        contacts: Vec<Contact>,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            contacts,
            subject: subject.into(),
            html: html.into(),
            from_name: None,
            from_email: None,
            batch_size: None,
            inter_delay_ms: None,
        }
    }

    pub fn inter_delay_ms(mut self, ms: u64) -> Self {
        self.inter_delay_ms = Some(ms);
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn from(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self.from_email = Some(email.into());
        self
    }
}
