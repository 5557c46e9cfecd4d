use serde::Serialize;
use time::OffsetDateTime;

use crate::jobs::JobStatus;
use crate::mail::Delivery;

/// Outcome of one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl SendResult {
    pub(crate) fn from_delivery(email: &str, delivery: &Delivery, at: OffsetDateTime) -> Self {
        match &delivery.result {
            Ok(receipt) => Self {
                email: email.to_string(),
                success: true,
                message_id: receipt.message_id.clone(),
                error: None,
                timestamp: at,
            },
            Err(err) => Self {
                email: email.to_string(),
                success: false,
                message_id: None,
                error: Some(err.to_string()),
                timestamp: at,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    pub success_count: usize,
    pub failure_count: usize,
    pub total_sent: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReport {
    pub success: bool,
    pub message: String,
    pub from_address: String,
    pub results: Vec<SendResult>,
    pub stats: CampaignStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResults {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Whole seconds from job start to the end of the send loop.
    pub duration: i64,
    pub from_address: String,
    pub details: Vec<SendResult>,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCampaignReport {
    pub success: bool,
    pub message: String,
    pub job_id: String,
    pub results: BulkResults,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub success: bool,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub total_jobs: usize,
    /// Jobs still running or paused.
    pub active_jobs: usize,
    /// Seconds since the service was built.
    pub uptime: u64,
    pub config: SendingSummary,
}

/// Effective sending configuration, as reported by health checks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingSummary {
    pub sender: String,
    pub rate_limit: String,
    pub batch_size: usize,
    pub email_delay: String,
    pub batch_delay: String,
    pub max_retries: u32,
}
