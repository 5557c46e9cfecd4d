use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::JobError;

/// Lifecycle of a bulk campaign job.
///
/// `running -> {paused, stopped, completed}`, `paused -> {running, stopped}`.
/// `completed` and `stopped` are terminal. `failed` is kept for wire
/// compatibility; individual send failures never move a job into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A recipient the provider rejected, or that ran out of retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSend {
    pub email: String,
    pub error: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessfulSend {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Progress record of one bulk campaign run.
///
/// Counters only move through [`record_success`](Self::record_success) and
/// [`record_failure`](Self::record_failure), which keep
/// `sent == success + failed` and `pending == total_emails - sent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignJob {
    pub id: String,
    pub total_emails: usize,
    pub sent: usize,
    pub success: usize,
    pub failed: usize,
    pub pending: usize,
    pub status: JobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub end_time: Option<OffsetDateTime>,
    pub total_batches: usize,
    pub current_batch: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_email: Option<String>,
    pub errors: Vec<FailedSend>,
    pub successful_emails: Vec<SuccessfulSend>,
    /// Retry attempts made across all recipients.
    pub retries: u32,
    pub from_address: String,
}

impl CampaignJob {
    pub fn new(
        id: impl Into<String>,
        total_emails: usize,
        total_batches: usize,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            total_emails,
            sent: 0,
            success: 0,
            failed: 0,
            pending: total_emails,
            status: JobStatus::Running,
            start_time: OffsetDateTime::now_utc(),
            end_time: None,
            total_batches,
            current_batch: 0,
            current_email: None,
            errors: Vec::new(),
            successful_emails: Vec::new(),
            retries: 0,
            from_address: from_address.into(),
        }
    }

    pub fn record_success(
        &mut self,
        email: impl Into<String>,
        message_id: Option<String>,
        at: OffsetDateTime,
    ) {
        self.sent += 1;
        self.success += 1;
        self.pending = self.total_emails.saturating_sub(self.sent);
        self.successful_emails.push(SuccessfulSend {
            email: email.into(),
            success: true,
            message_id,
            timestamp: at,
        });
    }

    pub fn record_failure(
        &mut self,
        email: impl Into<String>,
        error: impl Into<String>,
        at: OffsetDateTime,
    ) {
        self.sent += 1;
        self.failed += 1;
        self.pending = self.total_emails.saturating_sub(self.sent);
        self.errors.push(FailedSend {
            email: email.into(),
            error: error.into(),
            timestamp: at,
        });
    }

    pub fn pause(&mut self) -> Result<(), JobError> {
        match self.status {
            JobStatus::Running | JobStatus::Paused => {
                self.status = JobStatus::Paused;
                Ok(())
            }
            from => Err(self.invalid(from, JobStatus::Paused)),
        }
    }

    pub fn resume(&mut self) -> Result<(), JobError> {
        match self.status {
            JobStatus::Running | JobStatus::Paused => {
                self.status = JobStatus::Running;
                Ok(())
            }
            from => Err(self.invalid(from, JobStatus::Running)),
        }
    }

    pub fn stop(&mut self, at: OffsetDateTime) -> Result<(), JobError> {
        self.finish(JobStatus::Stopped, at)
    }

    pub fn complete(&mut self, at: OffsetDateTime) -> Result<(), JobError> {
        self.finish(JobStatus::Completed, at)
    }

    fn finish(&mut self, to: JobStatus, at: OffsetDateTime) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(self.invalid(self.status, to));
        }
        self.status = to;
        self.end_time = Some(at);
        Ok(())
    }

    fn invalid(&self, from: JobStatus, to: JobStatus) -> JobError {
        JobError::InvalidTransition {
            id: self.id.clone(),
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(total: usize) -> CampaignJob {
        CampaignJob::new("job-1", total, 1, "\"Acme\" <news@acme.test>")
    }

    #[test]
    fn counters_stay_consistent() {
        let mut job = job(3);
        let now = OffsetDateTime::now_utc();

        job.record_success("a@x.test", Some("<1@x>".into()), now);
        job.record_failure("b@x.test", "mailbox unavailable", now);

        assert_eq!(job.sent, job.success + job.failed);
        assert_eq!(job.pending, job.total_emails - job.sent);
        assert_eq!(job.pending, 1);
        assert_eq!(job.successful_emails[0].email, "a@x.test");
        assert_eq!(job.errors[0].error, "mailbox unavailable");
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut job = job(1);
        job.pause().unwrap();
        job.pause().unwrap();
        assert_eq!(job.status, JobStatus::Paused);
        job.resume().unwrap();
        job.resume().unwrap();
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn stop_is_terminal() {
        let mut job = job(1);
        job.pause().unwrap();
        job.stop(OffsetDateTime::now_utc()).unwrap();

        assert_eq!(job.status, JobStatus::Stopped);
        assert!(job.end_time.is_some());
        assert!(matches!(
            job.resume(),
            Err(JobError::InvalidTransition { from: JobStatus::Stopped, to: JobStatus::Running, .. })
        ));
        assert!(job.complete(OffsetDateTime::now_utc()).is_err());
        assert!(job.stop(OffsetDateTime::now_utc()).is_err());
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(job(2)).unwrap();
        assert_eq!(json["totalEmails"], 2);
        assert_eq!(json["status"], "running");
        assert_eq!(json["successfulEmails"], serde_json::json!([]));
        assert!(json.get("endTime").is_none());
    }
}
