use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use time::OffsetDateTime;

use super::report::{
    CampaignReport, CampaignStats, ConnectionReport, HealthReport, SendResult, SendingSummary,
    SingleSendOutcome,
};
use super::request::{CampaignRequest, SingleEmailRequest};
use super::Personalizer;
use crate::config::CampaignConfig;
use crate::error::CampaignError;
use crate::jobs::{CampaignJob, JobError, JobStatus, JobStore};
use crate::mail::{format_from_address, send_with_retry_until, Delivery, Email, Mailer, RetryPolicy};

/// Entry point for every send path and for job status/control.
///
/// Cheap to clone: the mailer, store and configuration are shared, so one
/// clone can run a bulk job on its own task while others answer status
/// queries against the same store.
pub struct CampaignService<M, S> {
    pub(super) mailer: Arc<M>,
    pub(super) jobs: S,
    pub(super) config: Arc<CampaignConfig>,
    pub(super) personalizer: Arc<Personalizer>,
    started: Instant,
}

impl<M, S: Clone> Clone for CampaignService<M, S> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            jobs: self.jobs.clone(),
            config: Arc::clone(&self.config),
            personalizer: Arc::clone(&self.personalizer),
            started: self.started,
        }
    }
}

impl<M: Mailer, S: JobStore> CampaignService<M, S> {
    pub fn new(mailer: M, jobs: S, config: CampaignConfig) -> Self {
        let personalizer = Personalizer::new(config.company_name.clone());
        Self {
            mailer: Arc::new(mailer),
            jobs,
            config: Arc::new(config),
            personalizer: Arc::new(personalizer),
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn jobs(&self) -> &S {
        &self.jobs
    }

    /// Sender mailbox for a run, falling back to the configured defaults.
    pub fn from_address(&self, name: Option<&str>, email: Option<&str>) -> String {
        format_from_address(
            name.unwrap_or(&self.config.default_from_name),
            email.unwrap_or(&self.config.default_from_email),
        )
    }

    pub(super) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_attempts(self.config.max_retries)
    }

    /// Compose and send one message through the retry controller. A message
    /// that cannot be composed counts as a single failed attempt.
    pub(super) async fn deliver(&self, from: &str, to: &str, subject: &str, html: String) -> Delivery {
        let proceed = || std::future::ready(Ok::<(), Infallible>(()));
        match self.deliver_until(from, to, subject, html, proceed).await {
            Ok(delivery) => delivery,
            Err(never) => match never {},
        }
    }

    /// [`deliver`](Self::deliver), consulting `proceed` before each retry.
    pub(super) async fn deliver_until<F, Fut, E>(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: String,
        proceed: F,
    ) -> Result<Delivery, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let email = Email::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .html(html)
            .build();

        match email {
            Ok(email) => {
                send_with_retry_until(self.mailer.as_ref(), &email, self.retry_policy(), proceed).await
            }
            Err(err) => Ok(Delivery {
                result: Err(err),
                attempts: 1,
            }),
        }
    }

    pub async fn send_single_email(&self, req: SingleEmailRequest) -> SingleSendOutcome {
        let from_address = self.from_address(req.from_name.as_deref(), req.from_email.as_deref());
        tracing::info!(from = %from_address, to = %req.to, "sending single email");

        let delivery = self.deliver(&from_address, &req.to, &req.subject, req.html).await;

        match delivery.result {
            Ok(receipt) => SingleSendOutcome {
                success: true,
                message_id: receipt.message_id,
                error: None,
                from_address,
            },
            Err(err) => SingleSendOutcome {
                success: false,
                message_id: None,
                error: Some(err.to_string()),
                from_address,
            },
        }
    }

    /// Send a personalized copy of `template` to each contact, one at a time,
    /// waiting the configured inter-email delay between sends.
    pub async fn send_campaign(&self, req: CampaignRequest) -> Result<CampaignReport, CampaignError> {
        if req.contacts.is_empty() {
            return Err(CampaignError::NoRecipients);
        }

        let from_address = self.from_address(req.from_name.as_deref(), req.from_email.as_deref());
        let total = req.contacts.len();
        tracing::info!(from = %from_address, total, "sending campaign");

        let mut results = Vec::with_capacity(total);
        for (index, contact) in req.contacts.iter().enumerate() {
            let html = self.personalizer.render(&req.template, contact);
            let delivery = self.deliver(&from_address, &contact.email, &req.subject, html).await;
            results.push(SendResult::from_delivery(
                &contact.email,
                &delivery,
                OffsetDateTime::now_utc(),
            ));

            if index + 1 < total {
                tokio::time::sleep(self.config.email_delay()).await;
            }
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        tracing::info!(success_count, failure_count, "campaign finished");

        Ok(CampaignReport {
            success: true,
            message: format!("Campaign sent: {success_count} successful, {failure_count} failed"),
            from_address,
            results,
            stats: CampaignStats {
                success_count,
                failure_count,
                total_sent: total,
            },
        })
    }

    pub async fn test_connection(&self) -> ConnectionReport {
        match self.mailer.verify().await {
            Ok(true) => {
                tracing::info!("mail transport connection verified");
                ConnectionReport {
                    success: true,
                    message: "SMTP connection successful".to_string(),
                    sender: Some(self.from_address(None, None)),
                    rate_limit: Some(self.config.rate_limit_label()),
                    batch_size: Some(self.config.default_batch_size),
                }
            }
            Ok(false) => {
                tracing::warn!("mail transport rejected the connection test");
                ConnectionReport {
                    success: false,
                    message: "SMTP server did not accept the connection test".to_string(),
                    sender: None,
                    rate_limit: None,
                    batch_size: None,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "mail transport connection test failed");
                ConnectionReport {
                    success: false,
                    message: err.to_string(),
                    sender: None,
                    rate_limit: None,
                    batch_size: None,
                }
            }
        }
    }

    pub async fn health(&self) -> Result<HealthReport, JobError> {
        let jobs = self.jobs.list().await?;
        let active_jobs = jobs.iter().filter(|j| !j.status.is_terminal()).count();

        Ok(HealthReport {
            success: true,
            message: "Email server is running".to_string(),
            timestamp: OffsetDateTime::now_utc(),
            total_jobs: jobs.len(),
            active_jobs,
            uptime: self.started.elapsed().as_secs(),
            config: SendingSummary {
                sender: self.from_address(None, None),
                rate_limit: self.config.rate_limit_label(),
                batch_size: self.config.default_batch_size,
                email_delay: format!("{}ms", self.config.delay_between_emails),
                batch_delay: format!("{}ms", self.config.delay_between_batches),
                max_retries: self.config.max_retries,
            },
        })
    }

    pub async fn get_job(&self, id: &str) -> Result<CampaignJob, JobError> {
        self.jobs
            .get(id)
            .await?
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    pub async fn list_jobs(&self) -> Result<Vec<CampaignJob>, JobError> {
        self.jobs.list().await
    }

    /// Running -> paused. The dispatcher holds before its next send until the
    /// job is resumed or stopped.
    pub async fn pause_job(&self, id: &str) -> Result<CampaignJob, JobError> {
        let job = self
            .jobs
            .update(id, |job| {
                job.pause()?;
                Ok(job.clone())
            })
            .await?;
        tracing::info!(job_id = %id, "job paused");
        Ok(job)
    }

    pub async fn resume_job(&self, id: &str) -> Result<CampaignJob, JobError> {
        let job = self
            .jobs
            .update(id, |job| {
                job.resume()?;
                Ok(job.clone())
            })
            .await?;
        tracing::info!(job_id = %id, "job resumed");
        Ok(job)
    }

    /// Stop a job for good. Contacts not yet attempted are never sent.
    pub async fn stop_job(&self, id: &str) -> Result<CampaignJob, JobError> {
        let now = OffsetDateTime::now_utc();
        let job = self
            .jobs
            .update(id, |job| {
                job.stop(now)?;
                Ok(job.clone())
            })
            .await?;
        tracing::info!(job_id = %id, sent = job.sent, pending = job.pending, "job stopped");
        Ok(job)
    }

    pub(super) async fn status_of(&self, id: &str) -> Result<JobStatus, JobError> {
        Ok(self.get_job(id).await?.status)
    }
}
