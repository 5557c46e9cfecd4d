//! The bulk send loop.

use std::time::Duration;

use time::OffsetDateTime;
use tracing::Instrument;

use super::report::{BulkCampaignReport, BulkResults, SendResult};
use super::request::BulkCampaignRequest;
use super::service::CampaignService;
use crate::error::CampaignError;
use crate::jobs::{CampaignJob, JobStatus, JobStore};
use crate::mail::Mailer;

/// What the loop should do before its next send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checkpoint {
    Proceed,
    Stop,
}

/// Why a recipient's retries were abandoned.
enum Interrupted {
    Stopped,
    Store(CampaignError),
}

impl<M: Mailer, S: JobStore> CampaignService<M, S> {
    /// Run a tracked bulk campaign to the end, or until it is stopped.
    ///
    /// Recipients are sent strictly one at a time in input order. After every
    /// recipient the job record is updated in the store, so status queries
    /// see progress as it happens. Before every send the job status is
    /// checked: a stopped job ends the loop, a paused job waits here until it
    /// is resumed or stopped.
    ///
    /// The same check runs before every retry of a transient failure, so a
    /// stop issued during a backoff leaves that recipient unsent.
    ///
    /// Individual send failures never end the run; they are counted on the
    /// job and returned in the details.
    pub async fn send_bulk_campaign(
        &self,
        req: BulkCampaignRequest,
    ) -> Result<BulkCampaignReport, CampaignError> {
        if req.contacts.is_empty() {
            return Err(CampaignError::NoRecipients);
        }

        let from_address = self.from_address(req.from_name.as_deref(), req.from_email.as_deref());
        let batch_size = self.effective_batch_size(req.batch_size);
        let total = req.contacts.len();
        let total_batches = total.div_ceil(batch_size);

        let job = CampaignJob::new(&req.job_id, total, total_batches, &from_address);
        let started = job.start_time;
        self.jobs.create(job).await?;

        let span = tracing::info_span!("bulk_campaign", job_id = %req.job_id);
        async move {
            tracing::info!(
                from = %from_address,
                total,
                total_batches,
                batch_size,
                "starting bulk campaign"
            );
            self.run(&req, &from_address, started).await
        }
        .instrument(span)
        .await
    }

    fn effective_batch_size(&self, requested: Option<usize>) -> usize {
        let max = self.config.default_batch_size.max(1);
        requested.unwrap_or(max).clamp(1, max)
    }

    async fn run(
        &self,
        req: &BulkCampaignRequest,
        from_address: &str,
        started: OffsetDateTime,
    ) -> Result<BulkCampaignReport, CampaignError> {
        let job_id = req.job_id.as_str();
        let total = req.contacts.len();
        let delay = req
            .inter_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.batch_delay());

        let mut details = Vec::with_capacity(total);

        for (index, contact) in req.contacts.iter().enumerate() {
            if self.checkpoint(job_id).await? == Checkpoint::Stop {
                tracing::info!(unsent = total - index, "job stopped, leaving remaining contacts");
                break;
            }

            let email = contact.email.clone();
            self.jobs
                .update(job_id, |job| {
                    job.current_batch = index + 1;
                    job.current_email = Some(email);
                    Ok(())
                })
                .await?;

            tracing::debug!(position = index + 1, total, email = %contact.email, "sending");
            let html = self.personalizer.render(&req.html, contact);
            let before_retry = move || async move {
                match self.checkpoint(job_id).await {
                    Ok(Checkpoint::Proceed) => Ok(()),
                    Ok(Checkpoint::Stop) => Err(Interrupted::Stopped),
                    Err(err) => Err(Interrupted::Store(err)),
                }
            };
            let delivery = match self
                .deliver_until(from_address, &contact.email, &req.subject, html, before_retry)
                .await
            {
                Ok(delivery) => delivery,
                Err(Interrupted::Stopped) => {
                    tracing::info!(
                        unsent = total - index,
                        "job stopped during retry backoff, leaving remaining contacts"
                    );
                    break;
                }
                Err(Interrupted::Store(err)) => return Err(err),
            };

            let result = SendResult::from_delivery(&contact.email, &delivery, OffsetDateTime::now_utc());
            let retries = delivery.retries();
            let recorded = result.clone();
            self.jobs
                .update(job_id, move |job| {
                    job.retries += retries;
                    match recorded.error {
                        None => job.record_success(recorded.email, recorded.message_id, recorded.timestamp),
                        Some(error) => job.record_failure(recorded.email, error, recorded.timestamp),
                    }
                    Ok(())
                })
                .await?;

            match &result.error {
                None => tracing::info!(position = index + 1, total, email = %result.email, "sent"),
                Some(error) => {
                    tracing::warn!(position = index + 1, total, email = %result.email, %error, "failed")
                }
            }
            details.push(result);

            if index + 1 < total {
                tokio::time::sleep(delay).await;
            }
        }

        // A pause that lands during the final send has nothing left to hold,
        // so a paused job completes here as well.
        let finished = OffsetDateTime::now_utc();
        let job = self
            .jobs
            .update(job_id, |job| {
                if !job.status.is_terminal() {
                    job.complete(finished)?;
                }
                Ok(job.clone())
            })
            .await?;

        let duration = (finished - started).whole_seconds();
        let verb = match job.status {
            JobStatus::Stopped => "stopped",
            _ => "completed",
        };
        tracing::info!(
            status = %job.status,
            successful = job.success,
            failed = job.failed,
            duration,
            "bulk campaign {verb}"
        );

        let mut message = format!(
            "Bulk campaign {verb}: {} successful, {} failed",
            job.success, job.failed
        );
        if job.pending > 0 {
            message.push_str(&format!(", {} not sent", job.pending));
        }

        Ok(BulkCampaignReport {
            success: true,
            message,
            job_id: job.id.clone(),
            results: BulkResults {
                total,
                successful: job.success,
                failed: job.failed,
                duration,
                from_address: job.from_address.clone(),
                details,
                status: job.status,
            },
        })
    }

    /// Wait out a pause, polling the store, and report whether to go on.
    async fn checkpoint(&self, job_id: &str) -> Result<Checkpoint, CampaignError> {
        let mut waiting = false;
        loop {
            match self.status_of(job_id).await? {
                JobStatus::Running => {
                    if waiting {
                        tracing::info!("job resumed, continuing");
                    }
                    return Ok(Checkpoint::Proceed);
                }
                JobStatus::Paused => {
                    if !waiting {
                        tracing::info!("job paused, holding before next send");
                        waiting = true;
                    }
                    tokio::time::sleep(self.config.pause_poll()).await;
                }
                JobStatus::Stopped | JobStatus::Completed | JobStatus::Failed => {
                    return Ok(Checkpoint::Stop);
                }
            }
        }
    }
}
