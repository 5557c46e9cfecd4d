use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::entry::CampaignJob;
use super::traits::JobStore;
use super::JobError;

/// In-memory [`JobStore`].
///
/// Jobs are stored in a `Vec` behind a mutex, which keeps creation order for
/// listings. Not durable: all jobs are lost on restart, and nothing is ever
/// evicted.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<Mutex<Vec<CampaignJob>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: CampaignJob) -> Result<(), JobError> {
        let mut jobs = self.jobs.lock().await;
        if jobs.iter().any(|j| j.id == job.id) {
            return Err(JobError::AlreadyExists(job.id));
        }
        jobs.push(job);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CampaignJob>, JobError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<CampaignJob>, JobError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.clone())
    }

    async fn update<F, T>(&self, id: &str, f: F) -> Result<T, JobError>
    where
        F: FnOnce(&mut CampaignJob) -> Result<T, JobError> + Send,
        T: Send,
    {
        let mut jobs = self.jobs.lock().await;
        let existing = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        let mut draft = existing.clone();
        let out = f(&mut draft)?;
        *existing = draft;
        Ok(out)
    }
}
