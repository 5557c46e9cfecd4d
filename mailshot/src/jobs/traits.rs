use async_trait::async_trait;

use super::entry::CampaignJob;
use super::JobError;

/// Backend-agnostic registry of campaign jobs, keyed by job id.
///
/// The dispatcher and the status/control callers share one store. Every
/// change goes through [`update`](JobStore::update), which applies a closure
/// to the record under the store's lock and writes the result back in one
/// step, so readers never see a half-applied change and a progress write
/// never overwrites a concurrent pause or stop.
#[async_trait]
pub trait JobStore: Send + Sync + Clone + 'static {
    /// Insert a new job. Fails with [`JobError::AlreadyExists`] if the id is taken.
    async fn create(&self, job: CampaignJob) -> Result<(), JobError>;

    /// Snapshot of a job, or `None` when the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<CampaignJob>, JobError>;

    /// Snapshots of every job in creation order.
    async fn list(&self) -> Result<Vec<CampaignJob>, JobError>;

    /// Atomically modify a job.
    ///
    /// The closure works on a copy; the copy replaces the stored record only
    /// when the closure returns `Ok`. Unknown ids fail with
    /// [`JobError::NotFound`].
    async fn update<F, T>(&self, id: &str, f: F) -> Result<T, JobError>
    where
        F: FnOnce(&mut CampaignJob) -> Result<T, JobError> + Send,
        T: Send;
}
