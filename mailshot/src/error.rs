use crate::jobs::JobError;

/// Errors that reject a campaign operation as a whole.
///
/// Failures of individual recipients are not errors at this level: they are
/// recorded on the job and in the returned results.
#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("at least one contact is required")]
    NoRecipients,

    #[error(transparent)]
    Job(#[from] JobError),
}
