//! Campaign job records and the store that owns them.
//!
//! # Architecture
//!
//! - [`CampaignJob`]: progress record of one bulk run. Counters, status, and
//!   the append-only success/error logs.
//! - [`JobStatus`]: the job state machine (`running`, `paused`, `completed`,
//!   `stopped`).
//! - [`JobStore`]: backend-agnostic registry with atomic updates. Implement
//!   it to add durability or eviction without touching the dispatcher.
//! - [`MemoryJobStore`]: in-memory store used by the server and the tests.

mod entry;
mod memory;
mod traits;

pub use entry::{CampaignJob, FailedSend, JobStatus, SuccessfulSend};
pub use memory::MemoryJobStore;
pub use traits::JobStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("job already exists: {0}")]
    AlreadyExists(String),
    #[error("job {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
}
