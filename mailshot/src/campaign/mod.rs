//! Campaign sending: single messages, small synchronous campaigns, and
//! tracked bulk jobs.
//!
//! All three paths share the [`Personalizer`] and the retry controller in
//! [`crate::mail::retry`]. Only bulk campaigns create a job in the
//! [`JobStore`](crate::jobs::JobStore), and only bulk campaigns can be paused,
//! resumed or stopped.
//!
//! ```ignore
//! let service = CampaignService::new(mailer, MemoryJobStore::new(), config);
//!
//! let runner = service.clone();
//! let handle = tokio::spawn(async move { runner.send_bulk_campaign(req).await });
//!
//! // meanwhile, from anywhere holding a clone:
//! let progress = service.get_job("spring-sale").await?;
//! service.pause_job("spring-sale").await?;
//! ```

mod dispatcher;
mod personalize;
mod report;
mod request;
mod service;

pub use personalize::{Contact, Personalizer, DEFAULT_GREETING};
pub use report::{
    BulkCampaignReport, BulkResults, CampaignReport, CampaignStats, ConnectionReport,
    HealthReport, SendResult, SendingSummary, SingleSendOutcome,
};
pub use request::{BulkCampaignRequest, CampaignRequest, SingleEmailRequest};
pub use service::CampaignService;
