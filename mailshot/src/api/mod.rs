//! JSON HTTP API over a [`CampaignService`].
//!
//! | Method | Path | |
//! |--------|------|-|
//! | POST | `/api/send-email` | single message |
//! | POST | `/api/send-campaign` | synchronous campaign |
//! | POST | `/api/send-bulk-campaign` | tracked bulk job, answers when the job ends |
//! | GET | `/api/job-status/:job_id` | job snapshot |
//! | GET | `/api/jobs` | every job |
//! | POST | `/api/pause-job/:job_id` | |
//! | POST | `/api/resume-job/:job_id` | |
//! | POST | `/api/stop-job/:job_id` | |
//! | GET | `/api/test-connection` | provider handshake |
//! | GET | `/api/health` | |
//! | GET | `/api/image-proxy?url=` | relays an allowed external image |
//!
//! Errors are `{"success": false, "message": ...}` with a matching status.

mod email;
mod error;
mod health;
mod jobs;
mod proxy;
mod validate;

pub use error::ApiError;
pub use proxy::{ImageProxy, DEFAULT_ALLOWED_HOSTS};

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::campaign::CampaignService;
use crate::jobs::JobStore;
use crate::mail::Mailer;

pub type JsonResult<T> = Result<Json<T>, ApiError>;

pub fn router<M: Mailer, S: JobStore>(service: CampaignService<M, S>) -> Router {
    router_with_proxy(service, ImageProxy::default())
}

pub fn router_with_proxy<M: Mailer, S: JobStore>(
    service: CampaignService<M, S>,
    proxy: ImageProxy,
) -> Router {
    let api = Router::new()
        .route("/send-email", post(email::send_email::<M, S>))
        .route("/send-campaign", post(email::send_campaign::<M, S>))
        .route("/send-bulk-campaign", post(email::send_bulk_campaign::<M, S>))
        .route("/job-status/:job_id", get(jobs::job_status::<M, S>))
        .route("/jobs", get(jobs::list_jobs::<M, S>))
        .route("/pause-job/:job_id", post(jobs::pause_job::<M, S>))
        .route("/resume-job/:job_id", post(jobs::resume_job::<M, S>))
        .route("/stop-job/:job_id", post(jobs::stop_job::<M, S>))
        .route("/test-connection", get(health::test_connection::<M, S>))
        .route("/health", get(health::health::<M, S>))
        .route("/image-proxy", get(proxy::image_proxy));

    Router::new()
        .route("/", get(health::index))
        .nest("/api", api)
        .fallback(health::not_found)
        .layer(Extension(proxy))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// CORS for the admin dashboard: the listed origins, with credentials.
/// Entries that are not valid header values are skipped.
pub fn cors<I, O>(origins: I) -> CorsLayer
where
    I: IntoIterator<Item = O>,
    O: AsRef<str>,
{
    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|o| HeaderValue::from_str(o.as_ref().trim()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}
