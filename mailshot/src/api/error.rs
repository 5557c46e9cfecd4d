use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::CampaignError;
use crate::jobs::JobError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Job not found")]
    JobNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Request timeout")]
    Timeout,

    /// A fetch on the caller's behalf failed; `status` is relayed.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// The provider refused or never took the message. The reason is safe to
    /// show to the caller.
    #[error("{0}")]
    Delivery(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn http_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Delivery(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn http_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "an internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Trace server errors since the response body may not carry the detail
        if self.http_code().is_server_error() {
            tracing::error!("Error Status {}: {}", self.http_code(), self);
        }

        let body = Json(json!({
            "success": false,
            "message": self.http_message(),
        }));
        (self.http_code(), body).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(_) => ApiError::JobNotFound,
            JobError::AlreadyExists(_) | JobError::InvalidTransition { .. } => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        match err {
            CampaignError::NoRecipients => {
                ApiError::BadRequest(CampaignError::NoRecipients.to_string())
            }
            CampaignError::Job(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;

    #[test]
    fn job_errors_map_to_status_codes() {
        let not_found: ApiError = JobError::NotFound("x".into()).into();
        assert_eq!(not_found.http_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.http_message(), "Job not found");

        let invalid: ApiError = JobError::InvalidTransition {
            id: "x".into(),
            from: JobStatus::Stopped,
            to: JobStatus::Running,
        }
        .into();
        assert_eq!(invalid.http_code(), StatusCode::CONFLICT);
        assert_eq!(invalid.http_message(), "job x cannot go from stopped to running");
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err = ApiError::Internal("join error: panicked".into());
        assert_eq!(err.http_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.http_message(), "an internal server error occurred");
    }
}
