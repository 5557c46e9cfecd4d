use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::JsonResult;
use crate::campaign::{CampaignService, HealthReport};
use crate::jobs::JobStore;
use crate::mail::Mailer;

pub(super) async fn index() -> Json<Value> {
    Json(json!({
        "message": "Email Server API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/health",
    }))
}

pub(super) async fn health<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
) -> JsonResult<HealthReport> {
    Ok(Json(service.health().await?))
}

/// Handshake with the mail provider; 500 when it fails.
pub(super) async fn test_connection<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
) -> Response {
    let report = service.test_connection().await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report)).into_response()
}

pub(super) async fn not_found(method: Method, uri: Uri) -> Response {
    let body = Json(json!({
        "success": false,
        "message": "Route not found",
        "path": uri.path(),
        "method": method.as_str(),
    }));
    (StatusCode::NOT_FOUND, body).into_response()
}
