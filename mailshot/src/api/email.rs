use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::{validate, ApiError, JsonResult};
use crate::campaign::{
    BulkCampaignReport, BulkCampaignRequest, CampaignReport, CampaignRequest, CampaignService,
    SingleEmailRequest,
};
use crate::jobs::JobStore;
use crate::mail::Mailer;

pub(super) async fn send_email<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    payload: Result<Json<SingleEmailRequest>, JsonRejection>,
) -> JsonResult<Value> {
    let Json(req) = payload?;
    validate::single(&req)?;

    let outcome = service.send_single_email(req).await;
    if !outcome.success {
        return Err(ApiError::Delivery(outcome.error.unwrap_or_default()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Email sent successfully",
        "messageId": outcome.message_id,
        "fromAddress": outcome.from_address,
    })))
}

pub(super) async fn send_campaign<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    payload: Result<Json<CampaignRequest>, JsonRejection>,
) -> JsonResult<CampaignReport> {
    let Json(req) = payload?;
    validate::campaign(&req)?;

    Ok(Json(service.send_campaign(req).await?))
}

/// Runs the job on its own task so a client that disconnects mid-run does
/// not cancel it; the response is sent once the job ends.
pub(super) async fn send_bulk_campaign<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    payload: Result<Json<BulkCampaignRequest>, JsonRejection>,
) -> JsonResult<BulkCampaignReport> {
    let Json(req) = payload?;
    validate::bulk(&req)?;

    let handle = tokio::spawn(async move { service.send_bulk_campaign(req).await });
    let report = handle
        .await
        .map_err(|e| ApiError::Internal(format!("bulk campaign task failed: {e}")))??;

    Ok(Json(report))
}
