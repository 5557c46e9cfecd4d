use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::JsonResult;
use crate::campaign::CampaignService;
use crate::jobs::JobStore;
use crate::mail::Mailer;

pub(super) async fn job_status<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    Path(job_id): Path<String>,
) -> JsonResult<Value> {
    let job = service.get_job(&job_id).await?;
    Ok(Json(json!({ "success": true, "job": job })))
}

pub(super) async fn list_jobs<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
) -> JsonResult<Value> {
    let jobs = service.list_jobs().await?;
    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

pub(super) async fn pause_job<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    Path(job_id): Path<String>,
) -> JsonResult<Value> {
    let job = service.pause_job(&job_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Job paused successfully",
        "job": job,
    })))
}

pub(super) async fn resume_job<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    Path(job_id): Path<String>,
) -> JsonResult<Value> {
    let job = service.resume_job(&job_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Job resumed successfully",
        "job": job,
    })))
}

pub(super) async fn stop_job<M: Mailer, S: JobStore>(
    State(service): State<CampaignService<M, S>>,
    Path(job_id): Path<String>,
) -> JsonResult<Value> {
    let job = service.stop_job(&job_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Job stopped successfully",
        "job": job,
    })))
}
