//! Request checks applied before anything reaches the engine.

use lettre::Address;

use super::ApiError;
use crate::campaign::{BulkCampaignRequest, CampaignRequest, Contact, SingleEmailRequest};

const MAX_BATCH_SIZE: usize = 50;
const MIN_INTER_DELAY_MS: u64 = 100;

fn address(field: &str, value: &str) -> Result<(), ApiError> {
    value
        .parse::<Address>()
        .map(|_| ())
        .map_err(|_| ApiError::BadRequest(format!("\"{field}\" must be a valid email")))
}

fn optional_address(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    value.map_or(Ok(()), |v| address(field, v))
}

fn required(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("\"{field}\" is not allowed to be empty")));
    }
    Ok(())
}

fn contacts(list: &[Contact]) -> Result<(), ApiError> {
    if list.is_empty() {
        return Err(ApiError::BadRequest(
            "\"contacts\" must contain at least 1 items".to_string(),
        ));
    }
    for (i, contact) in list.iter().enumerate() {
        address(&format!("contacts[{i}].email"), &contact.email)?;
    }
    Ok(())
}

pub fn single(req: &SingleEmailRequest) -> Result<(), ApiError> {
    address("to", &req.to)?;
    required("subject", &req.subject)?;
    required("html", &req.html)?;
    optional_address("fromEmail", req.from_email.as_deref())
}

pub fn campaign(req: &CampaignRequest) -> Result<(), ApiError> {
    contacts(&req.contacts)?;
    required("subject", &req.subject)?;
    required("template", &req.template)?;
    optional_address("fromEmail", req.from_email.as_deref())
}

pub fn bulk(req: &BulkCampaignRequest) -> Result<(), ApiError> {
    required("jobId", &req.job_id)?;
    contacts(&req.contacts)?;
    required("subject", &req.subject)?;
    required("html", &req.html)?;
    optional_address("fromEmail", req.from_email.as_deref())?;

    if let Some(size) = req.batch_size {
        if !(1..=MAX_BATCH_SIZE).contains(&size) {
            return Err(ApiError::BadRequest(format!(
                "\"batchSize\" must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
    }
    if let Some(delay) = req.inter_delay_ms {
        if delay < MIN_INTER_DELAY_MS {
            return Err(ApiError::BadRequest(format!(
                "\"delayBetweenBatches\" must be greater than or equal to {MIN_INTER_DELAY_MS}"
            )));
        }
    }
    Ok(())
}
