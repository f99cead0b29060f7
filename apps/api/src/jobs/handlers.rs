//! Axum route handlers for the Jobs API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::lifecycle::{job_feedback, poll_status, record_feedback, start_job};
use crate::models::feedback::{Feedback, FeedbackWithPersona, NewFeedback};
use crate::models::job::Job;
use crate::routes::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub mvp_link: Option<String>,
}

/// POST /jobs/start
pub async fn handle_start_job(
    State(state): State<AppState>,
    payload: Result<Json<StartJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let Json(request) = payload?;
    let mvp_link = request
        .mvp_link
        .filter(|link| !link.trim().is_empty())
        .ok_or_else(|| AppError::Validation("mvpLink is required".to_string()))?;

    let job = start_job(state.store.as_ref(), &state.evaluator, &mvp_link).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/:id/status
///
/// Returns the evaluation service's payload as-is, not the stored job.
pub async fn handle_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let job_id = parse_id(&id, "Job")?;
    let payload = poll_status(state.store.as_ref(), &state.evaluator, job_id).await?;
    Ok(Json(payload))
}

/// GET /jobs/:id/feedback
///
/// An id that cannot name a job has no feedback, so it yields an empty list.
pub async fn handle_job_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FeedbackWithPersona>>, AppError> {
    let Ok(job_id) = id.parse::<Uuid>() else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(job_feedback(state.store.as_ref(), job_id).await?))
}

/// POST /jobs/:id/feedback
///
/// Write-back from the evaluation service: `{ persona, feedback }`.
pub async fn handle_record_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let job_id = parse_id(&id, "Job")?;
    let Json(body) = payload?;
    let feedback = NewFeedback::from_json(job_id, &body)?;

    let stored = record_feedback(state.store.as_ref(), feedback).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
