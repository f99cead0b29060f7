use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluator::{EvaluatorClient, EvaluatorError};
use crate::models::feedback::{Feedback, FeedbackWithPersona, NewFeedback};
use crate::models::job::{Job, JobStatus, JOB_STATUS_SCHEMA};
use crate::store::Store;

/// Dispatches above this many personas are logged as a scale risk.
const LARGE_DISPATCH_WARN: usize = 1_000;

/// Creates a job and hands it, with every stored persona, to the evaluation
/// service. If the service does not accept it the job stays `pending`.
pub async fn start_job(
    store: &dyn Store,
    evaluator: &EvaluatorClient,
    mvp_link: &str,
) -> Result<Job, AppError> {
    let job = store.insert_job().await?;

    let personas = store.all_personas().await?;
    if personas.len() > LARGE_DISPATCH_WARN {
        warn!(
            "Job {} dispatches {} personas in a single request",
            job.id,
            personas.len()
        );
    }

    info!(
        "Starting job {} for {} with {} personas",
        job.id,
        mvp_link,
        personas.len()
    );

    evaluator.start(mvp_link, job.id, &personas).await?;

    store.set_job_status(job.id, JobStatus::InProgress).await
}

/// Reads the job's status from the evaluation service and mirrors forward
/// moves into the store. Returns the service's raw payload.
pub async fn poll_status(
    store: &dyn Store,
    evaluator: &EvaluatorClient,
    job_id: Uuid,
) -> Result<Value, AppError> {
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let payload = evaluator.status(job_id).await?;
    let reported = reported_status(&payload)?;

    if reported == job.status {
        return Ok(payload);
    }

    if job.status.can_advance_to(reported) {
        info!("Job {job_id} status {} -> {reported}", job.status);
        store.set_job_status(job_id, reported).await?;
    } else {
        // completed is terminal; stale or regressing reports are not persisted
        warn!(
            "Ignoring status regression for job {job_id}: stored {}, reported {reported}",
            job.status
        );
    }

    Ok(payload)
}

fn reported_status(payload: &Value) -> Result<JobStatus, AppError> {
    let normalized = JOB_STATUS_SCHEMA
        .validate(payload)
        .map_err(|e| EvaluatorError::InvalidPayload(e.to_string()))?;

    normalized
        .get("status")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| EvaluatorError::InvalidPayload("missing status".to_string()).into())
}

/// Feedback for a job, newest first, with each persona resolved by a
/// batch lookup rather than a per-row fetch.
pub async fn job_feedback(
    store: &dyn Store,
    job_id: Uuid,
) -> Result<Vec<FeedbackWithPersona>, AppError> {
    let feedback = store.feedback_for_job(job_id).await?;
    if feedback.is_empty() {
        return Ok(Vec::new());
    }

    let mut persona_ids: Vec<Uuid> = feedback.iter().map(|f| f.persona_id).collect();
    persona_ids.sort();
    persona_ids.dedup();

    let personas: HashMap<Uuid, _> = store
        .personas_by_ids(&persona_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(feedback
        .into_iter()
        .map(|f| {
            let persona = personas.get(&f.persona_id).cloned();
            FeedbackWithPersona::new(f, persona)
        })
        .collect())
}

/// Records one persona's feedback for a job. Both must exist; a second
/// record for the same pair is a conflict.
pub async fn record_feedback(
    store: &dyn Store,
    feedback: NewFeedback,
) -> Result<Feedback, AppError> {
    if store.get_job(feedback.job_id).await?.is_none() {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    if store.get_persona(feedback.persona_id).await?.is_none() {
        return Err(AppError::NotFound("Persona not found".to_string()));
    }

    let stored = store.insert_feedback(feedback).await?;
    info!(
        "Recorded feedback {} from persona {} for job {}",
        stored.id, stored.persona_id, stored.job_id
    );
    Ok(stored)
}
