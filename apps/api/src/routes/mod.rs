pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::handlers as jobs;
use crate::personas::handlers as personas;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/jobs/start", post(jobs::handle_start_job))
        .route("/jobs/:id/status", get(jobs::handle_job_status))
        .route(
            "/jobs/:id/feedback",
            get(jobs::handle_job_feedback).post(jobs::handle_record_feedback),
        )
        // Personas API
        .route(
            "/personas",
            get(personas::handle_list_personas).post(personas::handle_create_persona),
        )
        .route("/personas/batch", post(personas::handle_create_personas))
        .route("/personas/:id", get(personas::handle_get_persona))
        .with_state(state)
}

/// Parses a path identifier. A malformed id cannot name a stored record,
/// so it is reported as not found.
pub fn parse_id(raw: &str, kind: &str) -> Result<Uuid, AppError> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::NotFound(format!("{kind} not found")))
}
