//! Persistence seam for the three collections.
//!
//! `AppState` holds an `Arc<dyn Store>`. Production uses `PgStore`; tests use
//! the in-memory store, which enforces the same uniqueness rule.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::feedback::{Feedback, NewFeedback};
use crate::models::job::{Job, JobStatus};
use crate::models::persona::{NewPersona, Persona};
use crate::personas::filter::PersonaFilter;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_persona(&self, persona: NewPersona) -> Result<Persona, AppError>;

    /// Inserts in order and returns the stored records in the same order.
    async fn insert_personas(&self, personas: Vec<NewPersona>) -> Result<Vec<Persona>, AppError>;

    async fn get_persona(&self, id: Uuid) -> Result<Option<Persona>, AppError>;

    /// Equality filter over persona fields, in insertion order. No limit.
    async fn find_personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, AppError>;

    /// Every stored persona. Unbounded: cost grows with the collection.
    async fn all_personas(&self) -> Result<Vec<Persona>, AppError> {
        self.find_personas(&PersonaFilter::default()).await
    }

    async fn personas_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Persona>, AppError>;

    /// Creates a job in `pending` status.
    async fn insert_job(&self) -> Result<Job, AppError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError>;

    async fn set_job_status(&self, id: Uuid, status: JobStatus) -> Result<Job, AppError>;

    /// Fails with `AppError::Conflict` if the (job, persona) pair already has feedback.
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback, AppError>;

    /// Feedback for a job, newest first.
    async fn feedback_for_job(&self, job_id: Uuid) -> Result<Vec<Feedback>, AppError>;
}

pub(crate) fn duplicate_feedback(feedback: &NewFeedback) -> AppError {
    AppError::Conflict(format!(
        "Feedback from persona {} for job {} already exists",
        feedback.persona_id, feedback.job_id
    ))
}
