use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::feedback::{Feedback, NewFeedback};
use crate::models::job::{Job, JobStatus};
use crate::models::persona::{NewPersona, Persona};
use crate::personas::filter::PersonaFilter;
use crate::store::{duplicate_feedback, Store};

#[derive(Default)]
struct Collections {
    personas: Vec<Persona>,
    jobs: Vec<Job>,
    feedback: Vec<Feedback>,
}

/// In-memory store for router tests. Vectors keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.inner.read().await.jobs.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_persona(&self, persona: NewPersona) -> Result<Persona, AppError> {
        let stored = persona.into_persona(Utc::now());
        self.inner.write().await.personas.push(stored.clone());
        Ok(stored)
    }

    async fn insert_personas(&self, personas: Vec<NewPersona>) -> Result<Vec<Persona>, AppError> {
        let now = Utc::now();
        let stored: Vec<Persona> = personas.into_iter().map(|p| p.into_persona(now)).collect();
        self.inner
            .write()
            .await
            .personas
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn get_persona(&self, id: Uuid) -> Result<Option<Persona>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.personas.iter().find(|p| p.id == id).cloned())
    }

    async fn find_personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .personas
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn personas_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Persona>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .personas
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_job(&self) -> Result<Job, AppError> {
        let job = Job::new(Utc::now());
        self.inner.write().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn set_job_status(&self, id: Uuid, status: JobStatus) -> Result<Job, AppError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
        job.status = status;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback, AppError> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .feedback
            .iter()
            .any(|f| f.job_id == feedback.job_id && f.persona_id == feedback.persona_id);
        if exists {
            return Err(duplicate_feedback(&feedback));
        }

        // Keep creation times strictly increasing so newest-first ordering is stable.
        let mut now = Utc::now();
        if let Some(last) = inner.feedback.iter().map(|f| f.created_at).max() {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }

        let stored = feedback.into_feedback(now);
        inner.feedback.push(stored.clone());
        Ok(stored)
    }

    async fn feedback_for_job(&self, job_id: Uuid) -> Result<Vec<Feedback>, AppError> {
        let inner = self.inner.read().await;
        let mut found: Vec<Feedback> = inner
            .feedback
            .iter()
            .filter(|f| f.job_id == job_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona(name: &str) -> NewPersona {
        NewPersona {
            name: name.to_string(),
            age: None,
            gender: None,
            occupation: None,
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_feedback_conflicts() {
        let store = MemoryStore::new();
        let job = store.insert_job().await.unwrap();
        let p = store.insert_persona(persona("Ada")).await.unwrap();
        let fb = NewFeedback {
            job_id: job.id,
            persona_id: p.id,
            feedback: "first".into(),
        };

        store.insert_feedback(fb.clone()).await.unwrap();
        let err = store
            .insert_feedback(NewFeedback {
                feedback: "second".into(),
                ..fb
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.feedback_for_job(job.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_newest_first() {
        let store = MemoryStore::new();
        let job = store.insert_job().await.unwrap();
        for name in ["a", "b", "c"] {
            let p = store.insert_persona(persona(name)).await.unwrap();
            store
                .insert_feedback(NewFeedback {
                    job_id: job.id,
                    persona_id: p.id,
                    feedback: name.into(),
                })
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .feedback_for_job(job.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.feedback)
            .collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
    }
}
