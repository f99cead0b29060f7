use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::feedback::{Feedback, NewFeedback};
use crate::models::job::{Job, JobRow, JobStatus};
use crate::models::persona::{NewPersona, Persona};
use crate::personas::filter::PersonaFilter;
use crate::store::{duplicate_feedback, Store};

const PERSONA_COLUMNS: &str =
    "id, name, age, gender, occupation, bio, created_at, updated_at";

const FEEDBACK_COLUMNS: &str = "id, job_id, persona_id, feedback, created_at, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_persona_with<'e, E>(executor: E, persona: NewPersona) -> Result<Persona, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let p = persona.into_persona(Utc::now());
    let stored = sqlx::query_as::<_, Persona>(&format!(
        r#"
        INSERT INTO personas (id, name, age, gender, occupation, bio, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {PERSONA_COLUMNS}
        "#
    ))
    .bind(p.id)
    .bind(&p.name)
    .bind(p.age)
    .bind(&p.gender)
    .bind(&p.occupation)
    .bind(&p.bio)
    .bind(p.created_at)
    .bind(p.updated_at)
    .fetch_one(executor)
    .await?;
    Ok(stored)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_persona(&self, persona: NewPersona) -> Result<Persona, AppError> {
        let stored = insert_persona_with(&self.pool, persona).await?;
        debug!("Inserted persona {}", stored.id);
        Ok(stored)
    }

    async fn insert_personas(&self, personas: Vec<NewPersona>) -> Result<Vec<Persona>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(personas.len());
        for persona in personas {
            stored.push(insert_persona_with(&mut *tx, persona).await?);
        }
        tx.commit().await?;

        info!("Inserted batch of {} personas", stored.len());
        Ok(stored)
    }

    async fn get_persona(&self, id: Uuid) -> Result<Option<Persona>, AppError> {
        Ok(sqlx::query_as::<_, Persona>(&format!(
            "SELECT {PERSONA_COLUMNS} FROM personas WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_personas(&self, filter: &PersonaFilter) -> Result<Vec<Persona>, AppError> {
        if filter.unsatisfiable {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PERSONA_COLUMNS} FROM personas WHERE TRUE"));

        if let Some(id) = filter.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(name) = &filter.name {
            qb.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(age) = filter.age {
            qb.push(" AND age = ").push_bind(age);
        }
        if let Some(gender) = &filter.gender {
            qb.push(" AND gender = ").push_bind(gender.clone());
        }
        if let Some(occupation) = &filter.occupation {
            qb.push(" AND occupation = ").push_bind(occupation.clone());
        }
        if let Some(bio) = &filter.bio {
            qb.push(" AND bio = ").push_bind(bio.clone());
        }
        qb.push(" ORDER BY seq");

        let personas = qb.build_query_as::<Persona>().fetch_all(&self.pool).await?;
        Ok(personas)
    }

    async fn personas_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Persona>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, Persona>(&format!(
            "SELECT {PERSONA_COLUMNS} FROM personas WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_job(&self) -> Result<Job, AppError> {
        let job = Job::new(Utc::now());
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, status, created_at, updated_at
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Job::try_from(row)?)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            "SELECT id, status, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Job::try_from).transpose()?)
    }

    async fn set_job_status(&self, id: Uuid, status: JobStatus) -> Result<Job, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET status = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, status, created_at, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

        Ok(Job::try_from(row)?)
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback, AppError> {
        let conflict = duplicate_feedback(&feedback);
        let fb = feedback.into_feedback(Utc::now());

        let result = sqlx::query_as::<_, Feedback>(&format!(
            r#"
            INSERT INTO feedback (id, job_id, persona_id, feedback, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        ))
        .bind(fb.id)
        .bind(fb.job_id)
        .bind(fb.persona_id)
        .bind(&fb.feedback)
        .bind(fb.created_at)
        .bind(fb.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(conflict),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(
                AppError::NotFound(format!("Job {} or persona {} not found", fb.job_id, fb.persona_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn feedback_for_job(&self, job_id: Uuid) -> Result<Vec<Feedback>, AppError> {
        Ok(sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE job_id = $1 ORDER BY created_at DESC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
