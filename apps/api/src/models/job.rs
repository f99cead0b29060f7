use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::schema::{FieldKind, FieldSpec, Schema};

const STATUS_VALUES: &[&str] = &["pending", "in-progress", "completed"];

/// Shape of the status payload reported by the evaluation service.
pub const JOB_STATUS_SCHEMA: Schema = Schema {
    name: "JobStatus",
    fields: &[FieldSpec::required("status", FieldKind::OneOf(STATUS_VALUES))],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
        }
    }

    /// Whether a reported status may replace this one. Only forward moves
    /// (pending -> in-progress -> completed) are applied.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        next > self
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "in-progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

/// One evaluation run against the external service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(now: DateTime<Utc>) -> Self {
        Job {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = anyhow::Error;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            status: row.status.parse().map_err(anyhow::Error::msg)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
