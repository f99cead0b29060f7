use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::persona::Persona;
use crate::models::schema::{FieldKind, FieldSpec, Schema, SchemaError};

pub const FEEDBACK_SCHEMA: Schema = Schema {
    name: "Feedback",
    fields: &[
        FieldSpec::required("persona", FieldKind::Text),
        FieldSpec::required("feedback", FieldKind::Text),
    ],
};

/// A persona's response to a job. Unique per (job, persona).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    #[serde(rename = "job")]
    pub job_id: Uuid,
    #[serde(rename = "persona")]
    pub persona_id: Uuid,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub job_id: Uuid,
    pub persona_id: Uuid,
    pub feedback: String,
}

impl NewFeedback {
    /// Validates a callback body `{ persona, feedback }` for the given job.
    pub fn from_json(job_id: Uuid, doc: &Value) -> Result<Self, SchemaError> {
        let normalized = FEEDBACK_SCHEMA.validate(doc)?;
        let text = |field: &str| {
            normalized
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let persona_id = text("persona")
            .parse::<Uuid>()
            .map_err(|_| SchemaError::Invalid {
                schema: FEEDBACK_SCHEMA.name,
                source: Box::new(SchemaError::WrongType {
                    field: "persona",
                    expected: "a persona identifier",
                }),
            })?;

        Ok(NewFeedback {
            job_id,
            persona_id,
            feedback: text("feedback"),
        })
    }

    pub fn into_feedback(self, now: DateTime<Utc>) -> Feedback {
        Feedback {
            id: Uuid::new_v4(),
            job_id: self.job_id,
            persona_id: self.persona_id,
            feedback: self.feedback,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Feedback with its persona reference resolved to the full record.
/// `persona` is `None` if the referenced persona no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackWithPersona {
    pub id: Uuid,
    pub job: Uuid,
    pub persona: Option<Persona>,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackWithPersona {
    pub fn new(feedback: Feedback, persona: Option<Persona>) -> Self {
        FeedbackWithPersona {
            id: feedback.id,
            job: feedback.job_id,
            persona,
            feedback: feedback.feedback,
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let job_id = Uuid::new_v4();
        let persona_id = Uuid::new_v4();
        let fb = NewFeedback::from_json(
            job_id,
            &json!({"persona": persona_id.to_string(), "feedback": "Checkout is confusing"}),
        )
        .unwrap();
        assert_eq!(fb.job_id, job_id);
        assert_eq!(fb.persona_id, persona_id);
        assert_eq!(fb.feedback, "Checkout is confusing");
    }

    #[test]
    fn test_from_json_rejects_bad_persona_id() {
        let err = NewFeedback::from_json(
            Uuid::new_v4(),
            &json!({"persona": "nobody", "feedback": "ok"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("persona must be a persona identifier"));
    }

    #[test]
    fn test_from_json_requires_text() {
        let err = NewFeedback::from_json(
            Uuid::new_v4(),
            &json!({"persona": Uuid::new_v4().to_string(), "feedback": ""}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("feedback is required"));
    }

    #[test]
    fn test_serializes_references_by_name() {
        let fb = NewFeedback {
            job_id: Uuid::new_v4(),
            persona_id: Uuid::new_v4(),
            feedback: "fine".into(),
        }
        .into_feedback(Utc::now());
        let value = serde_json::to_value(&fb).unwrap();
        assert_eq!(value["job"], json!(fb.job_id));
        assert_eq!(value["persona"], json!(fb.persona_id));
    }
}
