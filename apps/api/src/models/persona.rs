use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::schema::{FieldKind, FieldSpec, Schema, SchemaError};

pub const PERSONA_SCHEMA: Schema = Schema {
    name: "Persona",
    fields: &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::optional("age", FieldKind::Number),
        FieldSpec::optional("gender", FieldKind::Text),
        FieldSpec::optional("occupation", FieldKind::Text),
        FieldSpec::optional("bio", FieldKind::Text),
    ],
};

/// A stored synthetic user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: Uuid,
    pub name: String,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persona fields as accepted on create, after schema validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPersona {
    pub name: String,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
}

impl NewPersona {
    /// Validates an untyped request document against `PERSONA_SCHEMA`.
    pub fn from_json(doc: &Value) -> Result<Self, SchemaError> {
        let normalized = PERSONA_SCHEMA.validate(doc)?;
        // Normalized output always matches the struct's shape.
        serde_json::from_value(Value::Object(normalized)).map_err(|_| SchemaError::NotAnObject)
    }

    /// Builds the stored record with a fresh identifier.
    pub fn into_persona(self, now: DateTime<Utc>) -> Persona {
        Persona {
            id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            gender: self.gender,
            occupation: self.occupation,
            bio: self.bio,
            created_at: now,
            updated_at: now,
        }
    }
}
