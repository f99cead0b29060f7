//! Schema descriptions checked at the model boundary.
//!
//! A `Schema` lists the fields a document may carry, their kind and whether
//! they are required. `Schema::validate` takes an untyped JSON document and
//! returns a normalized object holding only the declared fields, with
//! castable scalars converted to the declared kind. Typed models are then
//! deserialized from that object.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} must be one of [{allowed}], got '{value}'")]
    NotAllowed {
        field: &'static str,
        allowed: String,
        value: String,
    },

    #[error("{schema} validation failed: {source}")]
    Invalid {
        schema: &'static str,
        #[source]
        source: Box<SchemaError>,
    },
}

impl Schema {
    /// Checks `doc` against the schema and returns the normalized object.
    pub fn validate(&self, doc: &Value) -> Result<Map<String, Value>, SchemaError> {
        self.validate_inner(doc).map_err(|e| SchemaError::Invalid {
            schema: self.name,
            source: Box::new(e),
        })
    }

    fn validate_inner(&self, doc: &Value) -> Result<Map<String, Value>, SchemaError> {
        let obj = doc.as_object().ok_or(SchemaError::NotAnObject)?;
        let mut out = Map::new();

        for spec in self.fields {
            match obj.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(SchemaError::Required { field: spec.name });
                    }
                }
                Some(value) => match cast_field(spec, value)? {
                    Some(cast) => {
                        out.insert(spec.name.to_string(), cast);
                    }
                    None if spec.required => {
                        return Err(SchemaError::Required { field: spec.name });
                    }
                    None => {}
                },
            }
        }

        Ok(out)
    }
}

/// Casts a present, non-null value to the field's kind. `Ok(None)` means the
/// value counts as absent (an empty string for a number).
fn cast_field(spec: &FieldSpec, value: &Value) -> Result<Option<Value>, SchemaError> {
    match spec.kind {
        FieldKind::Text => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => number_text(n),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(SchemaError::WrongType {
                        field: spec.name,
                        expected: "text",
                    })
                }
            };
            if spec.required && text.is_empty() {
                return Err(SchemaError::Required { field: spec.name });
            }
            Ok(Some(Value::String(text)))
        }
        FieldKind::Number => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if s.trim().is_empty() => return Ok(None),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
                _ => None,
            };
            number
                .and_then(serde_json::Number::from_f64)
                .map(|n| Some(Value::Number(n)))
                .ok_or(SchemaError::WrongType {
                    field: spec.name,
                    expected: "a number",
                })
        }
        FieldKind::OneOf(allowed) => {
            let s = value.as_str().ok_or(SchemaError::WrongType {
                field: spec.name,
                expected: "a string",
            })?;
            if allowed.contains(&s) {
                Ok(Some(Value::String(s.to_string())))
            } else {
                Err(SchemaError::NotAllowed {
                    field: spec.name,
                    allowed: allowed.join(", "),
                    value: s.to_string(),
                })
            }
        }
    }
}

/// Integral numbers render without a fractional part (`1.0` becomes `"1"`).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => format!("{f}"),
        _ => n.to_string(),
    }
}
