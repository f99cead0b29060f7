use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::persona::{NewPersona, Persona};
use crate::personas::filter::PersonaFilter;
use crate::routes::parse_id;
use crate::state::AppState;

/// POST /personas
pub async fn handle_create_persona(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Persona>), AppError> {
    let Json(body) = payload?;
    let persona = NewPersona::from_json(&body)?;
    let stored = state.store.insert_persona(persona).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /personas/batch
///
/// Every element is validated before anything is written.
pub async fn handle_create_personas(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Persona>>), AppError> {
    let Json(body) = payload?;
    let items = body
        .as_array()
        .ok_or_else(|| AppError::Validation("expected an array of personas".to_string()))?;

    let personas = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            NewPersona::from_json(item)
                .map_err(|e| AppError::Validation(format!("personas[{i}]: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let stored = state.store.insert_personas(personas).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /personas/:id
pub async fn handle_get_persona(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Persona>, AppError> {
    let id = parse_id(&id, "Persona")?;
    let persona = state
        .store
        .get_persona(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Persona not found".to_string()))?;
    Ok(Json(persona))
}

/// GET /personas
///
/// Query parameters filter by field equality. No pagination. A parameter
/// that names no persona field yields an empty list.
pub async fn handle_list_personas(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Persona>>, AppError> {
    let filter = PersonaFilter::from_query(&params);
    Ok(Json(state.store.find_personas(&filter).await?))
}
