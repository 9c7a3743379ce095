//! REST CRUD endpoints, one route set per entity
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | /{entity} | record list, related objects joined |
//! | POST | /{entity} | `{"id": ...}` |
//! | PUT | /{entity}/:id | `{"message": "<Label> updated successfully"}` |
//! | DELETE | /{entity}/:id | `{"message": "<Label> deleted successfully"}` |
//!
//! Bodies are the entity's form: every field as text, validated before any
//! SQL is issued.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use uj_common::{Entity, FormSchema, Gateway, SqliteGateway};
use uuid::Uuid;

use super::{export, ApiError};
use crate::AppState;

/// CRUD and export routes for entity `E`
pub fn entity_routes<E>() -> Router<AppState>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let base = format!("/{}", E::RESOURCE);
    Router::new()
        .route(&base, get(list::<E>).post(create::<E>))
        .route(&format!("{}/export.csv", base), get(export::export_csv::<E>))
        .route(&format!("{}/export.pdf", base), get(export::export_pdf::<E>))
        .route(&format!("{}/:id", base), put(update::<E>).delete(delete::<E>))
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId(raw.to_string()))
}

fn validated<E: Entity>(
    payload: Result<Json<E::Form>, JsonRejection>,
) -> Result<E::Fields, ApiError> {
    let Json(form) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    form.validate().map_err(|errors| {
        debug!("Rejected {} payload: {}", E::LABEL, errors);
        ApiError::Validation(errors)
    })
}

/// GET /{entity}
pub async fn list<E>(State(state): State<AppState>) -> Result<Json<Vec<E>>, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let records = Gateway::<E>::list(&state.gateway)
        .await
        .map_err(|e| ApiError::failed("fetch", E::RESOURCE, e))?;
    Ok(Json(records))
}

/// POST /{entity}
pub async fn create<E>(
    State(state): State<AppState>,
    payload: Result<Json<E::Form>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let fields = validated::<E>(payload)?;
    let id = Gateway::<E>::create(&state.gateway, &fields)
        .await
        .map_err(|e| ApiError::failed("create", E::RESOURCE, e))?;

    info!("Created {} {}", E::LABEL, id);
    Ok(Json(json!({ "id": id })))
}

/// PUT /{entity}/:id
pub async fn update<E>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<E::Form>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    let fields = validated::<E>(payload)?;
    Gateway::<E>::update(&state.gateway, id, &fields)
        .await
        .map_err(|e| ApiError::failed("update", E::RESOURCE, e))?;

    info!("Updated {} {}", E::LABEL, id);
    Ok(Json(json!({ "message": format!("{} updated successfully", E::LABEL) })))
}

/// DELETE /{entity}/:id
pub async fn delete<E>(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    SqliteGateway: Gateway<E>,
{
    let id = parse_id(&raw_id)?;
    Gateway::<E>::delete(&state.gateway, id)
        .await
        .map_err(|e| ApiError::failed("delete", E::RESOURCE, e))?;

    info!("Deleted {} {}", E::LABEL, id);
    Ok(Json(json!({ "message": format!("{} deleted successfully", E::LABEL) })))
}
