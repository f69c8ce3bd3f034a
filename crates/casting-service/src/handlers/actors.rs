//! Actor handlers.
//!
//! - `GET /actors` - List actors (`get:actors`)
//! - `GET /actors/{id}` - Fetch one actor (`get:actor`)
//! - `POST /actors` - Create an actor (`post:actors`)
//! - `PATCH /actors/{id}` - Update an actor (`patch:actors`)
//! - `DELETE /actors/{id}` - Delete an actor (`delete:actors`)

use super::{json_body, record_id};
use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::{
    ActorChanges, ActorCreatedResponse, ActorListResponse, ActorResponse, DeletedResponse,
    NewActor,
};
use crate::routes::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /actors
#[instrument(skip_all, name = "casting.handlers.list_actors")]
pub async fn list_actors(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActorListResponse>, ApiError> {
    let actors = state.store.list_actors().await?;

    Ok(Json(ActorListResponse {
        success: true,
        actors,
    }))
}

/// Handler for GET /actors/{id}
///
/// # Response
///
/// - 200 OK: `{"success": true, "actor": {...}}`
/// - 404 Not Found: Unknown or non-integer id
#[instrument(skip_all, name = "casting.handlers.get_actor")]
pub async fn get_actor(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let id = record_id(path)?;
    let actor = state.store.get_actor(id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

/// Handler for POST /actors
///
/// # Response
///
/// - 201 Created: `{"success": true, "created": <id>, "actor": {...}}`
/// - 400 Bad Request: Malformed body or a required field missing/empty
/// - 422 Unprocessable Entity: Field present but invalid
#[instrument(skip_all, name = "casting.handlers.create_actor")]
pub async fn create_actor(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ActorCreatedResponse>), ApiError> {
    let new_actor = NewActor::from_json(&json_body(body)?)?;
    let actor = state.store.insert_actor(new_actor).await?;

    tracing::info!(target: "casting.handlers.actors", actor_id = actor.id, "Actor created");

    Ok((
        StatusCode::CREATED,
        Json(ActorCreatedResponse {
            success: true,
            created: actor.id,
            actor,
        }),
    ))
}

/// Handler for PATCH /actors/{id}
///
/// The id is checked before the body, so an unknown id is a 404 even when
/// the body is invalid.
///
/// # Response
///
/// - 200 OK: `{"success": true, "actor": {...}}` with changes applied
/// - 400 Bad Request: Body is not a JSON object
/// - 404 Not Found: Unknown or non-integer id
/// - 422 Unprocessable Entity: A provided field is invalid
#[instrument(skip_all, name = "casting.handlers.update_actor")]
pub async fn update_actor(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let id = record_id(path)?;
    if state.store.get_actor(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let changes = ActorChanges::from_json(&json_body(body)?)?;
    // Deleted between the lookup and the update
    let actor = state
        .store
        .update_actor(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(target: "casting.handlers.actors", actor_id = id, "Actor updated");

    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

/// Handler for DELETE /actors/{id}
#[instrument(skip_all, name = "casting.handlers.delete_actor")]
pub async fn delete_actor(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = record_id(path)?;
    if !state.store.delete_actor(id).await? {
        return Err(ApiError::NotFound);
    }

    tracing::info!(target: "casting.handlers.actors", actor_id = id, "Actor deleted");

    Ok(Json(DeletedResponse {
        success: true,
        deleted: id,
    }))
}
