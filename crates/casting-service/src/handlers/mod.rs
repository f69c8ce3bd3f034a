//! HTTP request handlers for the Casting Service.
//!
//! Resource handlers receive the verified [`Claims`](crate::auth::Claims)
//! as their first argument; the authorization gate has already run.

pub mod actors;
pub mod health;
pub mod metrics;
pub mod movies;

pub use actors::{create_actor, delete_actor, get_actor, list_actors, update_actor};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use movies::{create_movie, delete_movie, get_movie, list_movies, update_movie};

use crate::errors::ApiError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use serde_json::Value;

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Fallback for a known path hit with a method it does not serve.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// A path id that is not an integer means no such record.
fn record_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

/// Malformed JSON or a missing JSON content type is a bad request.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
