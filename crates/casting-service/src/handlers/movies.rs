//! Movie handlers.
//!
//! - `GET /movies` - List movies (`get:movies`)
//! - `GET /movies/{id}` - Fetch one movie (`get:movie`)
//! - `POST /movies` - Create a movie (`post:movies`)
//! - `PATCH /movies/{id}` - Update a movie (`patch:movies`)
//! - `DELETE /movies/{id}` - Delete a movie (`delete:movies`)

use super::{json_body, record_id};
use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::{
    DeletedResponse, MovieChanges, MovieCreatedResponse, MovieListResponse, MovieResponse,
    NewMovie,
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

/// Handler for GET /movies
#[instrument(skip_all, name = "casting.handlers.list_movies")]
pub async fn list_movies(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let movies = state.store.list_movies().await?;

    Ok(Json(MovieListResponse {
        success: true,
        movies,
    }))
}

/// Handler for GET /movies/{id}
#[instrument(skip_all, name = "casting.handlers.get_movie")]
pub async fn get_movie(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let id = record_id(path)?;
    let movie = state.store.get_movie(id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

/// Handler for POST /movies
///
/// `release_date` must be `YYYY-MM-DD`.
#[instrument(skip_all, name = "casting.handlers.create_movie")]
pub async fn create_movie(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MovieCreatedResponse>), ApiError> {
    let new_movie = NewMovie::from_json(&json_body(body)?)?;
    let movie = state.store.insert_movie(new_movie).await?;

    tracing::info!(target: "casting.handlers.movies", movie_id = movie.id, "Movie created");

    Ok((
        StatusCode::CREATED,
        Json(MovieCreatedResponse {
            success: true,
            created: movie.id,
            movie,
        }),
    ))
}

/// Handler for PATCH /movies/{id}
#[instrument(skip_all, name = "casting.handlers.update_movie")]
pub async fn update_movie(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let id = record_id(path)?;
    if state.store.get_movie(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let changes = MovieChanges::from_json(&json_body(body)?)?;
    let movie = state
        .store
        .update_movie(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(target: "casting.handlers.movies", movie_id = id, "Movie updated");

    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

/// Handler for DELETE /movies/{id}
#[instrument(skip_all, name = "casting.handlers.delete_movie")]
pub async fn delete_movie(
    Extension(_claims): Extension<Claims>,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = record_id(path)?;
    if !state.store.delete_movie(id).await? {
        return Err(ApiError::NotFound);
    }

    tracing::info!(target: "casting.handlers.movies", movie_id = id, "Movie deleted");

    Ok(Json(DeletedResponse {
        success: true,
        deleted: id,
    }))
}
