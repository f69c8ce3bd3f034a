//! Health check handlers.
//!
//! - `/health`: Liveness - returns OK if the process is running
//! - `/ready`: Readiness - pings the store

use crate::models::{HealthResponse, ReadinessResponse};
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies; failure means the process is hung.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy",
    })
}

/// Readiness probe handler.
///
/// Returns 200 if the store answers a ping, 503 otherwise. The store error
/// is logged server-side and never returned.
#[tracing::instrument(skip_all, name = "casting.health.readiness")]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                success: true,
                status: "ready",
                database: "healthy",
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "casting.health", error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    success: false,
                    status: "not_ready",
                    database: "unhealthy",
                }),
            )
        }
    }
}
