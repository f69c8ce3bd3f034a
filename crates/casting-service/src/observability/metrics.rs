//! Metrics definitions for the Casting Service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `casting_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: parameterized paths (`/actors/{id}`) or `/other`
//! - `status`: success, error, timeout
//! - `outcome`: allowed or an auth error code
//! - `operation`: bounded by the store methods

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("casting_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Key set fetches are bounded by the fetch timeout (max 60s)
        .set_buckets_for_metric(
            Matcher::Prefix("casting_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("casting_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `casting_http_requests_total`, `casting_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures every response, including auth rejections and framework-level
/// errors (JSON parse failures, unknown routes).
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("casting_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("casting_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces record ids with `{id}`.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/actors" | "/movies" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments
fn normalize_dynamic_endpoint(path: &str) -> String {
    for collection in ["/actors/", "/movies/"] {
        if let Some(id) = path.strip_prefix(collection) {
            if !id.is_empty() && !id.contains('/') {
                return format!("{collection}{{id}}");
            }
        }
    }

    // Unknown paths normalized to "/other" to bound cardinality
    "/other".to_string()
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record an authorization gate decision
///
/// Metric: `casting_auth_decisions_total`
/// Labels: `outcome` ("allowed" or the auth error code), `permission`
pub fn record_auth_decision(outcome: &str, permission: &str) {
    counter!("casting_auth_decisions_total",
        "outcome" => outcome.to_string(),
        "permission" => permission.to_string()
    )
    .increment(1);
}

/// Record a key set fetch from the issuer
///
/// Metric: `casting_jwks_fetch_total`, `casting_jwks_fetch_duration_seconds`
/// Labels: `status` ("success" or "error")
pub fn record_jwks_fetch(status: &str, duration: Duration) {
    histogram!("casting_jwks_fetch_duration_seconds").record(duration.as_secs_f64());

    counter!("casting_jwks_fetch_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record database query execution
///
/// Metric: `casting_db_query_duration_seconds`, `casting_db_query_total`
/// Labels: `operation`, `status`
///
/// Operations: list_actors, get_actor, insert_actor, update_actor,
///             delete_actor (and the movie equivalents), ping
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("casting_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("casting_db_query_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
