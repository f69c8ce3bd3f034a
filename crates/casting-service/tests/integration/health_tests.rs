//! Operational endpoint tests: health probes, metrics, fallback routes,
//! CORS and store failures.

use casting_test_utils::{TestCastingServer, ALL_PERMISSIONS};
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Liveness / Readiness
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "status": "healthy"}));

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_tracks_store() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let ready = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(ready.status(), StatusCode::OK);
    let body: Value = ready.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "healthy");

    server.store().set_unavailable(true);

    let not_ready = reqwest::get(format!("{}/ready", server.url())).await?;
    assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = not_ready.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["database"], "unhealthy");

    Ok(())
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    reqwest::get(format!("{}/health", server.url())).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(
        body.contains("casting_http_requests_total"),
        "metrics output should include HTTP request counter"
    );

    Ok(())
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_unknown_route_is_json_404() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = reqwest::get(format!("{}/directors", server.url())).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"success": false, "error": 404, "message": "Resource not found."})
    );

    Ok(())
}

#[tokio::test]
async fn test_unsupported_method_is_json_405() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let client = reqwest::Client::new();
    let token = server.token_with_permissions(&ALL_PERMISSIONS);

    for (method, path) in [
        (reqwest::Method::PUT, "/actors/1"),
        (reqwest::Method::DELETE, "/actors"),
        (reqwest::Method::PUT, "/movies"),
        (reqwest::Method::POST, "/movies/1"),
    ] {
        let response = client
            .request(method.clone(), format!("{}{}", server.url(), path))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {path}"
        );
        let body: Value = response.json().await?;
        assert_eq!(
            body,
            json!({"success": false, "error": 405, "message": "Method not allowed."})
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_store_failure_is_generic_500() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    server.store().set_unavailable(true);

    let response = reqwest::Client::new()
        .get(format!("{}/actors", server.url()))
        .bearer_auth(server.token_with_permissions(&ALL_PERMISSIONS))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"success": false, "error": 500, "message": "Internal server error."})
    );

    Ok(())
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_cors_preflight_skips_auth() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/actors", server.url()))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    Ok(())
}
