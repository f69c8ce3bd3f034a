//! Authorization gate tests over HTTP.
//!
//! Covers header extraction, token verification and permission enforcement
//! as a client sees them: status code, uniform error body and the
//! `WWW-Authenticate` challenge on 401s.

use casting_test_utils::{
    TestCastingServer, TestKeypair, TestTokenBuilder, ALL_PERMISSIONS, READ_ONLY_PERMISSIONS,
};
use jsonwebtoken::Algorithm;
use reqwest::{Method, StatusCode};
use serde_json::json;

/// Send `method path` with a raw `Authorization` header (or none).
async fn send(
    server: &TestCastingServer,
    method: Method,
    path: &str,
    authorization: Option<&str>,
) -> Result<reqwest::Response, anyhow::Error> {
    let mut request = reqwest::Client::new().request(method, format!("{}{}", server.url(), path));
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    Ok(request.send().await?)
}

async fn assert_error(
    response: reqwest::Response,
    status: StatusCode,
    message: &str,
) -> Result<(), anyhow::Error> {
    assert_eq!(response.status(), status);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], status.as_u16());
    assert_eq!(body["message"], message);
    Ok(())
}

// ============================================================================
// Header extraction
// ============================================================================

#[tokio::test]
async fn test_missing_header_is_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = send(&server, Method::GET, "/actors", None).await?;

    let challenge = response
        .headers()
        .get("www-authenticate")
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .unwrap_or_default();
    assert!(challenge.starts_with("Bearer"));
    assert!(challenge.contains("authorization_header_missing"));
    assert_error(
        response,
        StatusCode::UNAUTHORIZED,
        "Authorization header is expected.",
    )
    .await?;

    // Rejected before any key lookup
    assert_eq!(server.jwks_fetch_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_malformed_headers_are_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    for (header, message) in [
        (
            "Basic abc123",
            "Authorization header must have a Bearer at the start.",
        ),
        ("Bearer", "Token not found in authorization header."),
        (
            "Bearer abc 123",
            "Authorization header must just have a Bearer and a token.",
        ),
    ] {
        let response = send(&server, Method::GET, "/actors", Some(header)).await?;
        assert_error(response, StatusCode::UNAUTHORIZED, message).await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_lowercase_scheme_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = server.token_with_permissions(&["get:actors"]);

    let response = send(
        &server,
        Method::GET,
        "/actors",
        Some(&format!("bearer {token}")),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

// ============================================================================
// Token verification
// ============================================================================

#[tokio::test]
async fn test_token_without_kid_is_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = TestKeypair::primary()
        .sign_without_kid(&TestTokenBuilder::new().with_permissions(&ALL_PERMISSIONS).build());

    let response = send(
        &server,
        Method::GET,
        "/actors",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_error(response, StatusCode::UNAUTHORIZED, "Authorization malformed.").await
}

#[tokio::test]
async fn test_garbage_token_is_400() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = send(&server, Method::GET, "/actors", Some("Bearer not-a-jwt")).await?;

    assert_error(
        response,
        StatusCode::BAD_REQUEST,
        "Unable to parse authentication token.",
    )
    .await
}

#[tokio::test]
async fn test_algorithm_confusion_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let claims = TestTokenBuilder::new()
        .with_permissions(&ALL_PERMISSIONS)
        .build();
    let keypair = TestKeypair::primary();

    for token in [
        keypair.sign_hs256_confusion(&claims),
        keypair.sign_with_algorithm(Algorithm::RS512, &claims),
        keypair.unsigned_token(&claims),
    ] {
        let response = send(
            &server,
            Method::GET,
            "/actors",
            Some(&format!("Bearer {token}")),
        )
        .await?;

        assert_error(
            response,
            StatusCode::BAD_REQUEST,
            "Unable to parse authentication token.",
        )
        .await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_token_signed_by_other_key_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    // Secondary key material under the kid the issuer publishes
    let token = TestKeypair::secondary()
        .with_kid(TestKeypair::primary().kid())
        .sign(&TestTokenBuilder::new().with_permissions(&ALL_PERMISSIONS).build());

    let response = send(
        &server,
        Method::GET,
        "/actors",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_error(
        response,
        StatusCode::BAD_REQUEST,
        "Unable to parse authentication token.",
    )
    .await
}

#[tokio::test]
async fn test_expired_token_is_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = TestKeypair::primary().sign(
        &TestTokenBuilder::new()
            .with_permissions(&ALL_PERMISSIONS)
            .expires_in(-60)
            .build(),
    );

    let response = send(
        &server,
        Method::GET,
        "/actors",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_error(response, StatusCode::UNAUTHORIZED, "Token expired.").await
}

#[tokio::test]
async fn test_wrong_audience_or_issuer_is_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let keypair = TestKeypair::primary();

    for claims in [
        TestTokenBuilder::new()
            .with_permissions(&ALL_PERMISSIONS)
            .with_audience("another-api")
            .build(),
        TestTokenBuilder::new()
            .with_permissions(&ALL_PERMISSIONS)
            .with_issuer("https://impostor.auth0.com/")
            .build(),
    ] {
        let response = send(
            &server,
            Method::GET,
            "/actors",
            Some(&format!("Bearer {}", keypair.sign(&claims))),
        )
        .await?;

        assert_error(
            response,
            StatusCode::UNAUTHORIZED,
            "Incorrect claims. Please, check the audience and issuer.",
        )
        .await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_missing_audience_or_issuer_is_401() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let keypair = TestKeypair::primary();

    for claim in ["aud", "iss"] {
        let mut claims = TestTokenBuilder::new()
            .with_permissions(&ALL_PERMISSIONS)
            .build();
        if let Some(map) = claims.as_object_mut() {
            map.remove(claim);
        }

        let response = send(
            &server,
            Method::GET,
            "/actors",
            Some(&format!("Bearer {}", keypair.sign(&claims))),
        )
        .await?;

        assert!(
            response.headers().contains_key("www-authenticate"),
            "missing {claim} should carry a challenge"
        );
        assert_error(
            response,
            StatusCode::UNAUTHORIZED,
            "Incorrect claims. Please, check the audience and issuer.",
        )
        .await?;
    }

    Ok(())
}

#[tokio::test]
async fn test_audience_list_containing_api_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = TestKeypair::primary().sign(
        &TestTokenBuilder::new()
            .with_permissions(&["get:movies"])
            .with_audiences(&["https://casting-test.eu.auth0.com/userinfo", "casting"])
            .build(),
    );

    let response = send(
        &server,
        Method::GET,
        "/movies",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

// ============================================================================
// Permission enforcement
// ============================================================================

#[tokio::test]
async fn test_missing_permissions_claim_is_403() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = TestKeypair::primary().sign(&TestTokenBuilder::new().without_permissions().build());

    let response = send(
        &server,
        Method::GET,
        "/actors",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_error(
        response,
        StatusCode::FORBIDDEN,
        "Permissions not included in JWT.",
    )
    .await
}

#[tokio::test]
async fn test_permission_is_exact_match() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    // get:actors does not grant get:actor, and no prefix or case folding
    let token = server.token_with_permissions(&["get:actors", "GET:actor", "get:*"]);
    let response = send(
        &server,
        Method::GET,
        "/actors/1",
        Some(&format!("Bearer {token}")),
    )
    .await?;

    assert_error(response, StatusCode::FORBIDDEN, "Permission not found in JWT.").await
}

#[tokio::test]
async fn test_read_only_caller_matrix() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = server.token_with_permissions(&READ_ONLY_PERMISSIONS);
    let bearer = format!("Bearer {token}");

    // Seed records so GETs by id succeed
    let client = reqwest::Client::new();
    let admin = format!("Bearer {}", server.token_with_permissions(&ALL_PERMISSIONS));
    client
        .post(format!("{}/actors", server.url()))
        .header("Authorization", &admin)
        .json(&json!({"name": "actor 1", "age": 46, "gender": "Male"}))
        .send()
        .await?;
    client
        .post(format!("{}/movies", server.url()))
        .header("Authorization", &admin)
        .json(&json!({"title": "movie1", "release_date": "2010-07-16"}))
        .send()
        .await?;

    for path in ["/actors", "/actors/1", "/movies", "/movies/1"] {
        let response = send(&server, Method::GET, path, Some(&bearer)).await?;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
    }

    for (method, path) in [
        (Method::POST, "/actors"),
        (Method::PATCH, "/actors/1"),
        (Method::DELETE, "/actors/1"),
        (Method::POST, "/movies"),
        (Method::PATCH, "/movies/1"),
        (Method::DELETE, "/movies/1"),
    ] {
        let response = send(&server, method.clone(), path, Some(&bearer)).await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{method} {path}");
    }

    // Nothing was deleted by the refused calls
    assert_eq!(
        send(&server, Method::GET, "/actors/1", Some(&bearer))
            .await?
            .status(),
        StatusCode::OK
    );

    Ok(())
}

#[tokio::test]
async fn test_gate_runs_before_body_validation() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let client = reqwest::Client::new();
    let body = json!({"name": "new actor", "gender": "Male"});

    let unauthenticated = client
        .post(format!("{}/actors", server.url()))
        .json(&body)
        .send()
        .await?;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let forbidden = client
        .post(format!("{}/actors", server.url()))
        .bearer_auth(server.token_with_permissions(&["get:actors"]))
        .json(&body)
        .send()
        .await?;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let permitted = client
        .post(format!("{}/actors", server.url()))
        .bearer_auth(server.token_with_permissions(&["post:actors"]))
        .json(&body)
        .send()
        .await?;
    assert_eq!(permitted.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_non_integer_id_requires_auth_first() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = send(&server, Method::GET, "/actors/abc", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = server.token_with_permissions(&["get:actor"]);
    let response = send(
        &server,
        Method::GET,
        "/actors/abc",
        Some(&format!("Bearer {token}")),
    )
    .await?;
    assert_error(response, StatusCode::NOT_FOUND, "Resource not found.").await
}
