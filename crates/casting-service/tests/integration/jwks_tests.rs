//! Key set fetch tests: caching, rotation and failing closed when the
//! issuer is unreachable.

use casting_test_utils::{TestCastingServer, TestKeypair, TestTokenBuilder, SECONDARY_KID};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::ResponseTemplate;

async fn get_movies(server: &TestCastingServer, token: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .get(format!("{}/movies", server.url()))
        .bearer_auth(token)
        .send()
        .await?)
}

async fn assert_bad_request(response: reqwest::Response, message: &str) -> Result<(), anyhow::Error> {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], 400);
    assert_eq!(body["message"], message);
    Ok(())
}

#[tokio::test]
async fn test_key_set_is_cached() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = server.token_with_permissions(&["get:movies"]);

    for _ in 0..3 {
        assert_eq!(get_movies(&server, &token).await?.status(), StatusCode::OK);
    }

    assert_eq!(server.jwks_fetch_count().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_unknown_kid_is_400() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let token = TestKeypair::primary()
        .with_kid("retired-key")
        .sign(&TestTokenBuilder::new().with_permissions(&["get:movies"]).build());

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to find the appropriate key.").await
}

#[tokio::test]
async fn test_unknown_kid_refetch_is_rate_limited() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let good = server.token_with_permissions(&["get:movies"]);
    let unknown = TestKeypair::primary()
        .with_kid("retired-key")
        .sign(&TestTokenBuilder::new().with_permissions(&["get:movies"]).build());

    assert_eq!(get_movies(&server, &good).await?.status(), StatusCode::OK);
    for _ in 0..5 {
        assert_eq!(
            get_movies(&server, &unknown).await?.status(),
            StatusCode::BAD_REQUEST
        );
    }

    // The cache was just filled, so unknown kids do not hammer the issuer
    assert_eq!(server.jwks_fetch_count().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_non_rsa_key_is_not_usable() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let primary = TestKeypair::primary();
    server
        .set_jwks_response(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [{
                "kty": "EC",
                "kid": primary.kid(),
                "crv": "P-256",
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
                "use": "sig"
            }]
        })))
        .await;
    let token = server.token_with_permissions(&["get:movies"]);

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to find the appropriate key.").await
}

#[tokio::test]
async fn test_key_without_kid_does_not_block_signing_key() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    server
        .set_jwks_response(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [
                {
                    "kty": "EC",
                    "crv": "P-256",
                    "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                    "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
                    "use": "enc"
                },
                TestKeypair::primary().jwk_json()
            ]
        })))
        .await;
    let token = server.token_with_permissions(&["get:movies"]);

    let response = get_movies(&server, &token).await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_issuer_error_fails_closed() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    server
        .set_jwks_response(ResponseTemplate::new(503))
        .await;
    let token = server.token_with_permissions(&["get:movies"]);

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to fetch signing keys.").await
}

#[tokio::test]
async fn test_unparseable_key_set_fails_closed() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    server
        .set_jwks_response(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .await;
    let token = server.token_with_permissions(&["get:movies"]);

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to fetch signing keys.").await
}

#[tokio::test]
async fn test_slow_issuer_times_out() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn_with_vars(HashMap::from([(
        "JWKS_FETCH_TIMEOUT_SECONDS".to_string(),
        "1".to_string(),
    )]))
    .await?;
    server
        .set_jwks_response(
            ResponseTemplate::new(200)
                .set_body_json(casting_test_utils::jwks_document(&[&TestKeypair::primary()]))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
    let token = server.token_with_permissions(&["get:movies"]);

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to fetch signing keys.").await
}

#[tokio::test]
async fn test_key_rotation_after_cache_expiry() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn_with_vars(HashMap::from([(
        "JWKS_CACHE_TTL_SECONDS".to_string(),
        "1".to_string(),
    )]))
    .await?;
    let claims = TestTokenBuilder::new().with_permissions(&["get:movies"]).build();
    let old_token = TestKeypair::primary().sign(&claims);
    let new_token = TestKeypair::secondary().sign(&claims);

    assert_eq!(get_movies(&server, &old_token).await?.status(), StatusCode::OK);

    // Issuer retires the primary key and publishes the secondary
    server.rotate_keys(&[&TestKeypair::secondary()]).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(TestKeypair::secondary().kid(), SECONDARY_KID);
    assert_eq!(get_movies(&server, &new_token).await?.status(), StatusCode::OK);
    assert_eq!(
        get_movies(&server, &old_token).await?.status(),
        StatusCode::BAD_REQUEST
    );

    Ok(())
}

#[tokio::test]
async fn test_expired_cache_is_not_served_when_refresh_fails() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn_with_vars(HashMap::from([(
        "JWKS_CACHE_TTL_SECONDS".to_string(),
        "1".to_string(),
    )]))
    .await?;
    let token = server.token_with_permissions(&["get:movies"]);

    assert_eq!(get_movies(&server, &token).await?.status(), StatusCode::OK);

    server
        .set_jwks_response(ResponseTemplate::new(500))
        .await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = get_movies(&server, &token).await?;

    assert_bad_request(response, "Unable to fetch signing keys.").await
}
