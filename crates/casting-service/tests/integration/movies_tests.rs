//! Movie endpoint tests.

use casting_service::repositories::{seed_initial_data, CastingStore};
use casting_test_utils::TestCastingServer;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_list_seeded_movies() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    seed_initial_data(server.store().as_ref()).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/movies", server.url()))
        .bearer_auth(server.token_with_permissions(&["get:movies"]))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(
        body["movies"],
        json!([
            {"id": 1, "title": "movie1", "release_date": "2010-07-16"},
            {"id": 2, "title": "movie2", "release_date": "1999-03-31"},
            {"id": 3, "title": "movie3", "release_date": "2014-11-07"}
        ])
    );

    Ok(())
}

#[tokio::test]
async fn test_get_movie() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    seed_initial_data(server.store().as_ref()).await?;
    let client = reqwest::Client::new();
    let token = server.token_with_permissions(&["get:movie"]);

    let response = client
        .get(format!("{}/movies/2", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["movie"]["title"], "movie2");

    let missing = client
        .get(format!("{}/movies/99", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_create_movie() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/movies", server.url()))
        .bearer_auth(server.token_with_permissions(&["post:movies"]))
        .json(&json!({"title": "movie4", "release_date": "2021-02-28"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["created"], 1);
    assert_eq!(
        body["movie"],
        json!({"id": 1, "title": "movie4", "release_date": "2021-02-28"})
    );

    Ok(())
}

#[tokio::test]
async fn test_create_movie_validation() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    let client = reqwest::Client::new();
    let token = server.token_with_permissions(&["post:movies"]);

    for (body, status) in [
        (json!({"title": "movie4"}), StatusCode::BAD_REQUEST),
        (
            json!({"title": "", "release_date": "2021-02-28"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({"title": "movie4", "release_date": "28/02/2021"}),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({"title": "movie4", "release_date": "2021-02-30"}),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    ] {
        let response = client
            .post(format!("{}/movies", server.url()))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), status, "body: {body}");
    }

    assert!(server.store().list_movies().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_update_movie() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    seed_initial_data(server.store().as_ref()).await?;

    let response = reqwest::Client::new()
        .patch(format!("{}/movies/1", server.url()))
        .bearer_auth(server.token_with_permissions(&["patch:movies"]))
        .json(&json!({"title": "movie1 (director's cut)"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(
        body["movie"],
        json!({"id": 1, "title": "movie1 (director's cut)", "release_date": "2010-07-16"})
    );

    Ok(())
}

#[tokio::test]
async fn test_update_movie_errors() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    seed_initial_data(server.store().as_ref()).await?;
    let client = reqwest::Client::new();
    let token = server.token_with_permissions(&["patch:movies"]);

    let unknown = client
        .patch(format!("{}/movies/77", server.url()))
        .bearer_auth(&token)
        .json(&json!({"title": "x"}))
        .send()
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let bad_date = client
        .patch(format!("{}/movies/1", server.url()))
        .bearer_auth(&token)
        .json(&json!({"release_date": "yesterday"}))
        .send()
        .await?;
    assert_eq!(bad_date.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let not_object = client
        .patch(format!("{}/movies/1", server.url()))
        .bearer_auth(&token)
        .json(&json!("movie1"))
        .send()
        .await?;
    assert_eq!(not_object.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_delete_movie() -> Result<(), anyhow::Error> {
    let server = TestCastingServer::spawn().await?;
    seed_initial_data(server.store().as_ref()).await?;
    let client = reqwest::Client::new();
    let token = server.token_with_permissions(&["delete:movies"]);

    let response = client
        .delete(format!("{}/movies/3", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": true, "deleted": 3}));
    assert_eq!(server.store().list_movies().await?.len(), 2);

    let unknown = client
        .delete(format!("{}/movies/3", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    Ok(())
}
