mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_and_show_a_post() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;

    let (status, body) = app
        .post_json("/api/posts", &ana, json!({ "title": "Hello forum", "content": "First!" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post created successfully.");
    assert_eq!(body["post"]["title"], "Hello forum");
    assert_eq!(body["post"]["countVotes"], 0);
    assert_eq!(body["post"]["author"], json!({ "id": ana.author.id, "name": "Ana" }));

    let id = body["post"]["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/posts/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["id"], id);
    assert_eq!(body["post"]["comments"], json!([]));
    assert!(body["post"]["createdAt"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn creating_requires_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/posts",
            None,
            Some(json!({ "title": "Hello", "content": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Unauthenticated." }));
}

#[tokio::test]
async fn unknown_tokens_are_rejected() {
    let app = TestApp::new().await;
    let mut ghost = app.user("Ghost").await;
    ghost.token = "not-a-real-token".into();

    let (status, _) = app
        .post_json("/api/posts", &ghost, json!({ "title": "Hello", "content": "x" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_post_payload_lists_field_errors() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;

    let (status, body) = app.post_json("/api/posts", &ana, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({
            "message": "The title field is required. (and 1 more error)",
            "errors": {
                "content": ["The content field is required."],
                "title": ["The title field is required."]
            }
        })
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/posts")
        .header("authorization", format!("Bearer {}", ana.token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_post_is_a_404_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/posts/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "status": "error", "error": "Register #999 not found." }));
}

#[tokio::test]
async fn listing_is_paginated_newest_first() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;
    let first = app.create_post(&ana, "First post").await;
    let second = app.create_post(&ana, "Second post").await;
    let third = app.create_post(&ana, "Third post").await;

    let (status, body) = app.get("/api/posts").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![third, second]);

    let (_, body) = app.get("/api/posts?page=2").await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["id"], first);

    let (_, body) = app.get("/api/posts?page=junk").await;
    assert_eq!(body["posts"][0]["id"], third);
}

#[tokio::test]
async fn only_the_author_may_delete_a_post() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;
    let bob = app.user("Bob").await;
    let id = app.create_post(&ana, "Ana's post").await;

    let (status, body) = app.delete(&format!("/api/posts/{id}"), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "This action is unauthorized." }));

    let (status, body) = app.delete(&format!("/api/posts/{id}"), &ana).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Post #{id} deleted successfully."));

    let (status, _) = app.delete(&format!("/api/posts/{id}"), &ana).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id_and_nosniff() {
    let app = TestApp::new().await;

    let request = axum::http::Request::builder()
        .uri("/api/posts")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn unknown_routes_are_json_404s() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not Found." }));

    let (status, _) = app.get("/api/posts/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_methods_are_json_405s() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::PUT, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "message": "Method Not Allowed." }));

    let (status, body) = app.send(Method::GET, "/api/votes", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "message": "Method Not Allowed." }));
}
