#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rf_api::{router, AppState};
use rf_auth_simple::{hash_token, TokenIdentityProvider};
use rf_core::{Author, ForumService};
use rf_db_sqlite::SqliteForumRepo;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<SqliteForumRepo>,
}

pub struct TestUser {
    pub author: Author,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let repo = Arc::new(SqliteForumRepo::in_memory().await.expect("in-memory database"));
        let forum = ForumService::new(repo.clone(), repo.clone(), repo.clone()).with_per_page(2);
        let identity = Arc::new(TokenIdentityProvider::new(repo.clone()));
        let router = router(AppState::new(forum, identity));
        Self { router, repo }
    }

    pub async fn user(&self, name: &str) -> TestUser {
        let author = self
            .repo
            .create_user(name, &format!("{}@example.com", name.to_lowercase()))
            .await
            .expect("user insert");
        let token = format!("token-{}", name.to_lowercase());
        self.repo
            .store_token_hash(author.id, &hash_token(&token))
            .await
            .expect("token insert");
        TestUser { author, token }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post_json(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(user), None).await
    }

    /// Creates a post through the API and returns its id.
    pub async fn create_post(&self, user: &TestUser, title: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/posts",
                user,
                serde_json::json!({ "title": title, "content": "Some content" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["post"]["id"].as_i64().unwrap()
    }

    pub async fn create_comment(&self, user: &TestUser, post_id: i64, parent_id: Option<i64>) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/comments",
                user,
                serde_json::json!({ "post_id": post_id, "parent_id": parent_id, "content": "A comment" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["comment"]["id"].as_i64().unwrap()
    }
}
