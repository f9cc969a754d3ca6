//! # rf-api Handlers
//!
//! Thin adapters between HTTP and `ForumService`: extract, validate, call,
//! wrap the result in the response envelope.

use axum::{
    extract::{Query, State},
    Json,
};
use rf_core::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, IdPath, Payload};
use crate::requests::{StoreCommentRequest, StorePostRequest, StoreVoteRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Anything that is not a positive integer falls back to the first page.
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Value>> {
    let posts = state.forum.list_posts(query.page()).await?;
    Ok(Json(json!({ "posts": posts })))
}

pub async fn show_post(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Value>> {
    let post = state.forum.show_post(id).await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(body): Payload<StorePostRequest>,
) -> ApiResult<Json<Value>> {
    let draft = body.validate().map_err(AppError::Validation)?;
    let post = state.forum.create_post(user, draft).await?;
    Ok(Json(json!({ "message": "Post created successfully.", "post": post })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<Value>> {
    state.forum.delete_post(user, id).await?;
    Ok(Json(json!({ "message": format!("Post #{id} deleted successfully.") })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(body): Payload<StoreCommentRequest>,
) -> ApiResult<Json<Value>> {
    let draft = body.validate().map_err(AppError::Validation)?;
    let comment = state.forum.create_comment(user, draft).await?;
    Ok(Json(json!({ "message": "Comment created successfully.", "comment": comment })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<Value>> {
    state.forum.delete_comment(user, id).await?;
    Ok(Json(json!({ "message": format!("Comment #{id} deleted successfully.") })))
}

pub async fn comments_for_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath,
) -> ApiResult<Json<Value>> {
    let comments = state.forum.comment_tree(post_id).await?;
    Ok(Json(json!({ "comments": comments })))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(body): Payload<StoreVoteRequest>,
) -> ApiResult<Json<Value>> {
    let (target, direction) = body.validate().map_err(AppError::Validation)?;
    let receipt = state.forum.cast_vote(user, target, direction).await?;
    Ok(Json(json!({
        "message": receipt.outcome.message(),
        "votableType": receipt.target.kind(),
        "votableId": receipt.target.id(),
        "countVotes": receipt.count_votes,
    })))
}

pub async fn fallback() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
