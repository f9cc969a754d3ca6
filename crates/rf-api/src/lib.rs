//! # rf-api
//!
//! The web routing and orchestration layer for Rusty-Forum.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod requests;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the `/api` router with the standard middleware stack.
///
/// Layers run outermost first: request id, tracing, id propagation, CORS,
/// then security headers.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/{id}", get(handlers::show_post).delete(handlers::delete_post))
        .route("/comments", post(handlers::create_comment))
        .route("/comments/{id}", delete(handlers::delete_comment))
        .route("/comments/recents/{id}", get(handlers::comments_for_post))
        .route("/votes", post(handlers::cast_vote))
        .method_not_allowed_fallback(handlers::method_not_allowed);

    Router::new()
        .nest("/api", api)
        .fallback(handlers::fallback)
        .layer(middleware::nosniff())
        .layer(middleware::cors_policy())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
