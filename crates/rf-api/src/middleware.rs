//! rusty-forum/crates/rf-api/src/middleware.rs Middleware
//!
//! Cross-cutting layers for security headers, tracing and CORS.

use std::time::Duration;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        HeaderValue, Method, Request,
    },
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};
use tracing::Span;

/// Allows browser front-ends on other origins to call the API with a token.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}

/// `X-Content-Type-Options: nosniff` on every response.
pub fn nosniff() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"))
}

/// Per-request span carrying the request id set by `SetRequestIdLayer`.
/// `user_id` is filled in once the caller is authenticated.
pub fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
        user_id = tracing::field::Empty,
    )
}
