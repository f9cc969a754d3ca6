//! HTTP rendering of failures.
//!
//! Every error leaves the API as JSON. Storage details are logged and replaced
//! by a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rf_core::AppError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Malformed payload.")]
    MalformedPayload,

    #[error("Not Found.")]
    RouteNotFound,

    #[error("Method Not Allowed.")]
    MethodNotAllowed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::App(AppError::Validation(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": errors.summary(), "errors": errors }),
            ),
            ApiError::App(err @ AppError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "error", "error": err.to_string() }),
            ),
            ApiError::App(err @ AppError::Forbidden) => {
                (StatusCode::FORBIDDEN, json!({ "message": err.to_string() }))
            }
            ApiError::App(err @ AppError::Unauthenticated) => {
                (StatusCode::UNAUTHORIZED, json!({ "message": err.to_string() }))
            }
            ApiError::App(AppError::Storage(detail)) => {
                tracing::error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Server Error." }),
                )
            }
            err @ ApiError::MalformedPayload => {
                (StatusCode::BAD_REQUEST, json!({ "message": err.to_string() }))
            }
            err @ ApiError::RouteNotFound => {
                (StatusCode::NOT_FOUND, json!({ "message": err.to_string() }))
            }
            err @ ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, json!({ "message": err.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn storage_details_stay_in_the_logs() {
        let (status, body) =
            render(AppError::Storage("disk I/O error at /var/db".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"message":"Server Error."}"#);
    }

    #[tokio::test]
    async fn malformed_payload_is_400() {
        let (status, body) = render(ApiError::MalformedPayload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"message":"Malformed payload."}"#);
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let (status, body) = render(ApiError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, r#"{"message":"Method Not Allowed."}"#);
    }
}
