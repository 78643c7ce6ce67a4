use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;
use crate::survey::validation::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Clients receive a short plain-text message; store failures are logged in full.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON payload: {0}")]
    MalformedPayload(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Failed to store survey response: {0}")]
    Store(StoreError),

    #[error("Failed to export survey responses: {0}")]
    Export(StoreError),

    #[error("Not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::MalformedPayload(reason) => {
                tracing::debug!("Rejected malformed payload: {reason}");
                (StatusCode::BAD_REQUEST, "Invalid JSON payload".to_string())
            }
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
            }
            AppError::Store(e) => {
                tracing::error!("Failed to store survey response: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to save survey response at this time.".to_string(),
                )
            }
            AppError::Export(e) => {
                tracing::error!("Failed to serve CSV export: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to provide CSV export at this time.".to_string(),
                )
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;

    async fn render(error: AppError) -> (StatusCode, String, String) {
        let response = error.into_response();
        let status = response.status();
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_are_plain_text_400() {
        let (status, content_type, body) =
            render(ValidationError::MissingField("email").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body, "Field \"email\" is required.");
    }

    #[tokio::test]
    async fn test_malformed_payload_hides_parser_detail() {
        let (status, _, body) =
            render(AppError::MalformedPayload("expected value at line 1".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Invalid JSON payload");
    }

    #[tokio::test]
    async fn test_store_failures_are_500_without_detail() {
        let io = || StoreError::Io(std::io::Error::other("disk full"));

        let (status, _, body) = render(AppError::Store(io())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Unable to save survey response at this time.");

        let (status, _, body) = render(AppError::Export(io())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Unable to provide CSV export at this time.");
    }

    #[tokio::test]
    async fn test_payload_too_large_is_413() {
        let (status, _, body) = render(AppError::PayloadTooLarge).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, "Payload too large");
    }
}
