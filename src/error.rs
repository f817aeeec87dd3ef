//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::classifier::{ClassifierError, RecordError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Client input errors
    #[error("invalid request body")]
    InvalidBody,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("{0}")]
    ValidationError(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    // Inference errors
    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidBody => (StatusCode::BAD_REQUEST, "invalid request body"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "request body too large"),
            AppError::ValidationError(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidInput(msg) => AppError::ValidationError(msg),
            ClassifierError::Internal(msg) => AppError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidBody.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(ClassifierError::InvalidInput("missing".into())).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ClassifierError::Internal("boom".into())).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::PayloadTooLarge.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = AppError::InternalError("secret stack detail".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["status"], 500);
        assert!(!String::from_utf8_lossy(&bytes).contains("secret"));
    }
}
