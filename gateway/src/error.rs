//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dispatcher::DispatchError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Task '{0}' already exists")]
    DuplicateTask(String),

    #[error("Job queue is full, retry later")]
    QueueFull,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnsupportedModel(model) => ApiError::UnsupportedModel(model),
            DispatchError::DuplicateTask(id) => ApiError::DuplicateTask(id),
            DispatchError::QueueFull => ApiError::QueueFull,
            DispatchError::QueueClosed => ApiError::Internal("Job queue is shut down".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::UnsupportedModel(_) => (StatusCode::BAD_REQUEST, "unsupported_model"),
            ApiError::DuplicateTask(_) => (StatusCode::CONFLICT, "duplicate_task"),
            ApiError::QueueFull => (StatusCode::SERVICE_UNAVAILABLE, "queue_full"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
