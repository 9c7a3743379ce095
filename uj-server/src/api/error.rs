//! HTTP error responses
//!
//! Every failure leaves the server as a JSON body with an `error` message.
//! Persistence failures carry only a generic "Failed to ..." message; the
//! cause is logged, not returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uj_common::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed form validation (422)
    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Path id is not a UUID (400)
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Body could not be parsed (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unknown page (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation failed server-side (500)
    #[error("{0}")]
    Failed(String),
}

impl ApiError {
    /// Log `cause` and wrap it as "Failed to {action} {resource}"
    pub fn failed(action: &str, resource: &str, cause: impl std::fmt::Display) -> Self {
        error!("Failed to {} {}: {}", action, resource, cause);
        ApiError::Failed(format!("Failed to {} {}", action, resource))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "fields": fields }),
            ),
            ApiError::InvalidId(_) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Failed(_) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message })),
        };

        (status, Json(body)).into_response()
    }
}
