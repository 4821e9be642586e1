// src/error.rs
// Error taxonomy for the HTTP surface.
//
// Validation ("fix your request") and gateway failures ("upstream is down")
// are distinct variants so callers never have to string-match messages.
// Decode failures never reach here: the parsers are total. Persistence
// failures are demoted to warnings at the orchestrator.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or blank. No upstream call was made.
    #[error("{0}")]
    Validation(String),

    /// The completion service failed (auth, transport, provider error).
    /// Carries the provider's message; never retried.
    #[error("LLM error: {0}")]
    Gateway(String),

    /// Record lookup miss on the log store.
    #[error("not found")]
    NotFound,

    /// Anything else (store/IO plumbing).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Gateway(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "LLM error", "details": details }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Internal(other.into()),
        }
    }
}
