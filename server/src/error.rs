use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid prompt audio: {0}")]
    PromptError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(#[from] anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Fatal startup failures. Any of these aborts the process before the
/// listener accepts traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load speech model from {dir}: {source}")]
    ModelLoad {
        dir: String,
        #[source]
        source: voice_core::ModelLoadError,
    },

    #[error("failed to load default prompt {path}: {source}")]
    PromptLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PromptError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::SynthesisError(e) => {
                tracing::error!("Synthesis error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Synthesis error: {e}"),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
