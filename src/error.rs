use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::caption::CaptionError;
use crate::extract::ExtractionError;
use crate::pipeline::PipelineError;

/// Handler-boundary error. Every variant renders as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    UpstreamFetch(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::InvalidInput(msg) => AppError::InvalidInput(msg),
            other @ (ExtractionError::UpstreamStatus { .. } | ExtractionError::Request(_)) => {
                AppError::UpstreamFetch(other.to_string())
            }
        }
    }
}

impl From<CaptionError> for AppError {
    fn from(e: CaptionError) -> Self {
        match e {
            CaptionError::InvalidInput(msg) => AppError::InvalidInput(msg),
            CaptionError::Generation(inner) => AppError::Generation(inner.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Extract(inner) => inner.into(),
            PipelineError::Caption(inner) => inner.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into())
            }
            AppError::UpstreamFetch(msg) => {
                tracing::warn!("Upstream fetch failed: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Generation(msg) => {
                tracing::error!("AI generation error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate caption".into(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
