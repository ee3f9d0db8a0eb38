use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::tutor::AiError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Clients see one flat shape, `{"error": "<message>"}`, with no machine code.
/// The internal failure kind is only logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to generate AI {operation}: {source}")]
    Ai {
        operation: &'static str,
        #[source]
        source: AiError,
    },
}

impl AppError {
    pub fn ai(operation: &'static str, source: impl Into<AiError>) -> Self {
        AppError::Ai {
            operation,
            source: source.into(),
        }
    }
}

/// `Json` extractor whose rejection is an `AppError`, so malformed bodies
/// get the same `{"error": ...}` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Ai { operation, source } => {
                tracing::error!(kind = source.kind(), operation = *operation, "AI error: {source}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}
