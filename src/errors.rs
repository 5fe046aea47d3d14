use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Spoken by the voice agent when the server itself fails.
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I'm having trouble right now. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no business could be resolved for this call")]
    TenantUnresolved,

    #[error("business not found: {0}")]
    BusinessNotFound(String),

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::TenantUnresolved | AppError::BusinessNotFound(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "Invalid business configuration" }),
            ),
            AppError::InvalidPayload(_) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "invalid webhook payload" }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized" }),
            ),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, apology_body()),
        };

        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
            _ => tracing::warn!(error = %self, "request rejected"),
        }

        (status, axum::Json(body)).into_response()
    }
}

pub fn apology_body() -> serde_json::Value {
    serde_json::json!({ "message": APOLOGY_MESSAGE, "error": "internal_error" })
}
