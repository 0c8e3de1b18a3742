//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Server error type
///
/// Evaluation failures never reach this type; they travel inside the
/// response envelope. These are transport-level failures only.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Body could not be read as an evaluation request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Body exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::InvalidRequest(msg)
            | ServerError::PayloadTooLarge(msg)
            | ServerError::InternalError(msg) => msg,
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::InternalError(format!("Evaluation task failed: {}", err))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}
