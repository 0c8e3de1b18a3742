//! Custom extractors
//!
//! Provides a JSON extractor whose rejections use the server error body.

use crate::error::ServerError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};

/// Custom JSON extractor with better error messages
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection.body_text());
                Err(match rejection {
                    JsonRejection::JsonDataError(err) => {
                        ServerError::InvalidRequest(format!("Invalid JSON data: {}", err.body_text()))
                    }
                    JsonRejection::JsonSyntaxError(err) => {
                        ServerError::InvalidRequest(format!("JSON syntax error: {}", err.body_text()))
                    }
                    JsonRejection::MissingJsonContentType(_) => ServerError::InvalidRequest(
                        "Missing 'Content-Type: application/json' header".to_string(),
                    ),
                    other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        ServerError::PayloadTooLarge(other.body_text())
                    }
                    other => ServerError::InvalidRequest(format!("Failed to parse JSON: {}", other.body_text())),
                })
            }
        }
    }
}
