//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use dmn_sdk::EvaluationRequest;
use tracing::{info, info_span};
use uuid::Uuid;

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Evaluation endpoint
///
/// Always answers `200` with the evaluation envelope; only an unreadable
/// body or a failed worker task produce an error status.
#[axum::debug_handler]
pub(super) async fn evaluate(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<EvaluationRequest>,
) -> Result<Response, ServerError> {
    let request_id = Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        "Received evaluation request with {} inputs",
        payload.input_count()
    );

    // Parsing and evaluating a document is CPU-bound
    let handler = state.handler.clone();
    let span = info_span!("evaluate", request_id = %request_id);
    let response = tokio::task::spawn_blocking(move || span.in_scope(|| handler.handle(&payload))).await?;

    info!(
        request_id = %request_id,
        "Evaluation finished, success={}",
        response.success
    );

    Ok(([(REQUEST_ID_HEADER, request_id)], Json(response)).into_response())
}
