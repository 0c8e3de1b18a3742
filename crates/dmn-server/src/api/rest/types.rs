//! REST API type definitions

use dmn_engine::DmnEngine;
use dmn_sdk::RequestHandler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response header carrying the id assigned to an evaluation request
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<RequestHandler<DmnEngine>>,
}

impl AppState {
    pub fn new(handler: RequestHandler<DmnEngine>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RequestHandler::new(DmnEngine::new()))
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
