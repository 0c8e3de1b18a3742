//! DMN Gateway SDK
//!
//! Request handling for decision evaluation: validates a request, coerces
//! its JSON inputs, drives a [`DecisionEngine`] through parse, compile and
//! execute, and folds the outcome into a success/error envelope.

pub mod error;
pub mod handler;
pub mod types;

// Re-export main types
pub use error::{EnginePhase, HandlerError, Result, ValidationError};
pub use handler::RequestHandler;
pub use types::{EvaluationRequest, EvaluationResponse, ResultVariables};

// Re-export commonly used types from dependencies
pub use dmn_core::{DecisionEngine, EngineError, Value};
