//! DMN Gateway Core - Shared types for the DMN gateway
//!
//! This crate provides the fundamental types used across the gateway:
//! - `Value`, the closed set of primitive values handed to a decision engine
//! - Value coercion from loosely-typed JSON input
//! - The engine contract (parse, compile, execute) and its result shape
//! - Error types

pub mod coercion;
pub mod engine;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use coercion::{coerce, Coerce};
pub use engine::{DecisionEngine, DecisionResult, ExecutionContext, OutputVariable, ResultSet};
pub use error::EngineError;
pub use types::Value;
