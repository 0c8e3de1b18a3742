//! Error types for the engine contract

use thiserror::Error;

/// Error raised by a decision engine.
///
/// The display form is the engine's own message, unmodified, because the
/// request handler reports it to the caller verbatim.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Error coming from an engine implementation, with its source chain intact
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Plain message without an underlying source
    #[error("{0}")]
    Message(String),
}

impl EngineError {
    /// Wrap any engine-side error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EngineError::Backend(Box::new(err))
    }

    /// Create an error from a message
    pub fn message(msg: impl Into<String>) -> Self {
        EngineError::Message(msg.into())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
