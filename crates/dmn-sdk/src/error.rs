//! Handler error types

use dmn_core::EngineError;
use std::fmt;
use thiserror::Error;

/// Request rejected before the engine is reached
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Decision document missing or blank
    #[error("DMN XML is required.")]
    MissingDocument,

    /// Decision name missing or blank
    #[error("Decision Name is required.")]
    MissingDecisionName,
}

/// Step of the engine sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Parse,
    Compile,
    CreateContext,
    BindInput,
    Execute,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnginePhase::Parse => "parse",
            EnginePhase::Compile => "compile",
            EnginePhase::CreateContext => "create context",
            EnginePhase::BindInput => "bind input",
            EnginePhase::Execute => "execute",
        };
        write!(f, "{}", name)
    }
}

/// Handler error type
///
/// Displays exactly the message reported in the failure envelope: the
/// validation message, or the engine's own message without a phase prefix.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Engine error raised during `phase`
    #[error("{source}")]
    Engine {
        phase: EnginePhase,
        source: EngineError,
    },

    /// Engine implementation panicked
    #[error("Decision engine panicked: {0}")]
    Panic(String),
}

impl HandlerError {
    /// Tag engine errors with the phase they were raised in
    pub(crate) fn engine(phase: EnginePhase) -> impl FnOnce(EngineError) -> HandlerError {
        move |source| HandlerError::Engine { phase, source }
    }

    /// Phase of an engine error
    pub fn phase(&self) -> Option<EnginePhase> {
        match self {
            HandlerError::Engine { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, HandlerError::Validation(_))
    }
}

/// Result type for handler operations
pub type Result<T> = std::result::Result<T, HandlerError>;
