//! DMN Engine - Built-in decision engine for the DMN gateway
//!
//! Implements the three-call engine contract of `dmn-core`:
//! - `parse`: DMN XML text into a [`model::Definitions`]
//! - `compile`: model into an executable [`definition::CompiledDefinitions`]
//! - `create_context`: a [`context::DmnExecutionContext`] that binds inputs
//!   and executes decision tables and literal expressions

pub mod context;
pub mod definition;
pub mod error;
pub mod feel;
pub mod model;

pub use context::DmnExecutionContext;
pub use definition::CompiledDefinitions;
pub use error::{CompileError, ExecutionError, ParseError};
pub use model::{Definitions, HitPolicy};

use dmn_core::{DecisionEngine, EngineError};
use tracing::debug;

/// Built-in DMN decision engine.
///
/// Stateless: every call works only on its arguments, so one instance can
/// serve any number of concurrent evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmnEngine;

impl DmnEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DecisionEngine for DmnEngine {
    type Model = Definitions;
    type Definition = CompiledDefinitions;
    type Context = DmnExecutionContext;

    fn parse(&self, document: &str) -> Result<Definitions, EngineError> {
        let definitions = model::parse_from_string(document)?;
        debug!(
            "Parsed {} decisions and {} input data",
            definitions.decisions.len(),
            definitions.input_data.len()
        );
        Ok(definitions)
    }

    fn compile(&self, model: Definitions) -> Result<CompiledDefinitions, EngineError> {
        Ok(definition::compile(model)?)
    }

    fn create_context(&self, definition: CompiledDefinitions) -> Result<DmnExecutionContext, EngineError> {
        Ok(DmnExecutionContext::new(definition))
    }
}
