//! Decision engine contract
//!
//! A decision engine is reached through three calls: parse a document into
//! a model, compile the model into a definition, and create an execution
//! context for the definition. The context accepts input bindings and
//! executes a named decision.

use crate::error::Result;
use crate::types::Value;
use serde::Serialize;

/// Decision engine reached by the request handler
pub trait DecisionEngine: Send + Sync {
    /// Parsed, uncompiled document
    type Model;
    /// Compiled, executable definition
    type Definition;
    /// Per-evaluation input binding
    type Context: ExecutionContext;

    /// Parse decision-model document text into a model
    fn parse(&self, document: &str) -> Result<Self::Model>;

    /// Compile a model into a definition
    fn compile(&self, model: Self::Model) -> Result<Self::Definition>;

    /// Create an execution context bound to a definition
    fn create_context(&self, definition: Self::Definition) -> Result<Self::Context>;
}

/// Mutable binding of inputs to a compiled definition, scoped to one evaluation
pub trait ExecutionContext {
    /// Bind an input parameter; binding the same name twice keeps the last value
    fn bind_input(&mut self, name: &str, value: Value) -> Result<()>;

    /// Execute a decision by name
    fn execute_decision(&mut self, decision_name: &str) -> Result<DecisionResult>;
}

/// Single named output produced by a decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputVariable {
    pub name: String,
    /// Declared type of the output, when the model states one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<String>,
    pub value: Value,
}

impl OutputVariable {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            value,
        }
    }

    pub fn with_type_ref(mut self, type_ref: impl Into<String>) -> Self {
        self.type_ref = Some(type_ref.into());
        self
    }
}

/// Output variables of one satisfied rule (or one aggregation)
pub type ResultSet = Vec<OutputVariable>;

/// Result of executing a decision
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionResult {
    /// Result sets in the order the engine produced them
    pub results: Vec<ResultSet>,
}

impl DecisionResult {
    pub fn new(results: Vec<ResultSet>) -> Self {
        Self { results }
    }

    /// Output variables of the first result set, or nothing when no rule matched
    pub fn first_result_variables(&self) -> &[OutputVariable] {
        self.results.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_result(&self) -> bool {
        !self.results.is_empty()
    }
}
