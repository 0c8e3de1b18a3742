//! Request/Response types for the request handler

use crate::error::ValidationError;
use dmn_core::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Output variables of the first result set, in engine order
pub type ResultVariables = IndexMap<String, Value>;

/// Evaluation request
///
/// Every field is optional on the wire so that a missing document or name
/// is reported through validation rather than as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// DMN decision-model document (XML text)
    #[serde(default, alias = "decisionDocument")]
    pub dmn_xml: Option<String>,

    /// Name (or id) of the decision to evaluate
    #[serde(default)]
    pub decision_name: Option<String>,

    /// Named inputs, bound in insertion order
    #[serde(default)]
    pub inputs: Option<IndexMap<String, serde_json::Value>>,
}

impl EvaluationRequest {
    /// Create a new evaluation request
    pub fn new(dmn_xml: impl Into<String>, decision_name: impl Into<String>) -> Self {
        Self {
            dmn_xml: Some(dmn_xml.into()),
            decision_name: Some(decision_name.into()),
            inputs: None,
        }
    }

    /// Add an input
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inputs
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all inputs
    pub fn with_inputs(mut self, inputs: IndexMap<String, serde_json::Value>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Number of inputs carried by the request
    pub fn input_count(&self) -> usize {
        self.inputs.as_ref().map(IndexMap::len).unwrap_or(0)
    }

    /// Check the required fields, document first, and borrow them
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        let document = non_blank(&self.dmn_xml).ok_or(ValidationError::MissingDocument)?;
        let decision_name = non_blank(&self.decision_name).ok_or(ValidationError::MissingDecisionName)?;
        Ok((document, decision_name))
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Evaluation response envelope
///
/// `outputs` is present only on success and `error` only on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<ResultVariables>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResponse {
    pub fn success(outputs: ResultVariables) -> Self {
        Self {
            success: true,
            outputs: Some(outputs),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            outputs: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
