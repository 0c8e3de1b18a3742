//! Engine error types

use crate::feel::FeelError;
use dmn_core::EngineError;
use thiserror::Error;

/// Error while reading a DMN document
#[derive(Error, Debug)]
pub enum ParseError {
    /// Malformed XML
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Document root is not a `definitions` element
    #[error("Expected root element 'definitions', found '{0}'")]
    UnexpectedRoot(String),

    /// Missing required attribute
    #[error("Missing mandatory attribute '{attribute}' on element '{element}'")]
    MissingAttribute { element: String, attribute: String },

    /// Missing required child element
    #[error("Missing mandatory element '{child}' in '{parent}'")]
    MissingElement { parent: String, child: String },

    /// Unknown hit policy
    #[error("Invalid hit policy: {0}")]
    InvalidHitPolicy(String),

    /// Unknown aggregation
    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),
}

/// Error while compiling a parsed model into a definition
#[derive(Error, Debug)]
pub enum CompileError {
    /// Expression or unary test failed to parse
    #[error("Invalid expression in {location}: {source}")]
    Expression {
        location: String,
        #[source]
        source: FeelError,
    },

    /// Rule does not match the number of table clauses
    #[error("Rule {rule} of decision '{decision}' has {actual} {kind} entries, expected {expected}")]
    RuleArity {
        decision: String,
        rule: usize,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Two decisions share a name
    #[error("Duplicate decision name: {0}")]
    DuplicateDecision(String),

    /// Decision without a decision table or literal expression
    #[error("Decision '{0}' has no decision logic")]
    MissingLogic(String),

    /// `requiredDecision` points to an unknown decision
    #[error("Decision '{decision}' requires unknown decision '{href}'")]
    UnknownRequirement { decision: String, href: String },

    /// `requiredInput` points to an undeclared input
    #[error("Decision '{decision}' requires unknown input '{href}'")]
    UnknownInput { decision: String, href: String },

    /// Chain of required decisions exceeds the supported depth
    #[error("Decision '{decision}' has more than {limit} levels of required decisions")]
    RequirementsTooDeep { decision: String, limit: usize },

    /// Decisions require each other
    #[error("Cyclic decision requirements involving '{0}'")]
    CyclicRequirement(String),

    /// Output clause needs a name
    #[error("Output {index} of decision '{decision}' has no name")]
    MissingOutputName { decision: String, index: usize },

    /// Aggregation is only defined for a single output
    #[error("Decision '{0}' aggregates multiple outputs")]
    AggregationWithMultipleOutputs(String),
}

/// Error while executing a decision
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// No decision with the requested name
    #[error("Decision '{0}' not found")]
    DecisionNotFound(String),

    /// UNIQUE hit policy with more than one match
    #[error("Hit policy UNIQUE violated in decision '{decision}': {matched} rules matched")]
    UniqueViolation { decision: String, matched: usize },

    /// ANY hit policy with conflicting outputs
    #[error("Hit policy ANY violated in decision '{0}': matched rules have different outputs")]
    AnyViolation(String),

    /// Aggregation over non-numeric outputs
    #[error("Cannot aggregate {aggregation} over non-numeric output '{output}' in decision '{decision}'")]
    NonNumericAggregation {
        decision: String,
        output: String,
        aggregation: &'static str,
    },
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        EngineError::backend(err)
    }
}

impl From<CompileError> for EngineError {
    fn from(err: CompileError) -> Self {
        EngineError::backend(err)
    }
}

impl From<ExecutionError> for EngineError {
    fn from(err: ExecutionError) -> Self {
        EngineError::backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_not_found_message() {
        let err: EngineError = ExecutionError::DecisionNotFound("NoSuchDecision".to_string()).into();
        assert_eq!(err.to_string(), "Decision 'NoSuchDecision' not found");
    }

    #[test]
    fn test_missing_attribute_message() {
        let err = ParseError::MissingAttribute {
            element: "decision".to_string(),
            attribute: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing mandatory attribute 'name' on element 'decision'"
        );
    }

    #[test]
    fn test_compile_error_keeps_source() {
        let err = CompileError::Expression {
            location: "rule 1 of decision 'Decide'".to_string(),
            source: FeelError::syntax("unexpected end of expression", 3, "1 +"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("rule 1 of decision 'Decide'"));
    }
}
