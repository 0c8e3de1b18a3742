//! Common test utilities for engine integration tests

#![allow(dead_code)]

use dmn_core::{DecisionEngine, DecisionResult, EngineError, ExecutionContext, Value};
use dmn_engine::DmnEngine;

/// Test helper that runs the full parse, compile, bind, execute sequence
pub struct TestEngine {
    document: String,
    inputs: Vec<(String, Value)>,
}

impl TestEngine {
    /// Wrap decisions into a DMN 1.3 `definitions` element
    pub fn with_decisions(body: &str) -> Self {
        Self {
            document: format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="https://www.omg.org/spec/DMN/20191111/MODEL/" id="test" name="Test" namespace="http://example.com/test">
{}
</definitions>"#,
                body
            ),
            inputs: Vec::new(),
        }
    }

    /// Bind an input before execution
    pub fn input(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.inputs.push((name.to_string(), value.into()));
        self
    }

    /// Execute a decision
    pub fn execute(&self, decision: &str) -> Result<DecisionResult, EngineError> {
        let engine = DmnEngine::new();
        let model = engine.parse(&self.document)?;
        let definition = engine.compile(model)?;
        let mut context = engine.create_context(definition)?;
        for (name, value) in &self.inputs {
            context.bind_input(name, value.clone())?;
        }
        context.execute_decision(decision)
    }
}

/// Assertions on decision results
pub trait ResultAssertions {
    /// Value of an output in the first result set
    fn first(&self, name: &str) -> Value;

    /// Values of an output across all result sets
    fn column(&self, name: &str) -> Vec<Value>;
}

impl ResultAssertions for DecisionResult {
    fn first(&self, name: &str) -> Value {
        self.first_result_variables()
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.clone())
            .unwrap_or_else(|| panic!("output '{}' missing from {:?}", name, self))
    }

    fn column(&self, name: &str) -> Vec<Value> {
        self.results
            .iter()
            .filter_map(|set| set.iter().find(|v| v.name == name).map(|v| v.value.clone()))
            .collect()
    }
}

/// Build a single-input, single-output decision table
pub fn table(name: &str, hit_policy: &str, input: &str, output: &str, rules: &[(&str, &str)]) -> String {
    let rules: String = rules
        .iter()
        .map(|(entry, result)| {
            format!(
                "<rule><inputEntry><text>{}</text></inputEntry><outputEntry><text>{}</text></outputEntry></rule>",
                entry, result
            )
        })
        .collect();
    format!(
        r#"<decision id="{name}" name="{name}">
  <decisionTable hitPolicy="{hit_policy}">
    <input><inputExpression><text>{input}</text></inputExpression></input>
    <output name="{output}"/>
    {rules}
  </decisionTable>
</decision>"#
    )
}
