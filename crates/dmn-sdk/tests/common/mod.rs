//! Common test utilities for handler integration tests

#![allow(dead_code)]

use dmn_core::{
    DecisionEngine, DecisionResult, EngineError, ExecutionContext, OutputVariable, ResultSet, Value,
};
use dmn_sdk::EnginePhase;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Calls observed by a [`MockEngine`]
#[derive(Debug, Default)]
pub struct Recorder {
    pub parse_calls: AtomicUsize,
    pub documents: Mutex<Vec<String>>,
    pub bindings: Mutex<Vec<(String, Value)>>,
    pub executed: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.bindings.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

/// Scripted engine: returns fixed result sets, or fails or panics in one phase
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    pub recorder: Arc<Recorder>,
    results: Vec<ResultSet>,
    fail_in: Option<(EnginePhase, String)>,
    panic_in: Option<EnginePhase>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result set made of `(name, value)` pairs
    pub fn with_result_set(mut self, outputs: &[(&str, Value)]) -> Self {
        self.results.push(
            outputs
                .iter()
                .map(|(name, value)| OutputVariable::new(*name, value.clone()))
                .collect(),
        );
        self
    }

    pub fn failing_in(mut self, phase: EnginePhase, message: &str) -> Self {
        self.fail_in = Some((phase, message.to_string()));
        self
    }

    pub fn panicking_in(mut self, phase: EnginePhase) -> Self {
        self.panic_in = Some(phase);
        self
    }

    fn check(&self, phase: EnginePhase) -> Result<(), EngineError> {
        if self.panic_in == Some(phase) {
            panic!("engine exploded during {}", phase);
        }
        match &self.fail_in {
            Some((failing, message)) if *failing == phase => Err(EngineError::message(message.clone())),
            _ => Ok(()),
        }
    }
}

pub struct MockContext {
    engine: MockEngine,
}

impl DecisionEngine for MockEngine {
    type Model = String;
    type Definition = String;
    type Context = MockContext;

    fn parse(&self, document: &str) -> Result<String, EngineError> {
        self.recorder.parse_calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.documents.lock().unwrap().push(document.to_string());
        self.check(EnginePhase::Parse)?;
        Ok(document.to_string())
    }

    fn compile(&self, model: String) -> Result<String, EngineError> {
        self.check(EnginePhase::Compile)?;
        Ok(model)
    }

    fn create_context(&self, _definition: String) -> Result<MockContext, EngineError> {
        self.check(EnginePhase::CreateContext)?;
        Ok(MockContext {
            engine: self.clone(),
        })
    }
}

impl ExecutionContext for MockContext {
    fn bind_input(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        self.engine.check(EnginePhase::BindInput)?;
        self.engine
            .recorder
            .bindings
            .lock()
            .unwrap()
            .push((name.to_string(), value));
        Ok(())
    }

    fn execute_decision(&mut self, decision_name: &str) -> Result<DecisionResult, EngineError> {
        self.engine
            .recorder
            .executed
            .lock()
            .unwrap()
            .push(decision_name.to_string());
        self.engine.check(EnginePhase::Execute)?;
        Ok(DecisionResult::new(self.engine.results.clone()))
    }
}
