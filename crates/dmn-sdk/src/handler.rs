//! Request handler
//!
//! Validates a request, prepares the engine (parse, compile, create
//! context), binds the coerced inputs, executes the decision and projects
//! the first result set into an ordered map. [`RequestHandler::handle`]
//! folds every outcome into an [`EvaluationResponse`] and never fails.

use crate::error::{EnginePhase, HandlerError, Result};
use crate::types::{EvaluationRequest, EvaluationResponse, ResultVariables};
use dmn_core::{coerce, DecisionEngine, ExecutionContext};
use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

/// Request handler over a decision engine
#[derive(Debug, Clone, Default)]
pub struct RequestHandler<E> {
    engine: E,
}

impl<E: DecisionEngine> RequestHandler<E> {
    /// Create a new request handler
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Evaluate a request into the success/error envelope.
    ///
    /// Validation failures, engine errors and engine panics all become
    /// `{success: false, error}`.
    pub fn handle(&self, request: &EvaluationRequest) -> EvaluationResponse {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_handle(request))) {
            Ok(Ok(outputs)) => EvaluationResponse::success(outputs),
            Ok(Err(err)) => EvaluationResponse::failure(err.to_string()),
            Err(payload) => {
                let err = HandlerError::Panic(panic_message(payload.as_ref()));
                tracing::error!("Error processing DMN request: {}", err);
                EvaluationResponse::failure(err.to_string())
            }
        }
    }

    /// Evaluate a request, reporting failures as a tagged [`HandlerError`]
    pub fn try_handle(&self, request: &EvaluationRequest) -> Result<ResultVariables> {
        tracing::info!(
            "Received DMN evaluation request for decision '{}'",
            request.decision_name.as_deref().unwrap_or_default()
        );

        let result = self.evaluate(request);
        if let Err(err) = &result {
            log_failure(err);
        }
        result
    }

    fn evaluate(&self, request: &EvaluationRequest) -> Result<ResultVariables> {
        let (document, decision_name) = request.validate()?;

        tracing::info!("Parsing DMN document ({} characters)", document.chars().count());
        let model = self
            .engine
            .parse(document)
            .map_err(HandlerError::engine(EnginePhase::Parse))?;

        tracing::info!("Compiling DMN model");
        let definition = self
            .engine
            .compile(model)
            .map_err(HandlerError::engine(EnginePhase::Compile))?;

        tracing::debug!("Creating execution context");
        let mut context = self
            .engine
            .create_context(definition)
            .map_err(HandlerError::engine(EnginePhase::CreateContext))?;

        let mut processed = 0;
        for (name, raw) in request.inputs.iter().flatten() {
            let value = coerce(raw);
            tracing::debug!("Binding input '{}' as {}", name, value.type_name());
            context
                .bind_input(name, value)
                .map_err(HandlerError::engine(EnginePhase::BindInput))?;
            processed += 1;
        }
        tracing::info!("Processed {} inputs", processed);

        tracing::info!("Executing decision '{}'", decision_name);
        let result = context
            .execute_decision(decision_name)
            .map_err(HandlerError::engine(EnginePhase::Execute))?;

        let outputs: ResultVariables = result
            .first_result_variables()
            .iter()
            .map(|variable| (variable.name.clone(), variable.value.clone()))
            .collect();

        tracing::info!(
            "Decision '{}' evaluated successfully with {} outputs",
            decision_name,
            outputs.len()
        );
        Ok(outputs)
    }
}

fn log_failure(err: &HandlerError) {
    match err {
        HandlerError::Validation(validation) => {
            tracing::error!("Request validation failed: {}", validation);
        }
        HandlerError::Engine { phase, source } => {
            tracing::error!(
                phase = %phase,
                "Error processing DMN request: {}",
                error_chain(source)
            );
        }
        HandlerError::Panic(_) => {
            tracing::error!("Error processing DMN request: {}", err);
        }
    }
}

/// Render an error followed by its source chain
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str("\n  caused by: ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
