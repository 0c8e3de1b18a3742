//! Execution context
//!
//! Holds the input bindings of one evaluation and executes decisions of a
//! compiled definition. Required decisions are evaluated first and their
//! values are visible to dependents under the decision's variable name.

use crate::definition::{CompiledDecision, CompiledDefinitions, CompiledLogic, CompiledTable};
use crate::error::ExecutionError;
use crate::feel::{self, FeelValue, Variables};
use crate::model::{Aggregation, HitPolicy};
use dmn_core::{DecisionResult, EngineError, ExecutionContext, OutputVariable, ResultSet, Value};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Outputs of one matched rule, in output clause order
type Row = Vec<(String, FeelValue)>;

/// Execution context of the built-in engine
#[derive(Debug)]
pub struct DmnExecutionContext {
    definitions: CompiledDefinitions,
    inputs: Variables,
}

impl DmnExecutionContext {
    pub fn new(definitions: CompiledDefinitions) -> Self {
        Self {
            definitions,
            inputs: Variables::new(),
        }
    }

    /// Currently bound inputs
    pub fn inputs(&self) -> &Variables {
        &self.inputs
    }

    /// Execute a decision, returning its raw result rows
    fn execute(&self, decision_name: &str) -> Result<Vec<Row>, ExecutionError> {
        let decision = self
            .definitions
            .decision(decision_name)
            .ok_or_else(|| ExecutionError::DecisionNotFound(decision_name.to_string()))?;

        let mut scope = self.inputs.clone();
        let mut evaluated = vec![false; self.definitions.decisions().len()];
        self.evaluate_requirements(decision, &mut scope, &mut evaluated)?;
        self.evaluate_decision(decision, &scope)
    }

    /// Evaluate required decisions depth-first and bind their values into `scope`
    fn evaluate_requirements(
        &self,
        decision: &CompiledDecision,
        scope: &mut Variables,
        evaluated: &mut [bool],
    ) -> Result<(), ExecutionError> {
        for &index in &decision.requires {
            if evaluated[index] {
                continue;
            }
            let required = self.definitions.decision_at(index);
            self.evaluate_requirements(required, scope, evaluated)?;
            let rows = self.evaluate_decision(required, scope)?;
            trace!("Required decision '{}' produced {} result sets", required.name, rows.len());
            scope.insert(required.variable_name.clone(), rows_to_value(rows));
            evaluated[index] = true;
        }
        Ok(())
    }

    fn evaluate_decision(
        &self,
        decision: &CompiledDecision,
        scope: &Variables,
    ) -> Result<Vec<Row>, ExecutionError> {
        match &decision.logic {
            CompiledLogic::Literal { expression, .. } => {
                let value = feel::evaluate(expression, scope);
                Ok(vec![vec![(decision.variable_name.clone(), value)]])
            }
            CompiledLogic::Table(table) => evaluate_table(&decision.name, table, scope),
        }
    }

    /// Declared output types of a decision, by output name
    fn type_refs(&self, decision_name: &str) -> IndexMap<String, String> {
        let mut refs = IndexMap::new();
        if let Some(decision) = self.definitions.decision(decision_name) {
            match &decision.logic {
                CompiledLogic::Table(table) => {
                    for output in &table.outputs {
                        if let Some(type_ref) = &output.type_ref {
                            refs.insert(output.name.clone(), type_ref.clone());
                        }
                    }
                }
                CompiledLogic::Literal { type_ref: Some(type_ref), .. } => {
                    refs.insert(decision.variable_name.clone(), type_ref.clone());
                }
                CompiledLogic::Literal { .. } => {}
            }
        }
        refs
    }
}

impl ExecutionContext for DmnExecutionContext {
    fn bind_input(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        trace!("Binding input '{}' ({})", name, value.type_name());
        self.inputs.insert(name.to_string(), FeelValue::from(value));
        Ok(())
    }

    fn execute_decision(&mut self, decision_name: &str) -> Result<DecisionResult, EngineError> {
        let rows = self.execute(decision_name)?;
        debug!("Decision '{}' produced {} result sets", decision_name, rows.len());

        let type_refs = self.type_refs(decision_name);
        let results = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(name, value)| {
                        let variable = OutputVariable::new(name.clone(), value.into_value());
                        match type_refs.get(&name) {
                            Some(type_ref) => variable.with_type_ref(type_ref.clone()),
                            None => variable,
                        }
                    })
                    .collect::<ResultSet>()
            })
            .collect();
        Ok(DecisionResult::new(results))
    }
}

/// Value of a required decision as seen by its dependents
fn rows_to_value(rows: Vec<Row>) -> FeelValue {
    let mut values: Vec<FeelValue> = rows.into_iter().map(row_to_value).collect();
    match values.len() {
        0 => FeelValue::Null,
        1 => values.remove(0),
        _ => FeelValue::List(values),
    }
}

fn row_to_value(row: Row) -> FeelValue {
    if row.len() == 1 {
        row.into_iter().next().map(|(_, v)| v).unwrap_or(FeelValue::Null)
    } else {
        FeelValue::Context(row.into_iter().collect())
    }
}

fn evaluate_table(
    decision: &str,
    table: &CompiledTable,
    scope: &Variables,
) -> Result<Vec<Row>, ExecutionError> {
    let input_values: Vec<FeelValue> = table
        .inputs
        .iter()
        .map(|expression| feel::evaluate(expression, scope))
        .collect();

    let mut matches: Vec<Row> = Vec::new();
    for rule in &table.rules {
        let matched = rule
            .tests
            .iter()
            .zip(&input_values)
            .all(|(tests, value)| feel::satisfies(tests, value, scope));
        if !matched {
            continue;
        }
        trace!(
            "Rule {} ({}) of decision '{}' matched",
            rule.number,
            rule.id.as_deref().unwrap_or("no id"),
            decision
        );
        let row = table
            .outputs
            .iter()
            .zip(&rule.outputs)
            .map(|(output, expression)| (output.name.clone(), feel::evaluate(expression, scope)))
            .collect();
        matches.push(row);
    }

    debug!(
        "Decision '{}' ({}): {} of {} rules matched",
        decision,
        table.hit_policy,
        matches.len(),
        table.rules.len()
    );

    if matches.is_empty() {
        return Ok(matches);
    }

    match table.hit_policy {
        HitPolicy::Unique => {
            if matches.len() > 1 {
                return Err(ExecutionError::UniqueViolation {
                    decision: decision.to_string(),
                    matched: matches.len(),
                });
            }
            Ok(matches)
        }
        HitPolicy::First => {
            matches.truncate(1);
            Ok(matches)
        }
        HitPolicy::Any => {
            let first = &matches[0];
            let consistent = matches.iter().all(|row| rows_equal(row, first));
            if !consistent {
                return Err(ExecutionError::AnyViolation(decision.to_string()));
            }
            matches.truncate(1);
            Ok(matches)
        }
        HitPolicy::Priority => {
            sort_by_priority(table, &mut matches);
            matches.truncate(1);
            Ok(matches)
        }
        HitPolicy::OutputOrder => {
            sort_by_priority(table, &mut matches);
            Ok(matches)
        }
        HitPolicy::RuleOrder => Ok(matches),
        HitPolicy::Collect => match table.aggregation {
            None => Ok(matches),
            Some(aggregation) => aggregate(decision, table, aggregation, matches).map(|row| vec![row]),
        },
    }
}

fn rows_equal(a: &Row, b: &Row) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|((_, x), (_, y))| x.feel_eq(y))
}

/// Stable sort of matched rows by output value priority, first output first
fn sort_by_priority(table: &CompiledTable, rows: &mut [Row]) {
    rows.sort_by(|a, b| {
        for (i, output) in table.outputs.iter().enumerate() {
            let ordering = output.rank(&a[i].1).cmp(&output.rank(&b[i].1));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn aggregate(
    decision: &str,
    table: &CompiledTable,
    aggregation: Aggregation,
    rows: Vec<Row>,
) -> Result<Row, ExecutionError> {
    let name = table
        .outputs
        .first()
        .map(|output| output.name.clone())
        .unwrap_or_else(|| decision.to_string());
    let values: Vec<FeelValue> = rows
        .into_iter()
        .filter_map(|row| row.into_iter().next().map(|(_, v)| v))
        .filter(|v| !v.is_null())
        .collect();

    if aggregation == Aggregation::Count {
        let mut distinct: Vec<&FeelValue> = Vec::new();
        for value in &values {
            if !distinct.iter().any(|d| d.feel_eq(value)) {
                distinct.push(value);
            }
        }
        return Ok(vec![(name, FeelValue::Number(distinct.len() as f64))]);
    }

    let mut numbers = Vec::with_capacity(values.len());
    for value in &values {
        match value {
            FeelValue::Number(n) => numbers.push(*n),
            _ => {
                return Err(ExecutionError::NonNumericAggregation {
                    decision: decision.to_string(),
                    output: name,
                    aggregation: aggregation.as_str(),
                })
            }
        }
    }

    let result = match aggregation {
        Aggregation::Sum => Some(numbers.iter().sum()),
        Aggregation::Min => numbers.iter().copied().reduce(f64::min),
        Aggregation::Max => numbers.iter().copied().reduce(f64::max),
        Aggregation::Count => None,
    };
    Ok(vec![(name, result.map(FeelValue::Number).unwrap_or(FeelValue::Null))])
}
