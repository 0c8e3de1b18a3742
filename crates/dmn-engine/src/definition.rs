//! Definition compiler
//!
//! Turns a parsed [`Definitions`] model into an executable
//! [`CompiledDefinitions`]: every expression and unary test is parsed, rule
//! arity is checked against the table clauses, required inputs must name a
//! declared `inputData`, and decision requirements are resolved and checked
//! for cycles and chain depth.

use crate::error::CompileError;
use crate::feel::{self, Expression, FeelError, FeelValue, UnaryTests};
use crate::model::{Aggregation, Decision, DecisionLogic, DecisionTable, Definitions, HitPolicy};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Longest allowed chain of required decisions below a decision
pub const MAX_REQUIREMENT_DEPTH: usize = 64;

/// Compiled, executable decision model
#[derive(Debug, Clone)]
pub struct CompiledDefinitions {
    decisions: Vec<CompiledDecision>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

/// Compiled decision
#[derive(Debug, Clone)]
pub struct CompiledDecision {
    pub name: String,
    /// Name under which the decision's value is visible to dependents
    pub variable_name: String,
    /// Indexes of required decisions
    pub requires: Vec<usize>,
    pub logic: CompiledLogic,
}

/// Compiled value expression
#[derive(Debug, Clone)]
pub enum CompiledLogic {
    Table(CompiledTable),
    Literal {
        expression: Expression,
        type_ref: Option<String>,
    },
}

/// Compiled decision table
#[derive(Debug, Clone)]
pub struct CompiledTable {
    pub hit_policy: HitPolicy,
    pub aggregation: Option<Aggregation>,
    pub inputs: Vec<Expression>,
    pub outputs: Vec<CompiledOutput>,
    pub rules: Vec<CompiledRule>,
}

/// Compiled output clause
#[derive(Debug, Clone)]
pub struct CompiledOutput {
    pub name: String,
    pub type_ref: Option<String>,
    /// Output values in priority order; empty when the clause lists none
    pub priorities: Vec<FeelValue>,
}

impl CompiledOutput {
    /// Priority rank of a value, lower is higher priority
    pub fn rank(&self, value: &FeelValue) -> usize {
        self.priorities
            .iter()
            .position(|p| p.feel_eq(value))
            .unwrap_or(self.priorities.len())
    }
}

/// Compiled rule
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// One-based position in the table
    pub number: usize,
    pub id: Option<String>,
    pub tests: Vec<UnaryTests>,
    pub outputs: Vec<Expression>,
}

impl CompiledDefinitions {
    /// Find a decision by name, falling back to its id
    pub fn decision(&self, name: &str) -> Option<&CompiledDecision> {
        self.by_name
            .get(name)
            .or_else(|| self.by_id.get(name))
            .map(|&index| &self.decisions[index])
    }

    pub fn decision_at(&self, index: usize) -> &CompiledDecision {
        &self.decisions[index]
    }

    pub fn decisions(&self) -> &[CompiledDecision] {
        &self.decisions
    }
}

/// Compile a parsed model
pub fn compile(definitions: Definitions) -> Result<CompiledDefinitions, CompileError> {
    let mut by_name = HashMap::new();
    let mut by_id = HashMap::new();
    for (index, decision) in definitions.decisions.iter().enumerate() {
        if by_name.insert(decision.name.clone(), index).is_some() {
            return Err(CompileError::DuplicateDecision(decision.name.clone()));
        }
        if let Some(id) = &decision.id {
            by_id.insert(id.clone(), index);
        }
    }

    let declared_inputs: HashSet<&str> = definitions
        .input_data
        .iter()
        .flat_map(|input| input.id.as_deref().into_iter().chain([input.name.as_str()]))
        .collect();
    for decision in &definitions.decisions {
        if let Some(href) = decision
            .required_inputs
            .iter()
            .find(|href| !declared_inputs.contains(href.as_str()))
        {
            return Err(CompileError::UnknownInput {
                decision: decision.name.clone(),
                href: href.clone(),
            });
        }
    }

    let mut decisions = Vec::with_capacity(definitions.decisions.len());
    for decision in definitions.decisions {
        let requires = decision
            .required_decisions
            .iter()
            .map(|href| {
                by_id
                    .get(href)
                    .or_else(|| by_name.get(href))
                    .copied()
                    .ok_or_else(|| CompileError::UnknownRequirement {
                        decision: decision.name.clone(),
                        href: href.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        decisions.push(compile_decision(decision, requires)?);
    }

    check_requirements(&decisions)?;

    debug!(
        "Compiled {} decisions of definitions '{}'",
        decisions.len(),
        definitions.name.as_deref().unwrap_or("<unnamed>")
    );

    Ok(CompiledDefinitions {
        decisions,
        by_name,
        by_id,
    })
}

fn compile_decision(decision: Decision, requires: Vec<usize>) -> Result<CompiledDecision, CompileError> {
    let variable_name = decision
        .variable_name
        .clone()
        .unwrap_or_else(|| decision.name.clone());

    let logic = match decision.logic {
        Some(DecisionLogic::DecisionTable(table)) => {
            CompiledLogic::Table(compile_table(&decision.name, &variable_name, table)?)
        }
        Some(DecisionLogic::LiteralExpression(literal)) => CompiledLogic::Literal {
            expression: feel::parse_expression(&literal.text)
                .map_err(located(format!("literal expression of decision '{}'", decision.name)))?,
            type_ref: literal.type_ref,
        },
        None => return Err(CompileError::MissingLogic(decision.name)),
    };

    Ok(CompiledDecision {
        name: decision.name,
        variable_name,
        requires,
        logic,
    })
}

fn compile_table(
    decision: &str,
    variable_name: &str,
    table: DecisionTable,
) -> Result<CompiledTable, CompileError> {
    if table.aggregation.is_some() && table.outputs.len() > 1 {
        return Err(CompileError::AggregationWithMultipleOutputs(decision.to_string()));
    }

    let inputs = table
        .inputs
        .iter()
        .enumerate()
        .map(|(i, clause)| {
            feel::parse_expression(&clause.expression)
                .map_err(located(format!("input {} of decision '{}'", i + 1, decision)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let single_output = table.outputs.len() == 1;
    let mut outputs = Vec::with_capacity(table.outputs.len());
    for (i, clause) in table.outputs.iter().enumerate() {
        let name = match (&clause.name, single_output) {
            (Some(name), _) => name.clone(),
            (None, true) => variable_name.to_string(),
            (None, false) => {
                return Err(CompileError::MissingOutputName {
                    decision: decision.to_string(),
                    index: i + 1,
                })
            }
        };
        let priorities = match &clause.output_values {
            Some(text) => feel::parse_expression_list(text)
                .map_err(located(format!("output values of '{}' in decision '{}'", name, decision)))?
                .iter()
                .filter_map(|e| e.constant().cloned())
                .collect(),
            None => Vec::new(),
        };
        outputs.push(CompiledOutput {
            name,
            type_ref: clause.type_ref.clone(),
            priorities,
        });
    }

    let mut rules = Vec::with_capacity(table.rules.len());
    for (i, rule) in table.rules.into_iter().enumerate() {
        let number = i + 1;
        check_arity(decision, number, "input", inputs.len(), rule.input_entries.len())?;
        check_arity(decision, number, "output", outputs.len(), rule.output_entries.len())?;

        let tests = rule
            .input_entries
            .iter()
            .map(|entry| {
                feel::parse_unary_tests(entry)
                    .map_err(located(format!("rule {} of decision '{}'", number, decision)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rule_outputs = rule
            .output_entries
            .iter()
            .map(|entry| {
                feel::parse_expression(entry)
                    .map_err(located(format!("rule {} of decision '{}'", number, decision)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        rules.push(CompiledRule {
            number,
            id: rule.id,
            tests,
            outputs: rule_outputs,
        });
    }

    Ok(CompiledTable {
        hit_policy: table.hit_policy,
        aggregation: table.aggregation,
        inputs,
        outputs,
        rules,
    })
}

fn check_arity(
    decision: &str,
    rule: usize,
    kind: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), CompileError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CompileError::RuleArity {
            decision: decision.to_string(),
            rule,
            kind,
            expected,
            actual,
        })
    }
}

fn located(location: String) -> impl FnOnce(FeelError) -> CompileError {
    move |source| CompileError::Expression { location, source }
}

/// Reject requirement cycles and chains deeper than [`MAX_REQUIREMENT_DEPTH`]
///
/// Walks the requirement graph depth-first with an explicit stack, so the
/// size of the document does not bound the call stack.
fn check_requirements(decisions: &[CompiledDecision]) -> Result<(), CompileError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; decisions.len()];
    let mut depths = vec![0usize; decisions.len()];
    for root in 0..decisions.len() {
        if marks[root] != Mark::New {
            continue;
        }
        marks[root] = Mark::Active;
        // (decision, next requirement to visit)
        let mut stack = vec![(root, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (index, next) = *frame;
            let decision = &decisions[index];
            if let Some(&required) = decision.requires.get(next) {
                frame.1 += 1;
                match marks[required] {
                    Mark::Active => return Err(CompileError::CyclicRequirement(decisions[required].name.clone())),
                    Mark::New => {
                        marks[required] = Mark::Active;
                        stack.push((required, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                let depth = decision.requires.iter().map(|&r| depths[r] + 1).max().unwrap_or(0);
                if depth > MAX_REQUIREMENT_DEPTH {
                    return Err(CompileError::RequirementsTooDeep {
                        decision: decision.name.clone(),
                        limit: MAX_REQUIREMENT_DEPTH,
                    });
                }
                depths[index] = depth;
                marks[index] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_from_string;

    fn compile_str(xml: &str) -> Result<CompiledDefinitions, CompileError> {
        compile(parse_from_string(xml).unwrap())
    }

    const TABLE: &str = r##"
      <definitions name="t">
        <decision id="d1" name="Risk">
          <decisionTable hitPolicy="PRIORITY">
            <input><inputExpression><text>score</text></inputExpression></input>
            <output typeRef="string"><outputValues><text>"high","medium","low"</text></outputValues></output>
            <rule><inputEntry><text>&gt; 700</text></inputEntry><outputEntry><text>"low"</text></outputEntry></rule>
            <rule><inputEntry><text>-</text></inputEntry><outputEntry><text>"high"</text></outputEntry></rule>
          </decisionTable>
        </decision>
      </definitions>"##;

    #[test]
    fn test_compile_table() {
        let definitions = compile_str(TABLE).unwrap();
        let decision = definitions.decision("Risk").unwrap();
        assert_eq!(decision.variable_name, "Risk");
        match &decision.logic {
            CompiledLogic::Table(table) => {
                assert_eq!(table.hit_policy, HitPolicy::Priority);
                assert_eq!(table.outputs[0].name, "Risk");
                assert_eq!(table.outputs[0].priorities.len(), 3);
                assert_eq!(table.outputs[0].rank(&FeelValue::String("medium".to_string())), 1);
                assert_eq!(table.outputs[0].rank(&FeelValue::String("none".to_string())), 3);
                assert_eq!(table.rules.len(), 2);
                assert_eq!(table.rules[1].tests[0], UnaryTests::Any);
            }
            other => panic!("Expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let definitions = compile_str(TABLE).unwrap();
        assert_eq!(definitions.decision("d1").unwrap().name, "Risk");
        assert!(definitions.decision("Unknown").is_none());
    }

    #[test]
    fn test_rule_arity_mismatch() {
        let err = compile_str(
            r#"<definitions><decision name="D"><decisionTable>
                 <input><inputExpression><text>a</text></inputExpression></input>
                 <output name="o"/>
                 <rule><outputEntry><text>1</text></outputEntry></rule>
               </decisionTable></decision></definitions>"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rule 1 of decision 'D' has 0 input entries, expected 1"
        );
    }

    #[test]
    fn test_invalid_entry_expression() {
        let err = compile_str(
            r#"<definitions><decision name="D"><decisionTable>
                 <input><inputExpression><text>a</text></inputExpression></input>
                 <output name="o"/>
                 <rule><inputEntry><text>[1..</text></inputEntry><outputEntry><text>1</text></outputEntry></rule>
               </decisionTable></decision></definitions>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Expression { .. }));
    }

    #[test]
    fn test_duplicate_decision() {
        let err = compile_str(
            r#"<definitions>
                 <decision name="D"><literalExpression><text>1</text></literalExpression></decision>
                 <decision name="D"><literalExpression><text>2</text></literalExpression></decision>
               </definitions>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateDecision(name) if name == "D"));
    }

    #[test]
    fn test_unknown_requirement() {
        let err = compile_str(
            r##"<definitions>
                 <decision name="D">
                   <informationRequirement><requiredDecision href="#missing"/></informationRequirement>
                   <literalExpression><text>1</text></literalExpression>
                 </decision>
               </definitions>"##,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownRequirement { .. }));
    }

    #[test]
    fn test_cyclic_requirements() {
        let err = compile_str(
            r##"<definitions>
                 <decision id="a" name="A">
                   <informationRequirement><requiredDecision href="#b"/></informationRequirement>
                   <literalExpression><text>B</text></literalExpression>
                 </decision>
                 <decision id="b" name="B">
                   <informationRequirement><requiredDecision href="#a"/></informationRequirement>
                   <literalExpression><text>A</text></literalExpression>
                 </decision>
               </definitions>"##,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::CyclicRequirement(_)));
    }

    #[test]
    fn test_unknown_required_input() {
        let err = compile_str(
            r##"<definitions>
                 <inputData id="i_age" name="age"/>
                 <decision name="D">
                   <informationRequirement><requiredInput href="#i_age"/></informationRequirement>
                   <informationRequirement><requiredInput href="#i_income"/></informationRequirement>
                   <literalExpression><text>age</text></literalExpression>
                 </decision>
               </definitions>"##,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Decision 'D' requires unknown input 'i_income'");
    }

    #[test]
    fn test_required_input_by_name() {
        let definitions = compile_str(
            r##"<definitions>
                 <inputData name="age"/>
                 <decision name="D">
                   <informationRequirement><requiredInput href="#age"/></informationRequirement>
                   <literalExpression><text>age</text></literalExpression>
                 </decision>
               </definitions>"##,
        )
        .unwrap();
        assert!(definitions.decision("D").is_some());
    }

    fn chain(length: usize) -> String {
        let mut xml = String::from("<definitions>");
        xml.push_str(r#"<decision id="d0" name="D0"><literalExpression><text>1</text></literalExpression></decision>"#);
        for i in 1..length {
            xml.push_str(&format!(
                r##"<decision id="d{i}" name="D{i}">
                     <informationRequirement><requiredDecision href="#d{prev}"/></informationRequirement>
                     <literalExpression><text>D{prev} + 1</text></literalExpression>
                   </decision>"##,
                i = i,
                prev = i - 1
            ));
        }
        xml.push_str("</definitions>");
        xml
    }

    #[test]
    fn test_requirement_chain_within_limit() {
        let definitions = compile_str(&chain(MAX_REQUIREMENT_DEPTH + 1)).unwrap();
        assert_eq!(definitions.decisions().len(), MAX_REQUIREMENT_DEPTH + 1);
    }

    #[test]
    fn test_requirement_chain_too_deep() {
        let err = compile_str(&chain(10_000)).unwrap_err();
        assert!(matches!(
            err,
            CompileError::RequirementsTooDeep { limit: MAX_REQUIREMENT_DEPTH, .. }
        ));
    }

    #[test]
    fn test_missing_logic() {
        let err = compile_str(r#"<definitions><decision name="Empty"/></definitions>"#).unwrap_err();
        assert_eq!(err.to_string(), "Decision 'Empty' has no decision logic");
    }

    #[test]
    fn test_unnamed_outputs_in_multi_output_table() {
        let err = compile_str(
            r#"<definitions><decision name="D"><decisionTable>
                 <output/><output name="b"/>
               </decisionTable></decision></definitions>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingOutputName { index: 1, .. }));
    }
}
