//! DMN model parsed from an XML document.
//!
//! Elements are matched by local name, so DMN 1.1 to 1.4 namespaces are all
//! accepted. Expressions are kept as text here; the definition compiler
//! turns them into executable form.

use crate::error::ParseError;
use roxmltree::Node;
use std::fmt;
use std::str::FromStr;

const NODE_AGGREGATION: &str = "aggregation";
const NODE_DECISION: &str = "decision";
const NODE_DECISION_TABLE: &str = "decisionTable";
const NODE_DEFINITIONS: &str = "definitions";
const NODE_INFORMATION_REQUIREMENT: &str = "informationRequirement";
const NODE_INPUT: &str = "input";
const NODE_INPUT_DATA: &str = "inputData";
const NODE_INPUT_ENTRY: &str = "inputEntry";
const NODE_INPUT_EXPRESSION: &str = "inputExpression";
const NODE_LITERAL_EXPRESSION: &str = "literalExpression";
const NODE_OUTPUT: &str = "output";
const NODE_OUTPUT_ENTRY: &str = "outputEntry";
const NODE_OUTPUT_VALUES: &str = "outputValues";
const NODE_REQUIRED_DECISION: &str = "requiredDecision";
const NODE_REQUIRED_INPUT: &str = "requiredInput";
const NODE_RULE: &str = "rule";
const NODE_TEXT: &str = "text";
const NODE_VARIABLE: &str = "variable";

const ATTR_AGGREGATION: &str = "aggregation";
const ATTR_HIT_POLICY: &str = "hitPolicy";
const ATTR_HREF: &str = "href";
const ATTR_ID: &str = "id";
const ATTR_NAME: &str = "name";
const ATTR_TYPE_REF: &str = "typeRef";

/// Root of a DMN document
#[derive(Debug, Clone)]
pub struct Definitions {
    pub name: Option<String>,
    pub decisions: Vec<Decision>,
    pub input_data: Vec<InputData>,
}

/// Declared input of the model
#[derive(Debug, Clone)]
pub struct InputData {
    pub id: Option<String>,
    pub name: String,
}

/// Single decision
#[derive(Debug, Clone)]
pub struct Decision {
    pub id: Option<String>,
    /// Required name of the decision
    pub name: String,
    /// Name of the `variable` element, when it differs from the decision name
    pub variable_name: Option<String>,
    /// References of required decisions, without the leading `#`
    pub required_decisions: Vec<String>,
    /// References of required inputs, without the leading `#`
    pub required_inputs: Vec<String>,
    pub logic: Option<DecisionLogic>,
}

/// Value expression of a decision
#[derive(Debug, Clone)]
pub enum DecisionLogic {
    DecisionTable(DecisionTable),
    LiteralExpression(LiteralExpression),
}

/// Literal expression
#[derive(Debug, Clone)]
pub struct LiteralExpression {
    pub type_ref: Option<String>,
    pub text: String,
}

/// Decision table
#[derive(Debug, Clone)]
pub struct DecisionTable {
    pub hit_policy: HitPolicy,
    pub aggregation: Option<Aggregation>,
    pub inputs: Vec<InputClause>,
    pub outputs: Vec<OutputClause>,
    pub rules: Vec<Rule>,
}

/// Input column of a decision table
#[derive(Debug, Clone)]
pub struct InputClause {
    pub expression: String,
}

/// Output column of a decision table
#[derive(Debug, Clone)]
pub struct OutputClause {
    pub name: Option<String>,
    pub type_ref: Option<String>,
    /// Allowed output values in priority order, as FEEL text
    pub output_values: Option<String>,
}

/// Row of a decision table
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: Option<String>,
    pub input_entries: Vec<String>,
    pub output_entries: Vec<String>,
}

/// Decision table hit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitPolicy {
    #[default]
    Unique,
    First,
    Priority,
    Any,
    Collect,
    RuleOrder,
    OutputOrder,
}

impl FromStr for HitPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UNIQUE" | "U" => Ok(HitPolicy::Unique),
            "FIRST" | "F" => Ok(HitPolicy::First),
            "PRIORITY" | "P" => Ok(HitPolicy::Priority),
            "ANY" | "A" => Ok(HitPolicy::Any),
            "COLLECT" | "C" => Ok(HitPolicy::Collect),
            "RULE ORDER" | "R" => Ok(HitPolicy::RuleOrder),
            "OUTPUT ORDER" | "O" => Ok(HitPolicy::OutputOrder),
            _ => Err(ParseError::InvalidHitPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HitPolicy::Unique => "UNIQUE",
            HitPolicy::First => "FIRST",
            HitPolicy::Priority => "PRIORITY",
            HitPolicy::Any => "ANY",
            HitPolicy::Collect => "COLLECT",
            HitPolicy::RuleOrder => "RULE ORDER",
            HitPolicy::OutputOrder => "OUTPUT ORDER",
        };
        write!(f, "{}", name)
    }
}

/// Aggregation of a COLLECT decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Min,
    Max,
    Count,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Count => "COUNT",
        }
    }
}

impl FromStr for Aggregation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SUM" | "+" => Ok(Aggregation::Sum),
            "MIN" | "<" => Ok(Aggregation::Min),
            "MAX" | ">" => Ok(Aggregation::Max),
            "COUNT" | "#" => Ok(Aggregation::Count),
            _ => Err(ParseError::InvalidAggregation(s.to_string())),
        }
    }
}

/// Parses a DMN document given as text.
pub fn parse_from_string(s: &str) -> Result<Definitions, ParseError> {
    let document = roxmltree::Document::parse(s)?;
    let root = document.root_element();
    if root.tag_name().name() != NODE_DEFINITIONS {
        return Err(ParseError::UnexpectedRoot(root.tag_name().name().to_string()));
    }
    parse_definitions(&root)
}

/// Parses the `definitions` root element.
fn parse_definitions(node: &Node) -> Result<Definitions, ParseError> {
    Ok(Definitions {
        name: optional_attribute(node, ATTR_NAME),
        decisions: parse_decisions(node)?,
        input_data: parse_input_data(node)?,
    })
}

/// Parses all `inputData` elements.
fn parse_input_data(node: &Node) -> Result<Vec<InputData>, ParseError> {
    let mut items = vec![];
    for ref input_data_node in children(node, NODE_INPUT_DATA) {
        items.push(InputData {
            id: optional_attribute(input_data_node, ATTR_ID),
            name: required_attribute(input_data_node, ATTR_NAME)?,
        })
    }
    Ok(items)
}

/// Parses all decisions.
fn parse_decisions(node: &Node) -> Result<Vec<Decision>, ParseError> {
    let mut items = vec![];
    for ref decision_node in children(node, NODE_DECISION) {
        let mut required_decisions = vec![];
        let mut required_inputs = vec![];
        for ref requirement in children(decision_node, NODE_INFORMATION_REQUIREMENT) {
            if let Some(ref required) = child(requirement, NODE_REQUIRED_DECISION) {
                required_decisions.push(href(required)?);
            }
            if let Some(ref required) = child(requirement, NODE_REQUIRED_INPUT) {
                required_inputs.push(href(required)?);
            }
        }
        items.push(Decision {
            id: optional_attribute(decision_node, ATTR_ID),
            name: required_attribute(decision_node, ATTR_NAME)?,
            variable_name: child(decision_node, NODE_VARIABLE).and_then(|v| optional_attribute(&v, ATTR_NAME)),
            required_decisions,
            required_inputs,
            logic: parse_decision_logic(decision_node)?,
        })
    }
    Ok(items)
}

/// Parses the value expression of a decision.
fn parse_decision_logic(node: &Node) -> Result<Option<DecisionLogic>, ParseError> {
    if let Some(ref table_node) = child(node, NODE_DECISION_TABLE) {
        return Ok(Some(DecisionLogic::DecisionTable(parse_decision_table(table_node)?)));
    }
    if let Some(ref literal_node) = child(node, NODE_LITERAL_EXPRESSION) {
        return Ok(Some(DecisionLogic::LiteralExpression(LiteralExpression {
            type_ref: optional_attribute(literal_node, ATTR_TYPE_REF),
            text: optional_child_content(literal_node, NODE_TEXT).unwrap_or_default(),
        })));
    }
    Ok(None)
}

/// Parses a decision table.
fn parse_decision_table(node: &Node) -> Result<DecisionTable, ParseError> {
    let hit_policy = match node.attribute(ATTR_HIT_POLICY) {
        Some(text) => text.parse::<HitPolicy>()?,
        None => HitPolicy::default(),
    };
    let aggregation = match node.attribute(ATTR_AGGREGATION) {
        Some(text) => Some(text.parse::<Aggregation>()?),
        None => optional_child_content(node, NODE_AGGREGATION)
            .map(|text| text.parse::<Aggregation>())
            .transpose()?,
    };
    Ok(DecisionTable {
        hit_policy,
        aggregation,
        inputs: parse_input_clauses(node)?,
        outputs: parse_output_clauses(node),
        rules: parse_rules(node),
    })
}

/// Parses input clauses of a decision table.
fn parse_input_clauses(node: &Node) -> Result<Vec<InputClause>, ParseError> {
    let mut items = vec![];
    for ref input_node in children(node, NODE_INPUT) {
        let expression_node = child(input_node, NODE_INPUT_EXPRESSION).ok_or_else(|| ParseError::MissingElement {
            parent: NODE_INPUT.to_string(),
            child: NODE_INPUT_EXPRESSION.to_string(),
        })?;
        items.push(InputClause {
            expression: optional_child_content(&expression_node, NODE_TEXT).unwrap_or_default(),
        })
    }
    Ok(items)
}

/// Parses output clauses of a decision table.
fn parse_output_clauses(node: &Node) -> Vec<OutputClause> {
    children(node, NODE_OUTPUT)
        .map(|ref output_node| OutputClause {
            name: optional_attribute(output_node, ATTR_NAME),
            type_ref: optional_attribute(output_node, ATTR_TYPE_REF),
            output_values: child(output_node, NODE_OUTPUT_VALUES)
                .and_then(|ref values| optional_child_content(values, NODE_TEXT)),
        })
        .collect()
}

/// Parses rules of a decision table.
fn parse_rules(node: &Node) -> Vec<Rule> {
    children(node, NODE_RULE)
        .map(|ref rule_node| Rule {
            id: optional_attribute(rule_node, ATTR_ID),
            input_entries: children(rule_node, NODE_INPUT_ENTRY)
                .map(|ref entry| optional_child_content(entry, NODE_TEXT).unwrap_or_default())
                .collect(),
            output_entries: children(rule_node, NODE_OUTPUT_ENTRY)
                .map(|ref entry| optional_child_content(entry, NODE_TEXT).unwrap_or_default())
                .collect(),
        })
        .collect()
}

/// XML utility function that returns child elements with the given local name.
fn children<'a, 'input: 'a>(node: &Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// XML utility function that returns the first child element with the given local name.
fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

/// XML utility function that returns the value of the required attribute or an error.
fn required_attribute(node: &Node, attr_name: &str) -> Result<String, ParseError> {
    node.attribute(attr_name)
        .map(|value| value.to_string())
        .ok_or_else(|| ParseError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute: attr_name.to_string(),
        })
}

/// XML utility function that returns the value of the optional attribute.
fn optional_attribute(node: &Node, attr_name: &str) -> Option<String> {
    node.attribute(attr_name).map(|value| value.to_string())
}

/// XML utility function that returns the textual content of an optional child node.
fn optional_child_content(node: &Node, child_name: &str) -> Option<String> {
    child(node, child_name).map(|c| c.text().unwrap_or_default().to_string())
}

/// XML utility function that returns the target of an `href` reference.
fn href(node: &Node) -> Result<String, ParseError> {
    let reference = required_attribute(node, ATTR_HREF)?;
    Ok(reference.trim_start_matches('#').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DMN_13: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
      <definitions xmlns="https://www.omg.org/spec/DMN/20191111/MODEL/"
                   id="loans" name="Loans" namespace="http://example.com/loans">
        <inputData id="i_age" name="age"/>
        <decision id="d_eligible" name="Eligibility">
          <variable name="Eligibility"/>
          <informationRequirement>
            <requiredInput href="#i_age"/>
          </informationRequirement>
          <decisionTable id="dt_1" hitPolicy="FIRST">
            <input id="in_1" label="Age">
              <inputExpression typeRef="number"><text>age</text></inputExpression>
            </input>
            <output id="out_1" name="eligible" typeRef="boolean"/>
            <rule id="r1">
              <inputEntry><text>&gt;= 18</text></inputEntry>
              <outputEntry><text>true</text></outputEntry>
            </rule>
            <rule id="r2">
              <inputEntry><text>-</text></inputEntry>
              <outputEntry><text>false</text></outputEntry>
            </rule>
          </decisionTable>
        </decision>
        <decision id="d_greeting" name="Greeting">
          <informationRequirement>
            <requiredDecision href="#d_eligible"/>
          </informationRequirement>
          <literalExpression typeRef="string"><text>"Hello"</text></literalExpression>
        </decision>
      </definitions>
    "##;

    #[test]
    fn test_parse_definitions() {
        let definitions = parse_from_string(DMN_13).unwrap();
        assert_eq!(definitions.name.as_deref(), Some("Loans"));
        assert_eq!(definitions.input_data.len(), 1);
        assert_eq!(definitions.input_data[0].id.as_deref(), Some("i_age"));
        assert_eq!(definitions.input_data[0].name, "age");
        assert_eq!(definitions.decisions.len(), 2);
    }

    #[test]
    fn test_parse_decision_table() {
        let definitions = parse_from_string(DMN_13).unwrap();
        let decision = &definitions.decisions[0];
        assert_eq!(decision.name, "Eligibility");
        assert_eq!(decision.variable_name.as_deref(), Some("Eligibility"));
        assert_eq!(decision.required_inputs, vec!["i_age".to_string()]);
        match &decision.logic {
            Some(DecisionLogic::DecisionTable(table)) => {
                assert_eq!(table.hit_policy, HitPolicy::First);
                assert_eq!(table.inputs.len(), 1);
                assert_eq!(table.inputs[0].expression, "age");
                assert_eq!(table.outputs[0].name.as_deref(), Some("eligible"));
                assert_eq!(table.outputs[0].type_ref.as_deref(), Some("boolean"));
                assert_eq!(table.rules.len(), 2);
                assert_eq!(table.rules[0].input_entries, vec![">= 18".to_string()]);
                assert_eq!(table.rules[1].output_entries, vec!["false".to_string()]);
            }
            other => panic!("Expected decision table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_literal_expression_and_requirements() {
        let definitions = parse_from_string(DMN_13).unwrap();
        let decision = &definitions.decisions[1];
        assert_eq!(decision.required_decisions, vec!["d_eligible".to_string()]);
        match &decision.logic {
            Some(DecisionLogic::LiteralExpression(literal)) => {
                assert_eq!(literal.text, "\"Hello\"");
                assert_eq!(literal.type_ref.as_deref(), Some("string"));
            }
            other => panic!("Expected literal expression, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse_from_string("<definitions>").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn test_unexpected_root() {
        let err = parse_from_string("<testCases/>").unwrap_err();
        assert_eq!(err.to_string(), "Expected root element 'definitions', found 'testCases'");
    }

    #[test]
    fn test_decision_without_name() {
        let err = parse_from_string("<definitions><decision id=\"d\"/></definitions>").unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
    }

    #[test]
    fn test_hit_policy_parsing() {
        assert_eq!("RULE ORDER".parse::<HitPolicy>().unwrap(), HitPolicy::RuleOrder);
        assert_eq!("collect".parse::<HitPolicy>().unwrap(), HitPolicy::Collect);
        assert!("SOMETIMES".parse::<HitPolicy>().is_err());
        assert_eq!("SUM".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert!("AVG".parse::<Aggregation>().is_err());
    }
}
