//! End-to-end tests of the request handler over the built-in engine

use dmn_engine::DmnEngine;
use dmn_sdk::{EvaluationRequest, RequestHandler};
use serde_json::json;

const ELIGIBILITY: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="https://www.omg.org/spec/DMN/20191111/MODEL/" id="eligibility" name="Eligibility" namespace="http://example.com/eligibility">
  <inputData id="i_age" name="age"/>
  <inputData id="i_country" name="country"/>
  <decision id="d_decide" name="Decide">
    <informationRequirement><requiredInput href="#i_age"/></informationRequirement>
    <informationRequirement><requiredInput href="#i_country"/></informationRequirement>
    <decisionTable hitPolicy="FIRST">
      <input><inputExpression typeRef="number"><text>age</text></inputExpression></input>
      <input><inputExpression typeRef="string"><text>country</text></inputExpression></input>
      <output name="eligible" typeRef="boolean"/>
      <output name="reason" typeRef="string"/>
      <rule>
        <inputEntry><text>&lt; 18</text></inputEntry>
        <inputEntry><text>-</text></inputEntry>
        <outputEntry><text>false</text></outputEntry>
        <outputEntry><text>"minor"</text></outputEntry>
      </rule>
      <rule>
        <inputEntry><text>-</text></inputEntry>
        <inputEntry><text>"DE","FR"</text></inputEntry>
        <outputEntry><text>true</text></outputEntry>
        <outputEntry><text>"ok"</text></outputEntry>
      </rule>
    </decisionTable>
  </decision>
</definitions>"##;

fn handler() -> RequestHandler<DmnEngine> {
    RequestHandler::new(DmnEngine::new())
}

#[test]
fn test_evaluate_eligible() {
    let request = EvaluationRequest::new(ELIGIBILITY, "Decide")
        .with_input("age", 30)
        .with_input("country", "DE");
    let response = handler().handle(&request);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "outputs": {"eligible": true, "reason": "ok"}})
    );
}

#[test]
fn test_evaluate_minor() {
    let request = EvaluationRequest::new(ELIGIBILITY, "Decide")
        .with_input("age", 12)
        .with_input("country", "DE");
    let outputs = handler().handle(&request).outputs.unwrap();
    assert_eq!(serde_json::to_value(outputs).unwrap(), json!({"eligible": false, "reason": "minor"}));
}

#[test]
fn test_no_matching_rule_gives_empty_outputs() {
    let request = EvaluationRequest::new(ELIGIBILITY, "Decide")
        .with_input("age", 30)
        .with_input("country", "US");
    let response = handler().handle(&request);
    assert_eq!(serde_json::to_value(&response).unwrap(), json!({"success": true, "outputs": {}}));
}

#[test]
fn test_unknown_decision() {
    let request = EvaluationRequest::new(ELIGIBILITY, "NoSuchDecision").with_input("age", 30);
    let response = handler().handle(&request);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": false, "error": "Decision 'NoSuchDecision' not found"})
    );
}

#[test]
fn test_malformed_document() {
    let request = EvaluationRequest::new("<definitions>", "Decide");
    let response = handler().handle(&request);
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("XML parsing failed"));
}

#[test]
fn test_invalid_expression_reports_compile_error() {
    let document = ELIGIBILITY.replace("&lt; 18", "[1..");
    let request = EvaluationRequest::new(document, "Decide").with_input("age", 30);
    let err = handler().try_handle(&request).unwrap_err();
    assert_eq!(err.phase(), Some(dmn_sdk::EnginePhase::Compile));
    assert!(err.to_string().starts_with("Invalid expression in rule 1 of decision 'Decide'"));
}

#[test]
fn test_requests_are_independent() {
    let handler = handler();
    let adult = EvaluationRequest::new(ELIGIBILITY, "Decide")
        .with_input("age", 40)
        .with_input("country", "FR");
    let minor = EvaluationRequest::new(ELIGIBILITY, "Decide").with_input("age", 10);

    assert!(handler.handle(&adult).success);
    let outputs = handler.handle(&minor).outputs.unwrap();
    assert_eq!(outputs.get("reason"), Some(&dmn_sdk::Value::Text("minor".to_string())));
}

#[test]
fn test_oversized_expression_is_envelope_failure() {
    let expression = vec!["1"; 100_000].join("+");
    let document = format!(
        r#"<definitions xmlns="https://www.omg.org/spec/DMN/20191111/MODEL/" id="d" name="Deep">
  <decision id="d_sum" name="Sum">
    <literalExpression><text>{}</text></literalExpression>
  </decision>
</definitions>"#,
        expression
    );

    // Same stack size as the server's blocking pool
    let response = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || handler().handle(&EvaluationRequest::new(document, "Sum")))
        .unwrap()
        .join()
        .unwrap();

    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.contains("expression nesting too deep"), "unexpected error: {}", error);
}

#[test]
fn test_deeply_parenthesized_input_entry_is_envelope_failure() {
    let entry = format!("{}18{}", "(".repeat(5_000), ")".repeat(5_000));
    let document = ELIGIBILITY.replace("&lt; 18", &entry);
    let response = handler().handle(&EvaluationRequest::new(document, "Decide").with_input("age", 30));

    assert!(!response.success);
    assert!(response.error.unwrap().contains("expression nesting too deep"));
}
