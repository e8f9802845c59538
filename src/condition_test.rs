//! Tests for condition parsing and evaluation.

use crate::condition::{ConditionExpr, ConditionOperator, evaluate};
use crate::condition_parser::parse_condition;
use crate::error::EvaluationError;
use crate::types::{StoryValue, VariableBag};

fn bag(entries: &[(&str, StoryValue)]) -> VariableBag {
  entries
    .iter()
    .map(|(k, v)| (k.to_string(), v.clone()))
    .collect()
}

#[test]
fn gold_threshold_false_when_below() {
  let b = bag(&[("gold", StoryValue::Number(5.0))]);
  assert_eq!(evaluate("gold >= 10", &b), Ok(false));
}

#[test]
fn gold_threshold_errors_when_absent() {
  let b = VariableBag::new();
  assert_eq!(
    evaluate("gold >= 10", &b),
    Err(EvaluationError::UnknownVariable {
      variable_id: "gold".to_string()
    })
  );
}

#[test]
fn word_operators_match_symbolic_ones() {
  let b = bag(&[("gold", StoryValue::Number(12.0)), ("name", "Ada".into())]);
  assert_eq!(evaluate("gold greaterThan 10", &b), Ok(true));
  assert_eq!(evaluate("gold lessThan 10", &b), Ok(false));
  assert_eq!(evaluate("name equals \"Ada\"", &b), Ok(true));
  assert_eq!(evaluate("name notEquals 'Ada'", &b), Ok(false));
}

#[test]
fn includes_on_list_and_text() {
  let b = bag(&[
    ("items", StoryValue::List(vec!["key".into(), "lamp".into()])),
    ("log", "met the guard".into()),
  ]);
  assert_eq!(evaluate("items includes \"key\"", &b), Ok(true));
  assert_eq!(evaluate("items includes \"sword\"", &b), Ok(false));
  assert_eq!(evaluate("log includes 'guard'", &b), Ok(true));
}

#[test]
fn exists_checks_non_null() {
  let b = bag(&[("a", StoryValue::Null), ("b", StoryValue::Bool(false))]);
  assert_eq!(evaluate("exists a", &b), Ok(false));
  assert_eq!(evaluate("exists b", &b), Ok(true));
  assert!(matches!(
    evaluate("exists c", &b),
    Err(EvaluationError::UnknownVariable { .. })
  ));
}

#[test]
fn ordering_on_text_is_type_mismatch() {
  let b = bag(&[("name", "Ada".into())]);
  assert!(matches!(
    evaluate("name > 3", &b),
    Err(EvaluationError::TypeMismatch { found: "string", .. })
  ));
}

#[test]
fn boolean_composition_and_precedence() {
  let b = bag(&[
    ("gold", StoryValue::Number(5.0)),
    ("brave", StoryValue::Bool(true)),
  ]);
  assert_eq!(evaluate("gold > 10 || brave == true && gold < 6", &b), Ok(true));
  assert_eq!(evaluate("(gold > 10 || brave == true) && gold > 6", &b), Ok(false));
  assert_eq!(evaluate("!(gold > 10)", &b), Ok(true));
}

#[test]
fn short_circuit_skips_unknown_variable() {
  let b = bag(&[("gold", StoryValue::Number(5.0))]);
  assert_eq!(evaluate("gold > 10 && missing == 1", &b), Ok(false));
  assert!(evaluate("gold < 10 && missing == 1", &b).is_err());
}

#[test]
fn parse_builds_ast() {
  let expr = parse_condition("hp <= -1.5").unwrap();
  assert_eq!(
    expr,
    ConditionExpr::Compare {
      variable_id: "hp".to_string(),
      operator: ConditionOperator::LessOrEqual,
      value: StoryValue::Number(-1.5),
    }
  );
}

#[test]
fn parse_errors_report_offset() {
  let err = parse_condition("gold >").unwrap_err();
  assert_eq!(err.message, "expected literal value");
  let err = parse_condition("gold > 1 )").unwrap_err();
  assert_eq!(err.offset, 9);
  assert!(parse_condition("").is_err());
  assert!(parse_condition("gold & 1").is_err());
  assert!(parse_condition("name == \"open").is_err());
}

#[test]
fn referenced_variables_in_source_order() {
  let expr = parse_condition("a == 1 && (exists b || !(c includes 'x'))").unwrap();
  assert_eq!(expr.referenced_variables(), vec!["a", "b", "c"]);
}

#[test]
fn single_equals_is_accepted() {
  let b = bag(&[("door", "open".into())]);
  assert_eq!(evaluate("door='open'", &b), Ok(true));
}

#[test]
fn deep_nesting_is_a_parse_error() {
  let nots = format!("{}gold == 1", "!".repeat(200_000));
  let err = parse_condition(&nots).unwrap_err();
  assert!(err.message.contains("nested too deeply"), "{}", err);

  let parens = format!("{}gold == 1{}", "(".repeat(100_000), ")".repeat(100_000));
  assert!(parse_condition(&parens).is_err());
  assert!(evaluate(&parens, &VariableBag::new()).is_err());
}

#[test]
fn nesting_up_to_the_limit_parses() {
  use crate::condition_parser::MAX_NESTING;
  let b = bag(&[("gold", StoryValue::Number(1.0))]);
  let source = format!("{}gold == 1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
  assert_eq!(evaluate(&source, &b), Ok(true));
  let source = format!("{}gold == 1", "!".repeat(MAX_NESTING));
  assert_eq!(evaluate(&source, &b), Ok(true));
}
