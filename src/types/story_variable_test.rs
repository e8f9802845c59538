//! Tests for `StoryVariable` and `VariableSlot`.

use super::{StoryValue, StoryVariable, VariableSlot, VariableType};

#[test]
fn sentinel_ids_deserialize_to_unset() {
  for raw in [
    r#"{"variableId": "", "type": "number"}"#,
    r#"{"variableId": "null", "type": "number"}"#,
    r#"{"variableId": "undefined", "type": "number"}"#,
    r#"{"variableId": "  ", "type": "number"}"#,
    r#"{"variableId": null, "type": "number"}"#,
    r#"{"type": "number"}"#,
  ] {
    let v: StoryVariable = serde_json::from_str(raw).unwrap();
    assert_eq!(v.variable_id, VariableSlot::Unset, "input: {}", raw);
  }
}

#[test]
fn real_id_is_kept() {
  let v: StoryVariable =
    serde_json::from_str(r#"{"variableId": "gold", "name": "Gold", "type": "number", "initialValue": 5}"#)
      .unwrap();
  assert_eq!(v.variable_id.id(), Some("gold"));
  assert_eq!(v.name, "Gold");
  assert_eq!(v.initial_value, StoryValue::Number(5.0));
}

#[test]
fn unset_serializes_as_null() {
  let v = StoryVariable {
    variable_id: VariableSlot::Unset,
    name: "orphan".to_string(),
    var_type: VariableType::Boolean,
    initial_value: StoryValue::Null,
  };
  let json = serde_json::to_value(&v).unwrap();
  assert!(json["variableId"].is_null());
  assert_eq!(json["type"], "boolean");
}

#[test]
fn type_accepts_matching_values_and_null() {
  assert!(VariableType::Number.accepts(&StoryValue::Number(1.0)));
  assert!(VariableType::Number.accepts(&StoryValue::Null));
  assert!(!VariableType::Number.accepts(&StoryValue::Bool(true)));
  assert!(VariableType::List.accepts(&StoryValue::List(vec![])));
}
