//! Tests for `StoryValue`.

use super::StoryValue;

#[test]
fn deserializes_untagged_json() {
  let v: Vec<StoryValue> = serde_json::from_str(r#"[null, true, 3.5, "gold", [1, "a"]]"#).unwrap();
  assert_eq!(v[0], StoryValue::Null);
  assert_eq!(v[1], StoryValue::Bool(true));
  assert_eq!(v[2], StoryValue::Number(3.5));
  assert_eq!(v[3], StoryValue::Text("gold".to_string()));
  assert_eq!(
    v[4],
    StoryValue::List(vec![StoryValue::Number(1.0), StoryValue::Text("a".to_string())])
  );
}

#[test]
fn integers_become_numbers() {
  let v: StoryValue = serde_json::from_str("10").unwrap();
  assert_eq!(v.as_number(), Some(10.0));
}

#[test]
fn includes_list_and_substring() {
  let list = StoryValue::List(vec!["key".into(), "map".into()]);
  assert_eq!(list.includes(&"key".into()), Some(true));
  assert_eq!(list.includes(&"sword".into()), Some(false));
  let text = StoryValue::from("a rusty key");
  assert_eq!(text.includes(&"rusty".into()), Some(true));
  assert_eq!(StoryValue::Number(1.0).includes(&"1".into()), None);
}

#[test]
fn display_formats() {
  assert_eq!(StoryValue::Null.to_string(), "null");
  assert_eq!(StoryValue::from("x").to_string(), "\"x\"");
  assert_eq!(
    StoryValue::List(vec![1i64.into(), true.into()]).to_string(),
    "[1, true]"
  );
}

#[test]
fn type_names() {
  assert_eq!(StoryValue::Bool(false).type_name(), "boolean");
  assert_eq!(StoryValue::List(vec![]).type_name(), "list");
}
