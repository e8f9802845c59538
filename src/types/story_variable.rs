//! Author-declared story variables and the unset-slot rule for their ids.

use serde::{Deserialize, Serialize};

use super::StoryValue;

/// Raw ids that mark an unset slot rather than a real variable id.
const UNSET_SENTINELS: [&str; 3] = ["", "null", "undefined"];

/// Identity of a story variable.
///
/// Documents written by older editors carry `""`, `"null"` or `"undefined"` (or no id at all)
/// for variables that were never named. Those deserialize to [`VariableSlot::Unset`], which is
/// excluded from uniqueness checks and never seeded into a reading session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum VariableSlot {
  #[default]
  Unset,
  Id(String),
}

impl VariableSlot {
  pub fn id(&self) -> Option<&str> {
    match self {
      VariableSlot::Id(id) => Some(id.as_str()),
      VariableSlot::Unset => None,
    }
  }

  pub fn is_unset(&self) -> bool {
    matches!(self, VariableSlot::Unset)
  }
}

impl From<Option<String>> for VariableSlot {
  fn from(raw: Option<String>) -> Self {
    match raw {
      Some(s) if !UNSET_SENTINELS.contains(&s.trim()) => VariableSlot::Id(s.trim().to_string()),
      _ => VariableSlot::Unset,
    }
  }
}

impl From<VariableSlot> for Option<String> {
  fn from(slot: VariableSlot) -> Self {
    match slot {
      VariableSlot::Id(id) => Some(id),
      VariableSlot::Unset => None,
    }
  }
}

impl From<&str> for VariableSlot {
  fn from(raw: &str) -> Self {
    VariableSlot::from(Some(raw.to_string()))
  }
}

/// Declared type of a story variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
  Boolean,
  Number,
  String,
  List,
}

impl VariableType {
  /// Returns true if `value` may be stored in a variable of this type. Null is always accepted.
  pub fn accepts(&self, value: &StoryValue) -> bool {
    matches!(
      (self, value),
      (_, StoryValue::Null)
        | (VariableType::Boolean, StoryValue::Bool(_))
        | (VariableType::Number, StoryValue::Number(_))
        | (VariableType::String, StoryValue::Text(_))
        | (VariableType::List, StoryValue::List(_))
    )
  }
}

/// A variable declared on a StoryMap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryVariable {
  #[serde(default)]
  pub variable_id: VariableSlot,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "type")]
  pub var_type: VariableType,
  #[serde(default)]
  pub initial_value: StoryValue,
}

impl StoryVariable {
  pub fn new(
    variable_id: impl Into<String>,
    var_type: VariableType,
    initial_value: impl Into<StoryValue>,
  ) -> Self {
    let id = variable_id.into();
    Self {
      name: id.clone(),
      variable_id: VariableSlot::from(id.as_str()),
      var_type,
      initial_value: initial_value.into(),
    }
  }
}
