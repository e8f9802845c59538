//! Reader-selectable options attached to choice nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StoryValue;

/// Operation a [`VariableMutation`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
  Set,
  Add,
  Subtract,
  Toggle,
}

impl fmt::Display for MutationOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MutationOp::Set => write!(f, "set"),
      MutationOp::Add => write!(f, "add"),
      MutationOp::Subtract => write!(f, "subtract"),
      MutationOp::Toggle => write!(f, "toggle"),
    }
  }
}

/// One change to a story variable, applied when a choice is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMutation {
  pub variable_id: String,
  pub operation: MutationOp,
  /// Ignored by `toggle`.
  #[serde(default)]
  pub value: StoryValue,
}

impl VariableMutation {
  pub fn new(variable_id: impl Into<String>, operation: MutationOp, value: impl Into<StoryValue>) -> Self {
    Self {
      variable_id: variable_id.into(),
      operation,
      value: value.into(),
    }
  }
}

/// A single option offered by a choice node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
  pub choice_id: String,
  #[serde(default)]
  pub text: String,
  /// Applied in order, as one all-or-nothing batch.
  #[serde(default)]
  pub actions: Vec<VariableMutation>,
  pub target_node_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_limit_seconds: Option<u32>,
}

impl Choice {
  pub fn new(
    choice_id: impl Into<String>,
    text: impl Into<String>,
    target_node_id: impl Into<String>,
  ) -> Self {
    Self {
      choice_id: choice_id.into(),
      text: text.into(),
      actions: vec![],
      target_node_id: target_node_id.into(),
      time_limit_seconds: None,
    }
  }

  pub fn with_action(mut self, action: VariableMutation) -> Self {
    self.actions.push(action);
    self
  }

  pub fn with_time_limit(mut self, seconds: u32) -> Self {
    self.time_limit_seconds = Some(seconds);
    self
  }
}
