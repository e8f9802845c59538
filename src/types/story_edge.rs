//! A directed, optionally conditioned edge in a StoryMap.

use serde::{Deserialize, Serialize};

/// A directed edge between two author node ids. Declared order is significant for routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEdge {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub edge_id: Option<String>,
  pub source_node_id: String,
  pub target_node_id: String,
  /// Textual condition, e.g. `gold >= 10 && has_key == true`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition_expr: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

impl StoryEdge {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      edge_id: None,
      source_node_id: source.into(),
      target_node_id: target.into(),
      condition_expr: None,
      label: None,
    }
  }

  pub fn when(mut self, condition: impl Into<String>) -> Self {
    self.condition_expr = Some(condition.into());
    self
  }

  pub fn is_unconditioned(&self) -> bool {
    self
      .condition_expr
      .as_deref()
      .is_none_or(|c| c.trim().is_empty())
  }
}
