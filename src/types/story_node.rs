//! A node in a StoryMap.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Choice;

/// Editor canvas position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Payload of a scene node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePayload {
  /// Externally-owned Scene content this node displays.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scene_id: Option<String>,
  /// Node followed when the reader continues; takes precedence over outgoing edges.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_next_node_id: Option<String>,
}

/// Payload of a choice node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoicePayload {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub prompt: Option<String>,
  #[serde(default)]
  pub choices: Vec<Choice>,
  /// Option applied when a timed choice expires. Falls back to the first option.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_choice_id: Option<String>,
}

impl ChoicePayload {
  pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
    self.choices.iter().find(|c| c.choice_id == choice_id)
  }

  /// Smallest time limit among the options, if any option is timed.
  pub fn time_limit_seconds(&self) -> Option<u32> {
    self.choices.iter().filter_map(|c| c.time_limit_seconds).min()
  }

  /// Option applied on expiry.
  pub fn default_choice(&self) -> Option<&Choice> {
    match self.default_choice_id {
      Some(ref id) => self.choice(id),
      None => self.choices.first(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndingType {
  Good,
  Bad,
  #[default]
  Neutral,
  Secret,
}

/// Payload of an ending node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingPayload {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default)]
  pub ending_type: EndingType,
}

/// Kind-specific part of a node. Serialized as a `kind` tag next to the node's base fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
  Start,
  Scene(ScenePayload),
  Choice(ChoicePayload),
  Branch,
  Ending(EndingPayload),
}

impl NodeKind {
  pub fn name(&self) -> &'static str {
    match self {
      NodeKind::Start => "start",
      NodeKind::Scene(_) => "scene",
      NodeKind::Choice(_) => "choice",
      NodeKind::Branch => "branch",
      NodeKind::Ending(_) => "ending",
    }
  }
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A node in a StoryMap. `node_id` is assigned by the author and survives re-saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryNode {
  pub node_id: String,
  #[serde(default)]
  pub position: Position,
  #[serde(flatten)]
  pub kind: NodeKind,
}

impl StoryNode {
  pub fn new(node_id: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      node_id: node_id.into(),
      position: Position::default(),
      kind,
    }
  }

  pub fn start(node_id: impl Into<String>) -> Self {
    Self::new(node_id, NodeKind::Start)
  }

  pub fn scene(node_id: impl Into<String>, default_next_node_id: Option<&str>) -> Self {
    Self::new(
      node_id,
      NodeKind::Scene(ScenePayload {
        scene_id: None,
        default_next_node_id: default_next_node_id.map(String::from),
      }),
    )
  }

  pub fn choice(node_id: impl Into<String>, choices: Vec<Choice>) -> Self {
    Self::new(
      node_id,
      NodeKind::Choice(ChoicePayload {
        prompt: None,
        choices,
        default_choice_id: None,
      }),
    )
  }

  pub fn branch(node_id: impl Into<String>) -> Self {
    Self::new(node_id, NodeKind::Branch)
  }

  pub fn ending(node_id: impl Into<String>) -> Self {
    Self::new(node_id, NodeKind::Ending(EndingPayload::default()))
  }

  pub fn is_start(&self) -> bool {
    matches!(self.kind, NodeKind::Start)
  }

  pub fn is_ending(&self) -> bool {
    matches!(self.kind, NodeKind::Ending(_))
  }

  pub fn choices(&self) -> &[Choice] {
    match self.kind {
      NodeKind::Choice(ref p) => &p.choices,
      _ => &[],
    }
  }
}
