//! The StoryMap aggregate: nodes, edges and variables of one episode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Choice, ChoicePayload, NodeKind, StoryEdge, StoryNode, StoryVariable, VariableBag};

/// Branching-narrative graph of one episode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMap {
  #[serde(default)]
  pub nodes: Vec<StoryNode>,
  #[serde(default)]
  pub edges: Vec<StoryEdge>,
  #[serde(default)]
  pub story_variables: Vec<StoryVariable>,
}

impl StoryMap {
  pub fn new(nodes: Vec<StoryNode>, edges: Vec<StoryEdge>, story_variables: Vec<StoryVariable>) -> Self {
    Self {
      nodes,
      edges,
      story_variables,
    }
  }

  /// Map created when an episode is initialized: a lone start node.
  pub fn initial() -> Self {
    Self::new(vec![StoryNode::start("start")], vec![], vec![])
  }

  pub fn node(&self, node_id: &str) -> Option<&StoryNode> {
    self.nodes.iter().find(|n| n.node_id == node_id)
  }

  pub fn contains_node(&self, node_id: &str) -> bool {
    self.node(node_id).is_some()
  }

  /// The start node, if there is exactly one.
  pub fn find_start(&self) -> Option<&StoryNode> {
    let mut starts = self.nodes.iter().filter(|n| n.is_start());
    match (starts.next(), starts.next()) {
      (Some(s), None) => Some(s),
      _ => None,
    }
  }

  /// Outgoing edges of `node_id` in declared order.
  pub fn outgoing_edges(&self, node_id: &str) -> Vec<&StoryEdge> {
    self
      .edges
      .iter()
      .filter(|e| e.source_node_id == node_id)
      .collect()
  }

  /// Finds a choice option anywhere in the map, with its owning node.
  pub fn find_choice(&self, choice_id: &str) -> Option<(&StoryNode, &Choice)> {
    self.nodes.iter().find_map(|n| {
      n.choices()
        .iter()
        .find(|c| c.choice_id == choice_id)
        .map(|c| (n, c))
    })
  }

  pub fn choice_payload(&self, node_id: &str) -> Option<&ChoicePayload> {
    match self.node(node_id)?.kind {
      NodeKind::Choice(ref p) => Some(p),
      _ => None,
    }
  }

  /// Declarations with a real id; unset slots are skipped.
  pub fn declared_variables(&self) -> impl Iterator<Item = (&str, &StoryVariable)> {
    self
      .story_variables
      .iter()
      .filter_map(|v| v.variable_id.id().map(|id| (id, v)))
  }

  pub fn declares_variable(&self, variable_id: &str) -> bool {
    self.declared_variables().any(|(id, _)| id == variable_id)
  }

  /// Variable bag a new reading session starts with. First declaration wins on duplicate ids.
  pub fn initial_bag(&self) -> VariableBag {
    let mut bag = VariableBag::new();
    for (id, v) in self.declared_variables() {
      bag
        .entry(id.to_string())
        .or_insert_with(|| v.initial_value.clone());
    }
    bag
  }

  /// Index of node ids to their position in `nodes` (first occurrence wins).
  pub fn node_index(&self) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(self.nodes.len());
    for (i, n) in self.nodes.iter().enumerate() {
      index.entry(n.node_id.as_str()).or_insert(i);
    }
    index
  }
}
