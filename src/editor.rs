//! Editor write path: mutate a draft StoryMap, then commit it against its base version.
//!
//! The editor never validates; the draft is checked as a whole by
//! [`GraphStore::commit_version`](crate::store::GraphStore::commit_version).

use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::layout::{self, LayoutAlgorithm, LayoutOptions};
use crate::store::{CommitReceipt, GraphStore, StoryMapVersion};
use crate::types::{Position, StoryEdge, StoryMap, StoryNode, StoryVariable};

#[derive(Debug, Clone)]
pub struct StoryMapEditor {
  base_version: u64,
  draft: StoryMap,
  layout: LayoutOptions,
}

impl StoryMapEditor {
  pub fn new(base_version: u64, graph: StoryMap) -> Self {
    Self {
      base_version,
      draft: graph,
      layout: LayoutOptions::default(),
    }
  }

  /// Starts editing from a stored version.
  pub fn from_version(version: &StoryMapVersion) -> Self {
    Self::new(version.version, version.graph.clone())
  }

  pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
    self.layout = layout;
    self
  }

  pub fn base_version(&self) -> u64 {
    self.base_version
  }

  pub fn draft(&self) -> &StoryMap {
    &self.draft
  }

  /// Inserts `node`, or replaces the node with the same id in place. Returns true on replace.
  pub fn upsert_node(&mut self, node: StoryNode) -> bool {
    match self.draft.nodes.iter_mut().find(|n| n.node_id == node.node_id) {
      Some(existing) => {
        *existing = node;
        true
      }
      None => {
        self.draft.nodes.push(node);
        false
      }
    }
  }

  /// Removes a node and every edge touching it. Choices still targeting it are left for
  /// commit validation to report.
  pub fn remove_node(&mut self, node_id: &str) -> Option<StoryNode> {
    let index = self.draft.nodes.iter().position(|n| n.node_id == node_id)?;
    let removed = self.draft.nodes.remove(index);
    let before = self.draft.edges.len();
    self
      .draft
      .edges
      .retain(|e| e.source_node_id != node_id && e.target_node_id != node_id);
    debug!(node_id, edges_removed = before - self.draft.edges.len(), "node removed");
    Some(removed)
  }

  pub fn set_position(&mut self, node_id: &str, position: Position) -> bool {
    match self.draft.nodes.iter_mut().find(|n| n.node_id == node_id) {
      Some(node) => {
        node.position = position;
        true
      }
      None => false,
    }
  }

  /// Appends `edge`, assigning a fresh id when it has none. Returns the edge id.
  pub fn add_edge(&mut self, mut edge: StoryEdge) -> String {
    let edge_id = edge
      .edge_id
      .get_or_insert_with(|| Uuid::new_v4().to_string())
      .clone();
    self.draft.edges.push(edge);
    edge_id
  }

  pub fn remove_edge(&mut self, edge_id: &str) -> Option<StoryEdge> {
    let index = self
      .draft
      .edges
      .iter()
      .position(|e| e.edge_id.as_deref() == Some(edge_id))?;
    Some(self.draft.edges.remove(index))
  }

  /// Removes every edge from `source` to `target`. Returns how many were removed.
  pub fn disconnect(&mut self, source: &str, target: &str) -> usize {
    let before = self.draft.edges.len();
    self
      .draft
      .edges
      .retain(|e| !(e.source_node_id == source && e.target_node_id == target));
    before - self.draft.edges.len()
  }

  /// Replaces the declaration with the same id, or appends. Unset slots are always appended.
  pub fn upsert_variable(&mut self, variable: StoryVariable) -> bool {
    let existing = variable.variable_id.id().and_then(|id| {
      self
        .draft
        .story_variables
        .iter()
        .position(|v| v.variable_id.id() == Some(id))
    });
    match existing {
      Some(index) => {
        self.draft.story_variables[index] = variable;
        true
      }
      None => {
        self.draft.story_variables.push(variable);
        false
      }
    }
  }

  pub fn remove_variable(&mut self, variable_id: &str) -> Option<StoryVariable> {
    let index = self
      .draft
      .story_variables
      .iter()
      .position(|v| v.variable_id.id() == Some(variable_id))?;
    Some(self.draft.story_variables.remove(index))
  }

  /// Repositions every node of the draft with `algorithm` and the editor's gaps.
  pub fn autolayout(&mut self, algorithm: LayoutAlgorithm) {
    let options = LayoutOptions {
      algorithm,
      ..self.layout.clone()
    };
    self.draft.nodes = layout::autolayout(&self.draft.nodes, &self.draft.edges, &options);
  }

  /// `(base_version, graph)` ready for `commit_version`.
  pub fn into_commit(self) -> (u64, StoryMap) {
    (self.base_version, self.draft)
  }

  /// Commits the draft to `store` against the base version it was opened from.
  pub async fn commit(
    self,
    store: &GraphStore,
    episode_id: &str,
  ) -> Result<CommitReceipt, StoreError> {
    let (base, graph) = self.into_commit();
    store.commit_version(episode_id, base, graph).await
  }
}
