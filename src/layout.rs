//! Deterministic auto-layout of StoryMap nodes for the editor canvas.
//!
//! Kahn-style layering over an arena of node indices: layer 0 holds nodes with no incoming
//! edges; removing a layer's outgoing edges releases the next layer. Nodes that never reach
//! in-degree zero (cycle members and whatever only a cycle feeds) form one trailing layer, so
//! cyclic graphs terminate.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{Position, StoryEdge, StoryNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutAlgorithm {
  /// Layers run left to right.
  #[default]
  Layered,
  /// Layers run top to bottom.
  LayeredVertical,
}

impl FromStr for LayoutAlgorithm {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "layered" | "horizontal" => Ok(LayoutAlgorithm::Layered),
      "layeredvertical" | "layered-vertical" | "vertical" => Ok(LayoutAlgorithm::LayeredVertical),
      other => Err(format!("unknown layout algorithm '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
  pub algorithm: LayoutAlgorithm,
  pub column_gap: f64,
  pub row_gap: f64,
}

impl Default for LayoutOptions {
  fn default() -> Self {
    Self {
      algorithm: LayoutAlgorithm::Layered,
      column_gap: 250.0,
      row_gap: 150.0,
    }
  }
}

/// Groups node indices into layers. `edges` are `(source, target)` indices into the node arena;
/// indices outside `0..node_count` are ignored.
pub fn compute_layers(node_count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
  let mut in_degree = vec![0usize; node_count];
  let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
  for &(s, t) in edges {
    if s < node_count && t < node_count {
      in_degree[t] += 1;
      outgoing[s].push(t);
    }
  }

  let mut placed = vec![false; node_count];
  let mut layers: Vec<Vec<usize>> = Vec::new();
  let mut current: Vec<usize> = (0..node_count).filter(|&i| in_degree[i] == 0).collect();

  while !current.is_empty() {
    let mut next = Vec::new();
    for &n in &current {
      placed[n] = true;
      for &t in &outgoing[n] {
        in_degree[t] -= 1;
        if in_degree[t] == 0 {
          next.push(t);
        }
      }
    }
    layers.push(current);
    next.sort_unstable();
    next.dedup();
    current = next;
  }

  let stuck: Vec<usize> = (0..node_count).filter(|&i| !placed[i]).collect();
  if !stuck.is_empty() {
    layers.push(stuck);
  }
  layers
}

/// Layers of author node ids, in the order [`autolayout`] places them.
pub fn layer_ids(nodes: &[StoryNode], edges: &[StoryEdge]) -> Vec<Vec<String>> {
  compute_layers(nodes.len(), &edge_indices(nodes, edges))
    .into_iter()
    .map(|layer| layer.into_iter().map(|i| nodes[i].node_id.clone()).collect())
    .collect()
}

/// Returns copies of `nodes` (input order preserved) with layout positions assigned.
#[instrument(level = "trace", skip(nodes, edges), fields(nodes = nodes.len(), edges = edges.len()))]
pub fn autolayout(nodes: &[StoryNode], edges: &[StoryEdge], options: &LayoutOptions) -> Vec<StoryNode> {
  let layers = compute_layers(nodes.len(), &edge_indices(nodes, edges));
  let mut out = nodes.to_vec();
  for (layer_index, layer) in layers.iter().enumerate() {
    for (row, &i) in layer.iter().enumerate() {
      let along = layer_index as f64 * options.column_gap;
      let across = row as f64 * options.row_gap;
      out[i].position = match options.algorithm {
        LayoutAlgorithm::Layered => Position::new(along, across),
        LayoutAlgorithm::LayeredVertical => Position::new(across, along),
      };
    }
  }
  out
}

/// Resolves edge endpoints to arena indices; edges naming unknown nodes are dropped.
fn edge_indices(nodes: &[StoryNode], edges: &[StoryEdge]) -> Vec<(usize, usize)> {
  let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
  for (i, n) in nodes.iter().enumerate() {
    index.entry(n.node_id.as_str()).or_insert(i);
  }
  edges
    .iter()
    .filter_map(|e| {
      Some((
        *index.get(e.source_node_id.as_str())?,
        *index.get(e.target_node_id.as_str())?,
      ))
    })
    .collect()
}
