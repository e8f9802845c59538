//! Reach and selection statistics derived from playback events.
//!
//! Counts are over distinct sessions: an event repeated for the same `(session, node)` or
//! `(session, choice)` pair is ignored, so re-delivery and back-navigation never inflate rates.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::trace;

use crate::error::AnalyticsError;
use crate::types::{PlaybackEvent, StoryMap};

/// Per-node line of an [`AnalyticsReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReach {
  pub node_id: String,
  pub sessions: usize,
  pub reach_rate: Option<f64>,
}

/// Per-choice line of an [`AnalyticsReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSelection {
  pub choice_id: String,
  pub node_id: String,
  pub sessions: usize,
  pub selection_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
  /// Distinct sessions that reached the start node.
  pub sessions: usize,
  /// Events ignored as repeats.
  pub duplicates: u64,
  pub nodes: Vec<NodeReach>,
  pub choices: Vec<ChoiceSelection>,
}

/// Aggregates events for one StoryMap. Owns a copy of the ids it needs, so it can live in a
/// background task independently of the graph.
#[derive(Debug, Clone)]
pub struct AnalyticsAggregator {
  start_node_id: Option<String>,
  /// Declared order, for reports.
  node_order: Vec<String>,
  choice_order: Vec<String>,
  known_nodes: HashSet<String>,
  /// choice id -> owning node id.
  choice_owners: HashMap<String, String>,
  reached: HashMap<String, HashSet<String>>,
  selected: HashMap<String, HashSet<String>>,
  duplicates: u64,
}

impl AnalyticsAggregator {
  pub fn new(graph: &StoryMap) -> Self {
    let mut node_order = Vec::with_capacity(graph.nodes.len());
    let mut choice_order = Vec::new();
    let mut known_nodes = HashSet::with_capacity(graph.nodes.len());
    let mut choice_owners = HashMap::new();
    for node in &graph.nodes {
      if !known_nodes.insert(node.node_id.clone()) {
        continue;
      }
      node_order.push(node.node_id.clone());
      for choice in node.choices() {
        if let Entry::Vacant(slot) = choice_owners.entry(choice.choice_id.clone()) {
          slot.insert(node.node_id.clone());
          choice_order.push(choice.choice_id.clone());
        }
      }
    }
    Self {
      start_node_id: graph.find_start().map(|n| n.node_id.clone()),
      node_order,
      choice_order,
      known_nodes,
      choice_owners,
      reached: HashMap::new(),
      selected: HashMap::new(),
      duplicates: 0,
    }
  }

  /// Counts one event. Returns `Ok(false)` when the event repeats a pair already counted.
  pub fn ingest(&mut self, event: &PlaybackEvent) -> Result<bool, AnalyticsError> {
    if !self.known_nodes.contains(&event.node_id) {
      return Err(AnalyticsError::UnknownNode {
        node_id: event.node_id.clone(),
      });
    }
    let fresh = match event.choice_id {
      None => self
        .reached
        .entry(event.node_id.clone())
        .or_default()
        .insert(event.session_id.clone()),
      Some(ref choice_id) => {
        let owner = self.owner_of(choice_id)?;
        if owner != event.node_id {
          return Err(AnalyticsError::ChoiceOwnerMismatch {
            choice_id: choice_id.clone(),
            node_id: event.node_id.clone(),
            owner: owner.to_string(),
          });
        }
        self
          .selected
          .entry(choice_id.clone())
          .or_default()
          .insert(event.session_id.clone())
      }
    };
    if !fresh {
      self.duplicates += 1;
      trace!(session_id = %event.session_id, node_id = %event.node_id, "duplicate event ignored");
    }
    Ok(fresh)
  }

  /// Distinct sessions that reached `node_id`.
  pub fn reach_count(&self, node_id: &str) -> usize {
    self.reached.get(node_id).map_or(0, HashSet::len)
  }

  /// Distinct sessions that selected `choice_id`.
  pub fn selection_count(&self, choice_id: &str) -> usize {
    self.selected.get(choice_id).map_or(0, HashSet::len)
  }

  /// Sessions reaching `node_id` over sessions reaching the start node.
  /// `None` for unknown nodes or when no session has started yet.
  pub fn reach_rate(&self, node_id: &str) -> Option<f64> {
    if !self.known_nodes.contains(node_id) {
      return None;
    }
    let start = self.start_node_id.as_deref()?;
    ratio(self.reach_count(node_id), self.reach_count(start))
  }

  /// Sessions selecting `choice_id` over sessions reaching its owning node.
  pub fn selection_rate(&self, choice_id: &str) -> Option<f64> {
    let owner = self.owner_of(choice_id).ok()?;
    ratio(self.selection_count(choice_id), self.reach_count(owner))
  }

  pub fn report(&self) -> AnalyticsReport {
    AnalyticsReport {
      sessions: self
        .start_node_id
        .as_deref()
        .map_or(0, |s| self.reach_count(s)),
      duplicates: self.duplicates,
      nodes: self
        .node_order
        .iter()
        .map(|id| NodeReach {
          node_id: id.clone(),
          sessions: self.reach_count(id),
          reach_rate: self.reach_rate(id),
        })
        .collect(),
      choices: self
        .choice_order
        .iter()
        .filter_map(|choice_id| self.choice_owners.get(choice_id).map(|owner| (choice_id, owner)))
        .map(|(choice_id, node_id)| ChoiceSelection {
          choice_id: choice_id.clone(),
          node_id: node_id.clone(),
          sessions: self.selection_count(choice_id),
          selection_rate: self.selection_rate(choice_id),
        })
        .collect(),
    }
  }

  fn owner_of(&self, choice_id: &str) -> Result<&str, AnalyticsError> {
    self
      .choice_owners
      .get(choice_id)
      .map(String::as_str)
      .ok_or_else(|| AnalyticsError::UnknownChoice {
        choice_id: choice_id.to_string(),
      })
  }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
  if denominator == 0 {
    None
  } else {
    Some(numerator as f64 / denominator as f64)
  }
}
