//! Pre-publish lint: authoring mistakes that do not block a commit.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::condition_parser::parse_condition;
use crate::types::{NodeKind, StoryMap};

/// A non-fatal authoring problem reported to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LintWarning {
  /// Reading sessions will hit an evaluation error on this edge.
  ConditionUnknownVariable { edge_index: usize, variable_id: String },
  UnreachableNode { node_id: String },
  /// A scene with no default next node and no outgoing edge.
  DeadEndScene { node_id: String },
  /// A variable declaration whose id is empty, `"null"` or `"undefined"`.
  UnsetVariableSlot { index: usize, name: String },
  InitialValueTypeMismatch { variable_id: String },
  /// A timed choice node that will fall back to its first option on expiry.
  TimedChoiceWithoutDefault { node_id: String },
}

impl fmt::Display for LintWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LintWarning::ConditionUnknownVariable {
        edge_index,
        variable_id,
      } => write!(f, "edge {} tests undeclared variable '{}'", edge_index, variable_id),
      LintWarning::UnreachableNode { node_id } => write!(f, "node '{}' is unreachable", node_id),
      LintWarning::DeadEndScene { node_id } => write!(f, "scene '{}' has no way forward", node_id),
      LintWarning::UnsetVariableSlot { index, name } => {
        write!(f, "variable #{} ('{}') has no id", index, name)
      }
      LintWarning::InitialValueTypeMismatch { variable_id } => {
        write!(f, "variable '{}' starts with a value of the wrong type", variable_id)
      }
      LintWarning::TimedChoiceWithoutDefault { node_id } => {
        write!(f, "timed choice '{}' has no default option", node_id)
      }
    }
  }
}

/// Lints a StoryMap. Assumes nothing about structural validity.
pub fn lint(graph: &StoryMap) -> Vec<LintWarning> {
  let mut warnings = Vec::new();

  for (edge_index, edge) in graph.edges.iter().enumerate() {
    if edge.is_unconditioned() {
      continue;
    }
    let Some(Ok(expr)) = edge.condition_expr.as_deref().map(parse_condition) else {
      continue;
    };
    for variable_id in expr.referenced_variables() {
      if !graph.declares_variable(variable_id) {
        warnings.push(LintWarning::ConditionUnknownVariable {
          edge_index,
          variable_id: variable_id.to_string(),
        });
      }
    }
  }

  let reachable = reachable_from_start(graph);
  for node in &graph.nodes {
    if !reachable.contains(node.node_id.as_str()) {
      warnings.push(LintWarning::UnreachableNode {
        node_id: node.node_id.clone(),
      });
    }
    match node.kind {
      NodeKind::Scene(ref p) => {
        if p.default_next_node_id.is_none() && graph.outgoing_edges(&node.node_id).is_empty() {
          warnings.push(LintWarning::DeadEndScene {
            node_id: node.node_id.clone(),
          });
        }
      }
      NodeKind::Choice(ref p) => {
        if p.time_limit_seconds().is_some() && p.default_choice_id.is_none() {
          warnings.push(LintWarning::TimedChoiceWithoutDefault {
            node_id: node.node_id.clone(),
          });
        }
      }
      _ => {}
    }
  }

  for (index, v) in graph.story_variables.iter().enumerate() {
    match v.variable_id.id() {
      None => warnings.push(LintWarning::UnsetVariableSlot {
        index,
        name: v.name.clone(),
      }),
      Some(id) => {
        if !v.var_type.accepts(&v.initial_value) {
          warnings.push(LintWarning::InitialValueTypeMismatch {
            variable_id: id.to_string(),
          });
        }
      }
    }
  }

  warnings
}

/// Node ids reachable from the start node through edges, scene defaults and choice targets.
fn reachable_from_start(graph: &StoryMap) -> HashSet<&str> {
  let mut seen = HashSet::new();
  let mut queue: VecDeque<&str> = graph
    .nodes
    .iter()
    .filter(|n| n.is_start())
    .map(|n| n.node_id.as_str())
    .collect();
  while let Some(id) = queue.pop_front() {
    if !seen.insert(id) {
      continue;
    }
    for e in graph.outgoing_edges(id) {
      queue.push_back(e.target_node_id.as_str());
    }
    if let Some(node) = graph.node(id) {
      match node.kind {
        NodeKind::Scene(ref p) => {
          if let Some(ref next) = p.default_next_node_id {
            queue.push_back(next.as_str());
          }
        }
        NodeKind::Choice(ref p) => {
          for c in &p.choices {
            queue.push_back(c.target_node_id.as_str());
          }
        }
        _ => {}
      }
    }
  }
  seen
}
