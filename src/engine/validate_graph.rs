//! Commit-time structural validation of a StoryMap.

use std::collections::HashSet;

use tracing::instrument;

use crate::condition_parser::parse_condition;
use crate::error::ValidationIssue;
use crate::types::{NodeKind, StoryMap};

/// Validates every structural invariant and returns all issues found, not just the first.
#[instrument(level = "trace", skip(graph), fields(nodes = graph.nodes.len(), edges = graph.edges.len()))]
pub fn validate(graph: &StoryMap) -> Result<(), Vec<ValidationIssue>> {
  let mut issues = Vec::new();
  check_nodes(graph, &mut issues);
  check_start(graph, &mut issues);
  check_edges(graph, &mut issues);
  check_variables(graph, &mut issues);
  check_choices(graph, &mut issues);
  if issues.is_empty() {
    Ok(())
  } else {
    Err(issues)
  }
}

fn check_nodes(graph: &StoryMap, issues: &mut Vec<ValidationIssue>) {
  let mut seen = HashSet::new();
  let mut reported = HashSet::new();
  for (index, node) in graph.nodes.iter().enumerate() {
    if node.node_id.trim().is_empty() {
      issues.push(ValidationIssue::EmptyNodeId { index });
      continue;
    }
    if !seen.insert(node.node_id.as_str()) && reported.insert(node.node_id.as_str()) {
      issues.push(ValidationIssue::DuplicateNodeId {
        node_id: node.node_id.clone(),
      });
    }
    if let NodeKind::Scene(ref p) = node.kind {
      if let Some(ref target) = p.default_next_node_id {
        if !graph.contains_node(target) {
          issues.push(ValidationIssue::MissingDefaultNext {
            node_id: node.node_id.clone(),
            target_node_id: target.clone(),
          });
        }
      }
    }
  }
}

fn check_start(graph: &StoryMap, issues: &mut Vec<ValidationIssue>) {
  let starts: Vec<String> = graph
    .nodes
    .iter()
    .filter(|n| n.is_start())
    .map(|n| n.node_id.clone())
    .collect();
  match starts.len() {
    0 => issues.push(ValidationIssue::MissingStartNode),
    1 => {}
    _ => issues.push(ValidationIssue::MultipleStartNodes { node_ids: starts }),
  }
}

fn check_edges(graph: &StoryMap, issues: &mut Vec<ValidationIssue>) {
  let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.node_id.as_str()).collect();
  for (edge_index, edge) in graph.edges.iter().enumerate() {
    for endpoint in [&edge.source_node_id, &edge.target_node_id] {
      if !ids.contains(endpoint.as_str()) {
        issues.push(ValidationIssue::DanglingEdge {
          edge_index,
          source_node_id: edge.source_node_id.clone(),
          target_node_id: edge.target_node_id.clone(),
          missing_node_id: endpoint.clone(),
        });
      }
    }
    if edge.is_unconditioned() {
      continue;
    }
    if let Some(Err(e)) = edge.condition_expr.as_deref().map(parse_condition) {
      issues.push(ValidationIssue::InvalidCondition {
        edge_index,
        message: e.to_string(),
      });
    }
  }
}

/// Unset slots never collide; only real ids are checked for uniqueness.
fn check_variables(graph: &StoryMap, issues: &mut Vec<ValidationIssue>) {
  let mut seen = HashSet::new();
  let mut reported = HashSet::new();
  for (id, _) in graph.declared_variables() {
    if !seen.insert(id) && reported.insert(id) {
      issues.push(ValidationIssue::DuplicateVariableId {
        variable_id: id.to_string(),
      });
    }
  }
}

fn check_choices(graph: &StoryMap, issues: &mut Vec<ValidationIssue>) {
  let mut seen = HashSet::new();
  for node in &graph.nodes {
    let NodeKind::Choice(ref payload) = node.kind else {
      continue;
    };
    if payload.choices.is_empty() {
      issues.push(ValidationIssue::EmptyChoiceNode {
        node_id: node.node_id.clone(),
      });
    }
    if let Some(ref default_id) = payload.default_choice_id {
      if payload.choice(default_id).is_none() {
        issues.push(ValidationIssue::UnknownDefaultChoice {
          node_id: node.node_id.clone(),
          choice_id: default_id.clone(),
        });
      }
    }
    for choice in &payload.choices {
      if !seen.insert(choice.choice_id.as_str()) {
        issues.push(ValidationIssue::DuplicateChoiceId {
          choice_id: choice.choice_id.clone(),
        });
      }
      if !graph.contains_node(&choice.target_node_id) {
        issues.push(ValidationIssue::MissingChoiceTarget {
          choice_id: choice.choice_id.clone(),
          target_node_id: choice.target_node_id.clone(),
        });
      }
      for action in &choice.actions {
        if !graph.declares_variable(&action.variable_id) {
          issues.push(ValidationIssue::UnknownMutationVariable {
            choice_id: choice.choice_id.clone(),
            variable_id: action.variable_id.clone(),
          });
        }
      }
    }
  }
}
