//! Error types for every storyweave component.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// A structural problem that makes a StoryMap uncommittable. Each variant names the offending ids.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ValidationIssue {
  #[error("node at index {index} has an empty nodeId")]
  EmptyNodeId { index: usize },
  #[error("duplicate nodeId '{node_id}'")]
  DuplicateNodeId { node_id: String },
  #[error("story map has no start node")]
  MissingStartNode,
  #[error("story map has more than one start node: {node_ids:?}")]
  MultipleStartNodes { node_ids: Vec<String> },
  #[error("edge {edge_index} ({source_node_id} -> {target_node_id}) references missing node '{missing_node_id}'")]
  DanglingEdge {
    edge_index: usize,
    source_node_id: String,
    target_node_id: String,
    missing_node_id: String,
  },
  #[error("duplicate variableId '{variable_id}'")]
  DuplicateVariableId { variable_id: String },
  #[error("choice '{choice_id}' targets missing node '{target_node_id}'")]
  MissingChoiceTarget {
    choice_id: String,
    target_node_id: String,
  },
  #[error("duplicate choiceId '{choice_id}'")]
  DuplicateChoiceId { choice_id: String },
  #[error("choice node '{node_id}' offers no choices")]
  EmptyChoiceNode { node_id: String },
  #[error("choice '{choice_id}' mutates undeclared variable '{variable_id}'")]
  UnknownMutationVariable {
    choice_id: String,
    variable_id: String,
  },
  #[error("scene '{node_id}' defaults to missing node '{target_node_id}'")]
  MissingDefaultNext {
    node_id: String,
    target_node_id: String,
  },
  #[error("choice node '{node_id}' defaults to unknown choice '{choice_id}'")]
  UnknownDefaultChoice { node_id: String, choice_id: String },
  #[error("edge {edge_index} has an invalid condition: {message}")]
  InvalidCondition { edge_index: usize, message: String },
}

/// GraphStore failures.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("no active story map for episode '{episode_id}'")]
  NotFound { episode_id: String },
  #[error("episode '{episode_id}' already exists")]
  AlreadyExists { episode_id: String },
  #[error("story map rejected with {} issue(s): {}", .0.len(), join_issues(.0))]
  Validation(Vec<ValidationIssue>),
  #[error("version conflict on episode '{episode_id}': expected base {expected}, active is {actual}")]
  Conflict {
    episode_id: String,
    expected: u64,
    actual: u64,
  },
  #[error("store I/O failed: {0}")]
  Io(#[from] std::io::Error),
  #[error("store snapshot is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// Session checkpoint read/write failures, tagged with the file involved.
#[derive(Debug, Error)]
pub enum SessionIoError {
  #[error("session file {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("session file {} is not a valid session: {source}", .path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
  issues
    .iter()
    .map(|i| i.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}

/// A condition expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct ConditionParseError {
  pub message: String,
  pub offset: usize,
}

impl ConditionParseError {
  pub fn new(message: impl Into<String>, offset: usize) -> Self {
    Self {
      message: message.into(),
      offset,
    }
  }
}

/// Condition evaluation failures. Never coerced to `false`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
  #[error("condition references unknown variable '{variable_id}'")]
  UnknownVariable { variable_id: String },
  #[error("'{operator}' cannot compare variable '{variable_id}' of type {found}")]
  TypeMismatch {
    variable_id: String,
    operator: String,
    found: &'static str,
  },
  #[error("invalid condition: {0}")]
  Parse(#[from] ConditionParseError),
}

/// Failures applying a choice's mutation batch. Any of these rejects the whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
  #[error("mutation targets unknown variable '{variable_id}'")]
  UnknownVariable { variable_id: String },
  #[error("cannot {operation} variable '{variable_id}' holding {found} with {value_type}")]
  TypeMismatch {
    variable_id: String,
    operation: String,
    found: &'static str,
    value_type: &'static str,
  },
}

/// PlaybackResolver failures. The session is left at its last good state for every variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
  #[error("story map has no unique start node")]
  NoStartNode,
  #[error("node '{node_id}' does not exist")]
  NodeNotFound { node_id: String },
  #[error("cannot {action} while {state}")]
  InvalidState { action: &'static str, state: String },
  #[error("choice '{choice_id}' is not offered at node '{node_id}'")]
  ChoiceNotFound { node_id: String, choice_id: String },
  #[error("choice rejected: {0}")]
  Mutation(#[from] MutationError),
  #[error("no outgoing edge of '{node_id}' qualifies")]
  UnresolvedBranch { node_id: String },
  #[error("story error at '{node_id}': {source}")]
  Story {
    node_id: String,
    #[source]
    source: EvaluationError,
  },
  #[error("passed through {limit} nodes without reaching a scene, choice or ending (last: '{node_id}')")]
  AutoStepLimit { node_id: String, limit: usize },
  #[error("timer {token} is stale")]
  StaleTimer { token: u64 },
}

/// Analytics ingestion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
  #[error("event references unknown node '{node_id}'")]
  UnknownNode { node_id: String },
  #[error("event references unknown choice '{choice_id}'")]
  UnknownChoice { choice_id: String },
  #[error("choice '{choice_id}' belongs to '{owner}', not '{node_id}'")]
  ChoiceOwnerMismatch {
    choice_id: String,
    node_id: String,
    owner: String,
  },
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("invalid value '{value}' for {key}: {reason}")]
  Invalid {
    key: String,
    value: String,
    reason: String,
  },
}

/// Delivery read-path failures.
#[derive(Debug, Error)]
pub enum DeliveryError {
  #[error("node '{node_id}' does not exist")]
  NodeNotFound { node_id: String },
  #[error("scene content source failed: {message}")]
  Source { message: String },
  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Failures of [`StoryServices`](crate::services::StoryServices) operations spanning components.
#[derive(Debug, Error)]
pub enum ServiceError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Playback(#[from] PlaybackError),
}
