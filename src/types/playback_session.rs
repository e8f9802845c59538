//! Per-reader playback session: state, variable bag and step log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PlaybackState, VariableBag};

/// One state entered by a session, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStep {
  /// 1-based step index.
  pub step: u64,
  pub state: PlaybackState,
  /// Number of variable mutations applied on entering this state.
  #[serde(default)]
  pub mutations_applied: usize,
}

/// Analytics event emitted when a session reaches a node or selects a choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
  pub session_id: String,
  pub node_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub choice_id: Option<String>,
}

impl PlaybackEvent {
  pub fn reached(session_id: impl Into<String>, node_id: impl Into<String>) -> Self {
    Self {
      session_id: session_id.into(),
      node_id: node_id.into(),
      choice_id: None,
    }
  }

  pub fn selected(
    session_id: impl Into<String>,
    node_id: impl Into<String>,
    choice_id: impl Into<String>,
  ) -> Self {
    Self {
      session_id: session_id.into(),
      node_id: node_id.into(),
      choice_id: Some(choice_id.into()),
    }
  }
}

/// State owned exclusively by one reading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
  pub session_id: String,
  pub state: PlaybackState,
  pub variables: VariableBag,
  /// Node ids entered, in order (repeats allowed).
  pub visited: Vec<String>,
  /// Number of states entered so far.
  pub step: u64,
  pub log: Vec<PlaybackStep>,
  pub started_at: DateTime<Utc>,
}

impl PlaybackSession {
  pub fn is_finished(&self) -> bool {
    self.state.is_terminal()
  }
}

/// Result of one resolver call: the new resting state plus the events it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  pub state: PlaybackState,
  pub events: Vec<PlaybackEvent>,
}
