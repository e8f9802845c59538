//! States of the playback state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deadline attached to a timed choice. `token` identifies the wait it was armed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDeadline {
  pub token: u64,
  pub limit_seconds: u32,
  pub default_choice_id: String,
}

/// Playback state of one reading session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlaybackState {
  /// Showing a scene (or the start node); the reader continues with `advance`.
  AtScene { node_id: String },
  /// Waiting for the reader to pick an option of a choice node.
  AwaitingChoice {
    node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deadline: Option<ChoiceDeadline>,
  },
  /// Applying a selected option. Only ever recorded in the step log.
  Resolving { node_id: String, choice_id: String },
  /// Terminal.
  AtEnding { node_id: String },
}

impl PlaybackState {
  pub fn node_id(&self) -> &str {
    match self {
      PlaybackState::AtScene { node_id }
      | PlaybackState::AwaitingChoice { node_id, .. }
      | PlaybackState::Resolving { node_id, .. }
      | PlaybackState::AtEnding { node_id } => node_id,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, PlaybackState::AtEnding { .. })
  }

  pub fn deadline(&self) -> Option<&ChoiceDeadline> {
    match self {
      PlaybackState::AwaitingChoice { deadline, .. } => deadline.as_ref(),
      _ => None,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      PlaybackState::AtScene { .. } => "AtScene",
      PlaybackState::AwaitingChoice { .. } => "AwaitingChoice",
      PlaybackState::Resolving { .. } => "Resolving",
      PlaybackState::AtEnding { .. } => "AtEnding",
    }
  }
}

impl fmt::Display for PlaybackState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({})", self.name(), self.node_id())
  }
}
