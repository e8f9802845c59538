//! Playback state machine: moves a reading session through a StoryMap.
//!
//! The resolver borrows a graph snapshot and holds no per-session state, so any number of
//! sessions can be driven from one resolver concurrently. Every call works on a draft copy of
//! the session and only replaces the caller's session when the whole transition succeeded.

use chrono::Utc;
use tracing::{debug, info, instrument};

use super::apply_mutations::apply_mutations;
use super::select_edge::select_edge;
use crate::error::PlaybackError;
use crate::types::{
  ChoiceDeadline, NodeKind, PlaybackEvent, PlaybackSession, PlaybackState, PlaybackStep,
  StoryMap, StoryNode, Transition,
};

/// Default bound on consecutive branch nodes passed through in one call.
pub const DEFAULT_MAX_AUTO_STEPS: usize = 256;

/// Drives [`PlaybackSession`]s over one StoryMap.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackResolver<'g> {
  graph: &'g StoryMap,
  max_auto_steps: usize,
}

impl<'g> PlaybackResolver<'g> {
  pub fn new(graph: &'g StoryMap) -> Self {
    Self {
      graph,
      max_auto_steps: DEFAULT_MAX_AUTO_STEPS,
    }
  }

  pub fn with_max_auto_steps(mut self, max_auto_steps: usize) -> Self {
    self.max_auto_steps = max_auto_steps;
    self
  }

  pub fn graph(&self) -> &'g StoryMap {
    self.graph
  }

  /// Opens a session at the start node with the bag seeded from the declared variables.
  #[instrument(level = "trace", skip(self, session_id))]
  pub fn start(
    &self,
    session_id: impl Into<String>,
  ) -> Result<(PlaybackSession, Transition), PlaybackError> {
    let start = self.graph.find_start().ok_or(PlaybackError::NoStartNode)?;
    let state = PlaybackState::AtScene {
      node_id: start.node_id.clone(),
    };
    let mut session = PlaybackSession {
      session_id: session_id.into(),
      state: state.clone(),
      variables: self.graph.initial_bag(),
      visited: Vec::new(),
      step: 0,
      log: Vec::new(),
      started_at: Utc::now(),
    };
    let mut events = Vec::new();
    enter(&mut session, state, 0, &mut events);
    info!(session_id = %session.session_id, start = %start.node_id, "playback started");
    let state = session.state.clone();
    Ok((session, Transition { state, events }))
  }

  /// Continues from `AtScene`: the scene's default next node if set, otherwise the first
  /// qualifying outgoing edge.
  #[instrument(level = "trace", skip(self, session), fields(session_id = %session.session_id))]
  pub fn advance(&self, session: &mut PlaybackSession) -> Result<Transition, PlaybackError> {
    let node_id = match &session.state {
      PlaybackState::AtScene { node_id } => node_id.clone(),
      other => {
        return Err(PlaybackError::InvalidState {
          action: "advance",
          state: other.to_string(),
        });
      }
    };
    let node = self.node(&node_id)?;
    let mut draft = session.clone();
    let mut events = Vec::new();
    let default_next = match &node.kind {
      NodeKind::Scene(scene) => scene.default_next_node_id.clone(),
      _ => None,
    };
    let next = match default_next {
      Some(next) => next,
      None => select_edge(self.graph, &node_id, &draft.variables)?
        .target_node_id
        .clone(),
    };
    self.land(&mut draft, next, &mut events)?;
    Ok(commit(session, draft, events))
  }

  /// Applies the reader's selection at an `AwaitingChoice` node.
  #[instrument(level = "trace", skip(self, session), fields(session_id = %session.session_id))]
  pub fn select_choice(
    &self,
    session: &mut PlaybackSession,
    choice_id: &str,
  ) -> Result<Transition, PlaybackError> {
    let node_id = match &session.state {
      PlaybackState::AwaitingChoice { node_id, .. } => node_id.clone(),
      other => {
        return Err(PlaybackError::InvalidState {
          action: "select a choice",
          state: other.to_string(),
        });
      }
    };
    self.resolve(session, &node_id, choice_id)
  }

  /// Applies the default option of a timed choice whose deadline carries `token`.
  ///
  /// A token that does not match the session's current deadline (the reader already chose,
  /// or the session moved on) is rejected with [`PlaybackError::StaleTimer`] and changes nothing.
  #[instrument(level = "trace", skip(self, session), fields(session_id = %session.session_id))]
  pub fn expire_choice(
    &self,
    session: &mut PlaybackSession,
    token: u64,
  ) -> Result<Transition, PlaybackError> {
    let (node_id, choice_id) = match session.state.deadline() {
      Some(deadline) if deadline.token == token => (
        session.state.node_id().to_string(),
        deadline.default_choice_id.clone(),
      ),
      _ => {
        debug!(token, state = %session.state, "stale choice timer");
        return Err(PlaybackError::StaleTimer { token });
      }
    };
    info!(node_id = %node_id, choice_id = %choice_id, "choice timed out, applying default");
    self.resolve(session, &node_id, &choice_id)
  }

  fn resolve(
    &self,
    session: &mut PlaybackSession,
    node_id: &str,
    choice_id: &str,
  ) -> Result<Transition, PlaybackError> {
    let payload = self
      .graph
      .choice_payload(node_id)
      .ok_or_else(|| PlaybackError::NodeNotFound {
        node_id: node_id.to_string(),
      })?;
    let choice = payload
      .choice(choice_id)
      .ok_or_else(|| PlaybackError::ChoiceNotFound {
        node_id: node_id.to_string(),
        choice_id: choice_id.to_string(),
      })?;

    let mut draft = session.clone();
    let mut events = vec![PlaybackEvent::selected(
      draft.session_id.clone(),
      node_id,
      choice_id,
    )];
    let resolving = PlaybackState::Resolving {
      node_id: node_id.to_string(),
      choice_id: choice_id.to_string(),
    };
    enter(&mut draft, resolving, choice.actions.len(), &mut events);
    draft.variables = apply_mutations(&draft.variables, &choice.actions)?;
    self.land(&mut draft, choice.target_node_id.clone(), &mut events)?;
    Ok(commit(session, draft, events))
  }

  /// Enters `target`, passing through branch nodes until a resting state is reached.
  fn land(
    &self,
    draft: &mut PlaybackSession,
    target: String,
    events: &mut Vec<PlaybackEvent>,
  ) -> Result<(), PlaybackError> {
    let mut current = target;
    let mut hops = 0usize;
    loop {
      let node = self.node(&current)?;
      let state = match &node.kind {
        NodeKind::Start | NodeKind::Scene(_) => PlaybackState::AtScene { node_id: current },
        NodeKind::Ending(_) => PlaybackState::AtEnding { node_id: current },
        NodeKind::Choice(payload) => {
          // The token is the step number the session is about to take.
          let token = draft.step + 1;
          let deadline = payload.time_limit_seconds().and_then(|limit_seconds| {
            payload.default_choice().map(|c| ChoiceDeadline {
              token,
              limit_seconds,
              default_choice_id: c.choice_id.clone(),
            })
          });
          PlaybackState::AwaitingChoice {
            node_id: current,
            deadline,
          }
        }
        NodeKind::Branch => {
          hops += 1;
          if hops > self.max_auto_steps {
            return Err(PlaybackError::AutoStepLimit {
              node_id: current,
              limit: self.max_auto_steps,
            });
          }
          draft.visited.push(current.clone());
          events.push(PlaybackEvent::reached(draft.session_id.clone(), current.clone()));
          current = select_edge(self.graph, &current, &draft.variables)?
            .target_node_id
            .clone();
          continue;
        }
      };
      enter(draft, state, 0, events);
      return Ok(());
    }
  }

  fn node(&self, node_id: &str) -> Result<&'g StoryNode, PlaybackError> {
    self
      .graph
      .node(node_id)
      .ok_or_else(|| PlaybackError::NodeNotFound {
        node_id: node_id.to_string(),
      })
  }
}

/// Records `state` as entered: step counter, log, and (for resting states) visit + event.
fn enter(
  session: &mut PlaybackSession,
  state: PlaybackState,
  mutations_applied: usize,
  events: &mut Vec<PlaybackEvent>,
) {
  session.step += 1;
  if !matches!(state, PlaybackState::Resolving { .. }) {
    session.visited.push(state.node_id().to_string());
    events.push(PlaybackEvent::reached(
      session.session_id.clone(),
      state.node_id(),
    ));
  }
  session.log.push(PlaybackStep {
    step: session.step,
    state: state.clone(),
    mutations_applied,
  });
  session.state = state;
}

fn commit(
  session: &mut PlaybackSession,
  draft: PlaybackSession,
  events: Vec<PlaybackEvent>,
) -> Transition {
  *session = draft;
  debug!(state = %session.state, step = session.step, "transition committed");
  Transition {
    state: session.state.clone(),
    events,
  }
}
