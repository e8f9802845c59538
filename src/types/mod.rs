//! StoryMap data model and playback session types.
//!
//! Everything here is plain data with serde support; behavior lives in `engine`, `layout`,
//! `condition` and `analytics`.

use std::collections::BTreeMap;

mod choice;
mod playback_session;
mod playback_state;
mod story_edge;
mod story_map;
mod story_node;
mod story_value;
#[cfg(test)]
mod story_value_test;
mod story_variable;
#[cfg(test)]
mod story_variable_test;

pub use choice::{Choice, MutationOp, VariableMutation};
pub use playback_session::{PlaybackEvent, PlaybackSession, PlaybackStep, Transition};
pub use playback_state::{ChoiceDeadline, PlaybackState};
pub use story_edge::StoryEdge;
pub use story_map::StoryMap;
pub use story_node::{
  ChoicePayload, EndingPayload, EndingType, NodeKind, Position, ScenePayload, StoryNode,
};
pub use story_value::StoryValue;
pub use story_variable::{StoryVariable, VariableSlot, VariableType};

/// Variable values of one reading session, keyed by variable id.
///
/// Ordered so that a serialized bag is reproducible byte for byte.
pub type VariableBag = BTreeMap<String, StoryValue>;
