//! Select the outgoing edge a reading session follows.

use tracing::{instrument, warn};

use crate::condition::evaluate;
use crate::error::PlaybackError;
use crate::types::{StoryEdge, StoryMap, VariableBag};

/// Selects the first outgoing edge of `node_id`, in declared order, whose condition holds or
/// that has no condition.
///
/// If a condition cannot be evaluated, the first unconditioned edge of the node is taken
/// instead; without one the session gets a recoverable [`PlaybackError::Story`].
#[instrument(level = "trace", skip(graph, bag))]
pub fn select_edge<'g>(
  graph: &'g StoryMap,
  node_id: &str,
  bag: &VariableBag,
) -> Result<&'g StoryEdge, PlaybackError> {
  let edges = graph.outgoing_edges(node_id);
  for edge in edges.iter().copied() {
    let expr = match edge.condition_expr.as_deref() {
      Some(expr) if !edge.is_unconditioned() => expr,
      _ => return Ok(edge),
    };
    match evaluate(expr, bag) {
      Ok(true) => return Ok(edge),
      Ok(false) => continue,
      Err(source) => {
        warn!(
          node_id,
          condition = expr,
          error = %source,
          "condition evaluation failed, falling back to default edge"
        );
        return match first_unconditioned(&edges) {
          Some(fallback) => Ok(fallback),
          None => Err(PlaybackError::Story {
            node_id: node_id.to_string(),
            source,
          }),
        };
      }
    }
  }
  Err(PlaybackError::UnresolvedBranch {
    node_id: node_id.to_string(),
  })
}

pub(crate) fn first_unconditioned<'g>(edges: &[&'g StoryEdge]) -> Option<&'g StoryEdge> {
  edges.iter().copied().find(|e| e.is_unconditioned())
}
