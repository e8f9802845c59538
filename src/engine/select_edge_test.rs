//! Tests for `select_edge`.

use super::select_edge::{first_unconditioned, select_edge};
use crate::error::{EvaluationError, PlaybackError};
use crate::types::{StoryEdge, StoryMap, StoryNode, StoryValue, VariableBag};

fn graph(edges: Vec<StoryEdge>) -> StoryMap {
  StoryMap::new(
    vec![
      StoryNode::branch("b"),
      StoryNode::ending("rich"),
      StoryNode::ending("poor"),
      StoryNode::ending("default"),
    ],
    edges,
    vec![],
  )
}

fn gold(n: f64) -> VariableBag {
  let mut bag = VariableBag::new();
  bag.insert("gold".to_string(), StoryValue::Number(n));
  bag
}

#[test]
fn first_true_condition_in_declared_order_wins() {
  let g = graph(vec![
    StoryEdge::new("b", "rich").when("gold >= 10"),
    StoryEdge::new("b", "poor").when("gold >= 0"),
    StoryEdge::new("b", "default"),
  ]);
  assert_eq!(select_edge(&g, "b", &gold(12.0)).unwrap().target_node_id, "rich");
  assert_eq!(select_edge(&g, "b", &gold(3.0)).unwrap().target_node_id, "poor");
  assert_eq!(select_edge(&g, "b", &gold(-1.0)).unwrap().target_node_id, "default");
}

#[test]
fn unconditioned_edge_declared_first_shadows_later_ones() {
  let g = graph(vec![
    StoryEdge::new("b", "default"),
    StoryEdge::new("b", "rich").when("gold >= 10"),
  ]);
  assert_eq!(select_edge(&g, "b", &gold(50.0)).unwrap().target_node_id, "default");
}

#[test]
fn blank_condition_counts_as_unconditioned() {
  let g = graph(vec![StoryEdge::new("b", "poor").when("   ")]);
  assert_eq!(select_edge(&g, "b", &gold(0.0)).unwrap().target_node_id, "poor");
}

#[test]
fn unresolved_when_nothing_qualifies() {
  let g = graph(vec![StoryEdge::new("b", "rich").when("gold >= 10")]);
  assert_eq!(
    select_edge(&g, "b", &gold(1.0)),
    Err(PlaybackError::UnresolvedBranch {
      node_id: "b".to_string()
    })
  );
}

#[test]
fn evaluation_error_falls_back_to_unconditioned_edge() {
  let g = graph(vec![
    StoryEdge::new("b", "rich").when("karma > 1"),
    StoryEdge::new("b", "poor").when("gold > 1"),
    StoryEdge::new("b", "default"),
  ]);
  assert_eq!(select_edge(&g, "b", &gold(5.0)).unwrap().target_node_id, "default");
}

#[test]
fn evaluation_error_without_fallback_is_story_error() {
  let g = graph(vec![StoryEdge::new("b", "rich").when("karma > 1")]);
  match select_edge(&g, "b", &gold(5.0)) {
    Err(PlaybackError::Story { node_id, source }) => {
      assert_eq!(node_id, "b");
      assert_eq!(
        source,
        EvaluationError::UnknownVariable {
          variable_id: "karma".to_string()
        }
      );
    }
    other => panic!("expected story error, got {:?}", other),
  }
}

#[test]
fn first_unconditioned_skips_conditioned() {
  let a = StoryEdge::new("b", "rich").when("gold > 1");
  let c = StoryEdge::new("b", "default");
  assert_eq!(
    first_unconditioned(&[&a, &c]).map(|e| e.target_node_id.as_str()),
    Some("default")
  );
  assert!(first_unconditioned(&[&a]).is_none());
}
