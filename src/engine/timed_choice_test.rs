//! Tests for `ReaderSession` timed-choice expiry, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use super::timed_choice::ReaderSession;
use crate::analytics::AnalyticsAggregator;
use crate::analytics_pipeline::spawn_ingestor;
use crate::error::PlaybackError;
use crate::types::{
  Choice, MutationOp, NodeKind, PlaybackState, StoryEdge, StoryMap, StoryNode, StoryValue,
  StoryVariable, VariableMutation, VariableType,
};

/// start -> pick{stay (default, 5s) -> endStay, go -> endGo}; `stay` bumps `waited`.
fn timed_map() -> StoryMap {
  let mut pick = StoryNode::choice(
    "pick",
    vec![
      Choice::new("go", "Go", "endGo").with_time_limit(5),
      Choice::new("stay", "Stay", "endStay").with_action(VariableMutation::new(
        "waited",
        MutationOp::Add,
        1i64,
      )),
    ],
  );
  if let NodeKind::Choice(ref mut p) = pick.kind {
    p.default_choice_id = Some("stay".to_string());
  }
  StoryMap::new(
    vec![
      StoryNode::start("start"),
      pick,
      StoryNode::ending("endGo"),
      StoryNode::ending("endStay"),
    ],
    vec![StoryEdge::new("start", "pick")],
    vec![StoryVariable::new("waited", VariableType::Number, 0i64)],
  )
}

fn resolving_count(session: &crate::types::PlaybackSession) -> usize {
  session
    .log
    .iter()
    .filter(|s| matches!(s.state, PlaybackState::Resolving { .. }))
    .count()
}

#[tokio::test(start_paused = true)]
async fn expiry_applies_default_exactly_once() {
  let reader = ReaderSession::start(Arc::new(timed_map()), "r1", 16, None)
    .await
    .unwrap();
  reader.advance().await.unwrap();
  assert!(reader.timer_pending().await);

  tokio::time::sleep(Duration::from_secs(4)).await;
  assert!(matches!(
    reader.state().await,
    PlaybackState::AwaitingChoice { .. }
  ));

  tokio::time::sleep(Duration::from_secs(2)).await;
  let session = reader.snapshot().await;
  assert_eq!(
    session.state,
    PlaybackState::AtEnding {
      node_id: "endStay".to_string()
    }
  );
  assert_eq!(session.variables["waited"], StoryValue::Number(1.0));
  assert_eq!(resolving_count(&session), 1);

  // A late manual selection has no further effect.
  assert!(matches!(
    reader.select("go").await,
    Err(PlaybackError::InvalidState { .. })
  ));
  tokio::time::sleep(Duration::from_secs(30)).await;
  let after = reader.snapshot().await;
  assert_eq!(after, session);
}

#[tokio::test(start_paused = true)]
async fn manual_selection_cancels_timer() {
  let reader = ReaderSession::start(Arc::new(timed_map()), "r1", 16, None)
    .await
    .unwrap();
  reader.advance().await.unwrap();
  tokio::time::sleep(Duration::from_secs(3)).await;

  reader.select("go").await.unwrap();
  assert!(!reader.timer_pending().await);
  tokio::time::sleep(Duration::from_secs(10)).await;

  let session = reader.snapshot().await;
  assert_eq!(session.state.node_id(), "endGo");
  assert_eq!(session.variables["waited"], StoryValue::Number(0.0));
  assert_eq!(resolving_count(&session), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_selection_keeps_timer_running() {
  let reader = ReaderSession::start(Arc::new(timed_map()), "r1", 16, None)
    .await
    .unwrap();
  reader.advance().await.unwrap();
  assert!(matches!(
    reader.select("fly").await,
    Err(PlaybackError::ChoiceNotFound { .. })
  ));
  tokio::time::sleep(Duration::from_secs(6)).await;
  assert_eq!(reader.state().await.node_id(), "endStay");
}

#[tokio::test(start_paused = true)]
async fn events_reach_analytics_pipeline() {
  let graph = Arc::new(timed_map());
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&graph), 16, 4);
  let reader = ReaderSession::start(Arc::clone(&graph), "r1", 16, Some(pipeline.handle()))
    .await
    .unwrap();
  reader.advance().await.unwrap();
  reader.select("go").await.unwrap();
  drop(reader);

  let report = pipeline.shutdown().await;
  assert_eq!(report.sessions, 1);
  let go = report.choices.iter().find(|c| c.choice_id == "go").unwrap();
  assert_eq!(go.selection_rate, Some(1.0));
}

#[tokio::test(start_paused = true)]
async fn dropped_reader_never_applies_default() {
  let graph = Arc::new(timed_map());
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&graph), 16, 4);
  let reader = ReaderSession::start(Arc::clone(&graph), "gone", 16, Some(pipeline.handle()))
    .await
    .unwrap();
  reader.advance().await.unwrap();
  drop(reader);
  tokio::time::sleep(Duration::from_secs(6)).await;

  let report = pipeline.shutdown().await;
  let stay = report
    .choices
    .iter()
    .find(|c| c.choice_id == "stay")
    .unwrap();
  assert_eq!(stay.sessions, 0);
  let end_stay = report
    .nodes
    .iter()
    .find(|n| n.node_id == "endStay")
    .unwrap();
  assert_eq!(end_stay.sessions, 0);
}

#[tokio::test(start_paused = true)]
async fn clone_keeps_timer_alive() {
  let reader = ReaderSession::start(Arc::new(timed_map()), "r1", 16, None)
    .await
    .unwrap();
  let other = reader.clone();
  reader.advance().await.unwrap();
  drop(reader);
  tokio::time::sleep(Duration::from_secs(6)).await;
  assert_eq!(other.state().await.node_id(), "endStay");
}
