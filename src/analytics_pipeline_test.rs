//! Tests for the analytics ingestion pipeline.

use crate::analytics::AnalyticsAggregator;
use crate::analytics_pipeline::spawn_ingestor;
use crate::types::{PlaybackEvent, StoryEdge, StoryMap, StoryNode};

fn map() -> StoryMap {
  StoryMap::new(
    vec![StoryNode::start("start"), StoryNode::ending("end")],
    vec![StoryEdge::new("start", "end")],
    vec![],
  )
}

#[tokio::test]
async fn ingests_all_events_and_dedups() {
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&map()), 4, 3);
  let handle = pipeline.handle();
  for s in ["a", "b", "c"] {
    handle.record(PlaybackEvent::reached(s, "start"));
    handle.record(PlaybackEvent::reached(s, "start"));
  }
  handle.record_all(vec![
    PlaybackEvent::reached("a", "end"),
    PlaybackEvent::reached("ghost-session", "ghost-node"),
  ]);
  drop(handle);
  let report = pipeline.shutdown().await;
  assert_eq!(report.sessions, 3);
  assert_eq!(report.duplicates, 3);
  let end = report.nodes.iter().find(|n| n.node_id == "end").unwrap();
  assert_eq!(end.sessions, 1);
  assert!((end.reach_rate.unwrap() - 1.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn shutdown_without_events_reports_nothing() {
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&map()), 8, 8);
  let handle = pipeline.handle();
  drop(handle);
  let report = pipeline.shutdown().await;
  assert_eq!(report.sessions, 0);
}

#[tokio::test]
async fn report_is_available_while_running() {
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&map()), 8, 8);
  pipeline
    .handle()
    .record(PlaybackEvent::reached("a", "start"));
  let mut sessions = 0;
  for _ in 0..100 {
    sessions = pipeline.report().await.sessions;
    if sessions == 1 {
      break;
    }
    tokio::task::yield_now().await;
  }
  assert_eq!(sessions, 1);
  pipeline.shutdown().await;
}
