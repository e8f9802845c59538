//! End-to-end tests over tests/fixtures/: store commits, playback, layout and analytics
//! through the public API.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use storyweave::error::StoreError;
use storyweave::layout::layer_ids;
use storyweave::store_io::{load_store, save_store};
use storyweave::types::{PlaybackState, StoryValue};
use storyweave::{
  AnalyticsAggregator, GraphStore, LayoutOptions, PlaybackResolver, ReaderSession, StoryMap,
  autolayout, spawn_ingestor,
};

fn fixture_path(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn fixture(name: &str) -> StoryMap {
  let text = std::fs::read_to_string(fixture_path(name)).expect("read fixture");
  serde_json::from_str(&text).expect("parse fixture")
}

#[tokio::test]
async fn commit_play_and_aggregate_branching_story() {
  let store = GraphStore::new();
  store.init_episode("novel-1", "ep-1").await.unwrap();
  let receipt = store
    .commit_version("ep-1", 1, fixture("branching.json"))
    .await
    .unwrap();
  assert_eq!(receipt.version, 2);

  let active = store.get_active_graph("ep-1").await.unwrap();
  let graph = active.graph;
  let resolver = PlaybackResolver::new(&graph);
  let mut aggregator = AnalyticsAggregator::new(&graph);

  for (session_id, choice, ending) in [
    ("s1", "left", "endingL"),
    ("s2", "right", "endingR"),
    ("s3", "left", "endingL"),
  ] {
    let (mut session, t) = resolver.start(session_id).unwrap();
    let mut events = t.events;
    events.extend(resolver.advance(&mut session).unwrap().events);
    events.extend(resolver.advance(&mut session).unwrap().events);
    events.extend(resolver.select_choice(&mut session, choice).unwrap().events);
    assert_eq!(
      session.state,
      PlaybackState::AtEnding {
        node_id: ending.to_string()
      }
    );
    for e in events.iter().chain(events.iter()) {
      aggregator.ingest(e).unwrap();
    }
  }

  assert_eq!(aggregator.reach_rate("endingL"), Some(2.0 / 3.0));
  assert_eq!(aggregator.reach_rate("gate"), Some(2.0 / 3.0));
  assert_eq!(aggregator.selection_rate("right"), Some(1.0 / 3.0));
}

#[tokio::test]
async fn rejected_commit_names_offending_ids() {
  let store = GraphStore::new();
  store.init_episode("novel-1", "ep-1").await.unwrap();
  let err = store
    .commit_version("ep-1", 1, fixture("invalid.json"))
    .await
    .unwrap_err();
  let message = err.to_string();
  assert!(matches!(err, StoreError::Validation(ref issues) if issues.len() == 3));
  assert!(message.contains("ghost"), "{}", message);
  assert!(message.contains("gold"), "{}", message);
  assert!(message.contains("again"), "{}", message);
  assert_eq!(store.get_active_graph("ep-1").await.unwrap().version, 1);
}

#[test]
fn cyclic_story_lays_out_in_finite_layers() {
  let graph = fixture("cyclic.json");
  assert_eq!(
    layer_ids(&graph.nodes, &graph.edges),
    vec![vec!["start".to_string()], vec!["A".to_string(), "B".to_string()]]
  );
  let placed = autolayout(&graph.nodes, &graph.edges, &LayoutOptions::default());
  assert_eq!(placed.len(), 3);
  assert_eq!(placed[2].position.x, 250.0);
  assert_eq!(placed[2].position.y, 150.0);
}

#[tokio::test]
async fn store_survives_restart() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("store.json");
  let store = GraphStore::new();
  store.init_episode("novel-1", "ep-1").await.unwrap();
  store
    .commit_version("ep-1", 1, fixture("branching.json"))
    .await
    .unwrap();
  save_store(&path, &store).await.unwrap();

  let reloaded = load_store(&path).unwrap();
  let active = reloaded.get_active_graph("ep-1").await.unwrap();
  assert_eq!(active.version, 2);
  assert_eq!(active.graph, fixture("branching.json"));
  assert_eq!(reloaded.history("ep-1").await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_default_flows_into_analytics() {
  let graph = Arc::new(fixture("branching.json"));
  let pipeline = spawn_ingestor(AnalyticsAggregator::new(&graph), 32, 8);
  let reader = ReaderSession::start(Arc::clone(&graph), "timed", 64, Some(pipeline.handle()))
    .await
    .unwrap();
  reader.advance().await.unwrap();
  reader.advance().await.unwrap();
  tokio::time::sleep(Duration::from_secs(31)).await;

  let session = reader.snapshot().await;
  assert_eq!(session.state.node_id(), "endingR");
  assert_eq!(session.variables["gold"], StoryValue::Number(5.0));
  drop(reader);

  let report = pipeline.shutdown().await;
  let right = report
    .choices
    .iter()
    .find(|c| c.choice_id == "right")
    .unwrap();
  assert_eq!(right.selection_rate, Some(1.0));
}
