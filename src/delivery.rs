//! Scene bundles for the player: a resolved node joined with externally-owned scene content.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::DeliveryError;
use crate::store::GraphStore;
use crate::types::{Choice, NodeKind, StoryEdge, StoryMap, StoryNode, StoryVariable};

/// Scene content owned by another service (text, characters).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneContent {
  pub scene_id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub body: String,
  #[serde(default)]
  pub character_ids: Vec<String>,
}

/// Lookup of scene content by id.
#[async_trait]
pub trait SceneContentSource: Send + Sync {
  async fn scene(&self, scene_id: &str) -> Result<Option<SceneContent>, DeliveryError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySceneSource {
  scenes: HashMap<String, SceneContent>,
}

impl InMemorySceneSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_scene(mut self, scene: SceneContent) -> Self {
    self.insert(scene);
    self
  }

  pub fn insert(&mut self, scene: SceneContent) {
    self.scenes.insert(scene.scene_id.clone(), scene);
  }
}

#[async_trait]
impl SceneContentSource for InMemorySceneSource {
  async fn scene(&self, scene_id: &str) -> Result<Option<SceneContent>, DeliveryError> {
    Ok(self.scenes.get(scene_id).cloned())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
  pub choice_id: String,
  pub text: String,
  pub target_node_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub time_limit_seconds: Option<u32>,
}

impl From<&Choice> for ChoiceView {
  fn from(c: &Choice) -> Self {
    Self {
      choice_id: c.choice_id.clone(),
      text: c.text.clone(),
      target_node_id: c.target_node_id.clone(),
      time_limit_seconds: c.time_limit_seconds,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMapView {
  pub nodes: Vec<StoryNode>,
  pub edges: Vec<StoryEdge>,
  pub story_variables: Vec<StoryVariable>,
  pub start_node_id: Option<String>,
}

impl From<&StoryMap> for StoryMapView {
  fn from(graph: &StoryMap) -> Self {
    Self {
      nodes: graph.nodes.clone(),
      edges: graph.edges.clone(),
      story_variables: graph.story_variables.clone(),
      start_node_id: graph.find_start().map(|n| n.node_id.clone()),
    }
  }
}

/// What the player needs to render one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneBundle {
  pub node_id: String,
  pub scene: Option<SceneContent>,
  pub choices: Vec<ChoiceView>,
  pub story_map: StoryMapView,
}

/// Builds the bundle for `node_id`. Choices are the node's own options, or for a scene the
/// options of the first choice node it leads to directly.
#[instrument(level = "trace", skip(graph, source))]
pub async fn assemble_bundle(
  graph: &StoryMap,
  node_id: &str,
  source: &dyn SceneContentSource,
) -> Result<SceneBundle, DeliveryError> {
  let node = graph
    .node(node_id)
    .ok_or_else(|| DeliveryError::NodeNotFound {
      node_id: node_id.to_string(),
    })?;
  let scene = match &node.kind {
    NodeKind::Scene(payload) => match payload.scene_id.as_deref() {
      Some(scene_id) => {
        let content = source.scene(scene_id).await?;
        if content.is_none() {
          warn!(node_id, scene_id, "scene content missing");
        }
        content
      }
      None => None,
    },
    _ => None,
  };
  Ok(SceneBundle {
    node_id: node.node_id.clone(),
    scene,
    choices: offered_choices(graph, node)
      .iter()
      .map(ChoiceView::from)
      .collect(),
    story_map: StoryMapView::from(graph),
  })
}

/// Bundle for a node of an episode's active StoryMap.
pub async fn deliver(
  store: &GraphStore,
  episode_id: &str,
  node_id: &str,
  source: &dyn SceneContentSource,
) -> Result<SceneBundle, DeliveryError> {
  let active = store.get_active_graph(episode_id).await?;
  assemble_bundle(&active.graph, node_id, source).await
}

fn offered_choices<'g>(graph: &'g StoryMap, node: &'g StoryNode) -> &'g [Choice] {
  match &node.kind {
    NodeKind::Choice(payload) => &payload.choices,
    NodeKind::Scene(payload) => {
      let default_next = payload.default_next_node_id.as_deref();
      let edge_targets = graph
        .outgoing_edges(&node.node_id)
        .into_iter()
        .map(|e| e.target_node_id.as_str());
      default_next
        .into_iter()
        .chain(edge_targets)
        .filter_map(|id| graph.node(id))
        .find(|n| matches!(n.kind, NodeKind::Choice(_)))
        .map(StoryNode::choices)
        .unwrap_or(&[])
    }
    _ => &[],
  }
}
