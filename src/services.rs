//! Process-wide component registry, built once at startup and passed by reference.

use std::sync::Arc;

use tracing::info;

use crate::analytics_pipeline::AnalyticsHandle;
use crate::config::StoryConfig;
use crate::delivery::{InMemorySceneSource, SceneBundle, SceneContentSource, deliver};
use crate::editor::StoryMapEditor;
use crate::engine::ReaderSession;
use crate::error::{DeliveryError, ServiceError};
use crate::store::GraphStore;

pub struct StoryServices {
  pub config: StoryConfig,
  pub store: Arc<GraphStore>,
  pub scenes: Arc<dyn SceneContentSource>,
  pub analytics: Option<AnalyticsHandle>,
}

impl StoryServices {
  /// Empty store, in-memory scene content, no analytics.
  pub fn new(config: StoryConfig) -> Self {
    Self {
      config,
      store: Arc::new(GraphStore::new()),
      scenes: Arc::new(InMemorySceneSource::new()),
      analytics: None,
    }
  }

  pub fn with_store(mut self, store: Arc<GraphStore>) -> Self {
    self.store = store;
    self
  }

  pub fn with_scenes(mut self, scenes: Arc<dyn SceneContentSource>) -> Self {
    self.scenes = scenes;
    self
  }

  pub fn with_analytics(mut self, analytics: AnalyticsHandle) -> Self {
    self.analytics = Some(analytics);
    self
  }

  /// Starts a reading session on the episode's active StoryMap.
  pub async fn open_reader(
    &self,
    episode_id: &str,
    session_id: &str,
  ) -> Result<ReaderSession, ServiceError> {
    let active = self.store.get_active_graph(episode_id).await?;
    info!(episode_id, session_id, version = active.version, "reader session opened");
    let reader = ReaderSession::start(
      Arc::new(active.graph),
      session_id,
      self.config.max_auto_steps,
      self.analytics.clone(),
    )
    .await?;
    Ok(reader)
  }

  /// Editor over the episode's active StoryMap, using the configured layout.
  pub async fn open_editor(&self, episode_id: &str) -> Result<StoryMapEditor, ServiceError> {
    let active = self.store.get_active_graph(episode_id).await?;
    Ok(StoryMapEditor::from_version(&active).with_layout(self.config.layout.clone()))
  }

  pub async fn scene_bundle(
    &self,
    episode_id: &str,
    node_id: &str,
  ) -> Result<SceneBundle, DeliveryError> {
    deliver(&self.store, episode_id, node_id, self.scenes.as_ref()).await
  }
}
