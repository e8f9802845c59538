//! Versioned StoryMap storage per episode.
//!
//! Every commit appends an immutable version and makes it the only active one. Commits are
//! guarded by optimistic compare-and-swap on the version number; the write lock is held only for
//! the swap itself, never across an edit. Deleting a novel soft-deletes its episodes: their
//! history stays readable but they no longer have an active graph.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::engine::{LintWarning, lint, validate};
use crate::error::StoreError;
use crate::types::StoryMap;

/// One immutable version of an episode's StoryMap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMapVersion {
  pub episode_id: String,
  pub novel_id: String,
  /// Monotonic per episode, starting at 1.
  pub version: u64,
  pub active: bool,
  pub graph: StoryMap,
  pub committed_at: DateTime<Utc>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
  pub version: u64,
  /// Pre-publish lint findings. They never block a commit.
  pub warnings: Vec<LintWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
  pub episode_id: String,
  pub novel_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted_at: Option<DateTime<Utc>>,
  pub versions: Vec<StoryMapVersion>,
}

impl EpisodeRecord {
  fn active(&self) -> Option<&StoryMapVersion> {
    self.versions.iter().rev().find(|v| v.active)
  }

  fn is_deleted(&self) -> bool {
    self.deleted_at.is_some()
  }
}

/// Serializable image of a whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
  pub episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Default)]
pub struct GraphStore {
  episodes: RwLock<HashMap<String, EpisodeRecord>>,
}

impl GraphStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an episode with version 1 holding a lone start node.
  #[instrument(level = "trace", skip(self))]
  pub async fn init_episode(
    &self,
    novel_id: &str,
    episode_id: &str,
  ) -> Result<StoryMapVersion, StoreError> {
    let mut episodes = self.episodes.write().await;
    if episodes.contains_key(episode_id) {
      return Err(StoreError::AlreadyExists {
        episode_id: episode_id.to_string(),
      });
    }
    let first = StoryMapVersion {
      episode_id: episode_id.to_string(),
      novel_id: novel_id.to_string(),
      version: 1,
      active: true,
      graph: StoryMap::initial(),
      committed_at: Utc::now(),
    };
    episodes.insert(
      episode_id.to_string(),
      EpisodeRecord {
        episode_id: episode_id.to_string(),
        novel_id: novel_id.to_string(),
        deleted_at: None,
        versions: vec![first.clone()],
      },
    );
    info!(novel_id, episode_id, "episode initialized");
    Ok(first)
  }

  /// The active version of a live episode.
  pub async fn get_active_graph(&self, episode_id: &str) -> Result<StoryMapVersion, StoreError> {
    let episodes = self.episodes.read().await;
    episodes
      .get(episode_id)
      .filter(|r| !r.is_deleted())
      .and_then(EpisodeRecord::active)
      .cloned()
      .ok_or_else(|| StoreError::NotFound {
        episode_id: episode_id.to_string(),
      })
  }

  /// Validates `graph` and, if `base_version` is still the active version, stores it as the
  /// next version. Nothing is persisted on any error.
  #[instrument(level = "trace", skip(self, graph), fields(nodes = graph.nodes.len()))]
  pub async fn commit_version(
    &self,
    episode_id: &str,
    base_version: u64,
    graph: StoryMap,
  ) -> Result<CommitReceipt, StoreError> {
    validate(&graph).map_err(StoreError::Validation)?;
    let warnings = lint(&graph);

    let mut episodes = self.episodes.write().await;
    let record = episodes
      .get_mut(episode_id)
      .filter(|r| !r.is_deleted())
      .ok_or_else(|| StoreError::NotFound {
        episode_id: episode_id.to_string(),
      })?;
    let actual = record.active().map_or(0, |v| v.version);
    if actual != base_version {
      warn!(episode_id, expected = base_version, actual, "version conflict");
      return Err(StoreError::Conflict {
        episode_id: episode_id.to_string(),
        expected: base_version,
        actual,
      });
    }
    for v in record.versions.iter_mut() {
      v.active = false;
    }
    let version = record.versions.last().map_or(0, |v| v.version) + 1;
    record.versions.push(StoryMapVersion {
      episode_id: episode_id.to_string(),
      novel_id: record.novel_id.clone(),
      version,
      active: true,
      graph,
      committed_at: Utc::now(),
    });
    info!(episode_id, version, warnings = warnings.len(), "story map committed");
    Ok(CommitReceipt { version, warnings })
  }

  /// All versions of an episode, oldest first. Soft-deleted episodes keep their history.
  pub async fn history(&self, episode_id: &str) -> Result<Vec<StoryMapVersion>, StoreError> {
    let episodes = self.episodes.read().await;
    episodes
      .get(episode_id)
      .map(|r| r.versions.clone())
      .ok_or_else(|| StoreError::NotFound {
        episode_id: episode_id.to_string(),
      })
  }

  /// Marks every live episode of `novel_id` deleted. Returns how many were marked.
  #[instrument(level = "trace", skip(self))]
  pub async fn soft_delete_novel(&self, novel_id: &str) -> usize {
    let mut episodes = self.episodes.write().await;
    let now = Utc::now();
    let mut count = 0;
    for record in episodes.values_mut() {
      if record.novel_id == novel_id && !record.is_deleted() {
        record.deleted_at = Some(now);
        count += 1;
      }
    }
    info!(novel_id, episodes = count, "novel soft-deleted");
    count
  }

  /// Episode ids of a novel that are still live, sorted.
  pub async fn episodes_of(&self, novel_id: &str) -> Vec<String> {
    let episodes = self.episodes.read().await;
    let mut ids: Vec<String> = episodes
      .values()
      .filter(|r| r.novel_id == novel_id && !r.is_deleted())
      .map(|r| r.episode_id.clone())
      .collect();
    ids.sort();
    ids
  }

  /// Copy of the whole store, episodes sorted by id.
  pub async fn snapshot(&self) -> StoreSnapshot {
    let episodes = self.episodes.read().await;
    let mut records: Vec<EpisodeRecord> = episodes.values().cloned().collect();
    records.sort_by(|a, b| a.episode_id.cmp(&b.episode_id));
    StoreSnapshot { episodes: records }
  }

  pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
    let episodes = snapshot
      .episodes
      .into_iter()
      .map(|r| (r.episode_id.clone(), r))
      .collect();
    Self {
      episodes: RwLock::new(episodes),
    }
  }
}
