//! GraphStore snapshot save/load (JSON).

use std::path::Path;

use tracing::instrument;

use crate::error::StoreError;
use crate::store::{GraphStore, StoreSnapshot};

/// Default filename for a store snapshot under a data directory.
pub const SNAPSHOT_FILENAME: &str = "storymaps.json";

/// Writes `snapshot` to `path` as pretty JSON, creating parent directories.
#[instrument(level = "trace", skip(path, snapshot))]
pub fn save_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
  let json = serde_json::to_string_pretty(snapshot)?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)?;
  Ok(())
}

/// Reads a snapshot from `path`. Missing files and invalid JSON are errors.
#[instrument(level = "trace", skip(path))]
pub fn load_snapshot(path: &Path) -> Result<StoreSnapshot, StoreError> {
  let bytes = std::fs::read(path)?;
  Ok(serde_json::from_slice(&bytes)?)
}

/// Saves the current contents of `store`.
pub async fn save_store(path: &Path, store: &GraphStore) -> Result<(), StoreError> {
  let snapshot = store.snapshot().await;
  save_snapshot(path, &snapshot)
}

/// Loads a store from `path`.
pub fn load_store(path: &Path) -> Result<GraphStore, StoreError> {
  load_snapshot(path).map(GraphStore::from_snapshot)
}
