//! Reader session checkpoints.
//!
//! A saved [`PlaybackSession`] is plain JSON and can be resumed by any resolver built over the
//! same StoryMap, including one with a pending timed choice (the deadline token is kept).

use std::path::Path;

use tracing::{debug, instrument};

use crate::error::SessionIoError;
use crate::types::PlaybackSession;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SessionIoError + '_ {
  move |source| SessionIoError::Io {
    path: path.to_path_buf(),
    source,
  }
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> SessionIoError + '_ {
  move |source| SessionIoError::Json {
    path: path.to_path_buf(),
    source,
  }
}

/// Writes `session` to `path`, creating parent directories.
#[instrument(level = "trace", skip(path, session), fields(session_id = %session.session_id))]
pub fn save_session(path: &Path, session: &PlaybackSession) -> Result<(), SessionIoError> {
  let json = serde_json::to_vec_pretty(session).map_err(json_error(path))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).map_err(io_error(path))?;
  }
  std::fs::write(path, json).map_err(io_error(path))?;
  debug!(path = %path.display(), step = session.step, "session checkpoint written");
  Ok(())
}

#[instrument(level = "trace", skip(path))]
pub fn load_session(path: &Path) -> Result<PlaybackSession, SessionIoError> {
  let bytes = std::fs::read(path).map_err(io_error(path))?;
  serde_json::from_slice(&bytes).map_err(json_error(path))
}
