//! Runtime configuration, read from `STORYWEAVE_*` environment variables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_MAX_AUTO_STEPS;
use crate::error::ConfigError;
use crate::layout::{LayoutAlgorithm, LayoutOptions};

pub const ENV_COLUMN_GAP: &str = "STORYWEAVE_COLUMN_GAP";
pub const ENV_ROW_GAP: &str = "STORYWEAVE_ROW_GAP";
pub const ENV_LAYOUT: &str = "STORYWEAVE_LAYOUT";
pub const ENV_MAX_AUTO_STEPS: &str = "STORYWEAVE_MAX_AUTO_STEPS";
pub const ENV_ANALYTICS_BATCH: &str = "STORYWEAVE_ANALYTICS_BATCH";
pub const ENV_ANALYTICS_CAPACITY: &str = "STORYWEAVE_ANALYTICS_CAPACITY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryConfig {
  pub layout: LayoutOptions,
  /// Branch nodes passed through per playback call before giving up.
  pub max_auto_steps: usize,
  pub analytics_batch_size: usize,
  pub analytics_capacity: usize,
}

impl Default for StoryConfig {
  fn default() -> Self {
    Self {
      layout: LayoutOptions::default(),
      max_auto_steps: DEFAULT_MAX_AUTO_STEPS,
      analytics_batch_size: 64,
      analytics_capacity: 1024,
    }
  }
}

impl StoryConfig {
  /// Defaults overridden by whichever `STORYWEAVE_*` variables are set.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mut config = Self::default();
    if let Some(v) = lookup(ENV_COLUMN_GAP) {
      config.layout.column_gap = parse_gap(ENV_COLUMN_GAP, &v)?;
    }
    if let Some(v) = lookup(ENV_ROW_GAP) {
      config.layout.row_gap = parse_gap(ENV_ROW_GAP, &v)?;
    }
    if let Some(v) = lookup(ENV_LAYOUT) {
      config.layout.algorithm = LayoutAlgorithm::from_str(&v).map_err(|reason| ConfigError::Invalid {
        key: ENV_LAYOUT.to_string(),
        value: v.clone(),
        reason,
      })?;
    }
    if let Some(v) = lookup(ENV_MAX_AUTO_STEPS) {
      config.max_auto_steps = parse_positive(ENV_MAX_AUTO_STEPS, &v)?;
    }
    if let Some(v) = lookup(ENV_ANALYTICS_BATCH) {
      config.analytics_batch_size = parse_positive(ENV_ANALYTICS_BATCH, &v)?;
    }
    if let Some(v) = lookup(ENV_ANALYTICS_CAPACITY) {
      config.analytics_capacity = parse_positive(ENV_ANALYTICS_CAPACITY, &v)?;
    }
    Ok(config)
  }

  /// Applies command-line layout flags on top of the env-derived values. Gaps go through the
  /// same checks as their environment variables.
  pub fn with_layout_overrides(
    mut self,
    algorithm: Option<LayoutAlgorithm>,
    column_gap: Option<f64>,
    row_gap: Option<f64>,
  ) -> Result<Self, ConfigError> {
    if let Some(a) = algorithm {
      self.layout.algorithm = a;
    }
    if let Some(g) = column_gap {
      self.layout.column_gap = check_gap("--column-gap", g)?;
    }
    if let Some(g) = row_gap {
      self.layout.row_gap = check_gap("--row-gap", g)?;
    }
    Ok(self)
  }
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
  ConfigError::Invalid {
    key: key.to_string(),
    value: value.to_string(),
    reason: reason.into(),
  }
}

fn parse_gap(key: &str, value: &str) -> Result<f64, ConfigError> {
  let gap: f64 = value
    .trim()
    .parse()
    .map_err(|e: std::num::ParseFloatError| invalid(key, value, e.to_string()))?;
  check_gap(key, gap)
}

fn check_gap(key: &str, gap: f64) -> Result<f64, ConfigError> {
  if !gap.is_finite() || gap < 0.0 {
    return Err(invalid(key, &gap.to_string(), "must be a finite, non-negative number"));
  }
  Ok(gap)
}

fn parse_positive(key: &str, value: &str) -> Result<usize, ConfigError> {
  match value.trim().parse::<usize>() {
    Ok(0) => Err(invalid(key, value, "must be at least 1")),
    Ok(n) => Ok(n),
    Err(e) => Err(invalid(key, value, e.to_string())),
  }
}
