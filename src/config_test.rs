//! Tests for `StoryConfig`.

use std::collections::HashMap;

use crate::config::{ENV_ANALYTICS_BATCH, ENV_COLUMN_GAP, ENV_LAYOUT, ENV_ROW_GAP, StoryConfig};
use crate::error::ConfigError;
use crate::layout::LayoutAlgorithm;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
  let map: HashMap<String, String> = pairs
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
  move |key| map.get(key).cloned()
}

#[test]
fn defaults_without_variables() {
  let config = StoryConfig::from_lookup(|_| None).unwrap();
  assert_eq!(config, StoryConfig::default());
  assert_eq!(config.layout.column_gap, 250.0);
  assert_eq!(config.layout.row_gap, 150.0);
  assert_eq!(config.max_auto_steps, 256);
  assert_eq!(config.analytics_batch_size, 64);
  assert_eq!(config.analytics_capacity, 1024);
}

#[test]
fn variables_override_defaults() {
  let config = StoryConfig::from_lookup(lookup(&[
    (ENV_COLUMN_GAP, "300"),
    (ENV_ROW_GAP, " 80.5 "),
    (ENV_LAYOUT, "vertical"),
    (ENV_ANALYTICS_BATCH, "8"),
  ]))
  .unwrap();
  assert_eq!(config.layout.column_gap, 300.0);
  assert_eq!(config.layout.row_gap, 80.5);
  assert_eq!(config.layout.algorithm, LayoutAlgorithm::LayeredVertical);
  assert_eq!(config.analytics_batch_size, 8);
}

#[test]
fn invalid_values_name_the_variable() {
  let err = StoryConfig::from_lookup(lookup(&[(ENV_ROW_GAP, "-1")])).unwrap_err();
  assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == ENV_ROW_GAP));
  assert!(StoryConfig::from_lookup(lookup(&[(ENV_ANALYTICS_BATCH, "0")])).is_err());
  assert!(StoryConfig::from_lookup(lookup(&[(ENV_LAYOUT, "radial")])).is_err());
  assert!(StoryConfig::from_lookup(lookup(&[(ENV_COLUMN_GAP, "wide")])).is_err());
}

#[test]
fn deserializes_partial_json() {
  let config: StoryConfig = serde_json::from_str(r#"{"maxAutoSteps": 12}"#).unwrap();
  assert_eq!(config.max_auto_steps, 12);
  assert_eq!(config.analytics_capacity, 1024);
}

#[test]
fn layout_flags_override_and_are_checked() {
  let base = StoryConfig::from_lookup(lookup(&[(ENV_COLUMN_GAP, "999")])).unwrap();
  let config = base
    .clone()
    .with_layout_overrides(Some(LayoutAlgorithm::LayeredVertical), Some(100.0), None)
    .unwrap();
  assert_eq!(config.layout.algorithm, LayoutAlgorithm::LayeredVertical);
  assert_eq!(config.layout.column_gap, 100.0);
  assert_eq!(config.layout.row_gap, 150.0);

  let err = base
    .clone()
    .with_layout_overrides(None, None, Some(-5.0))
    .unwrap_err();
  assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "--row-gap"));
  assert!(base.with_layout_overrides(None, Some(f64::NAN), None).is_err());
}
