//! Values held by story variables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value held by a story variable or used as a literal in a condition or mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum StoryValue {
  #[default]
  Null,
  Bool(bool),
  Number(f64),
  Text(String),
  List(Vec<StoryValue>),
}

impl StoryValue {
  /// Name of the value's runtime type, used in error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      StoryValue::Null => "null",
      StoryValue::Bool(_) => "boolean",
      StoryValue::Number(_) => "number",
      StoryValue::Text(_) => "string",
      StoryValue::List(_) => "list",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, StoryValue::Null)
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      StoryValue::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      StoryValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  /// Returns true if `needle` is an element of this list, or a substring of this string.
  pub fn includes(&self, needle: &StoryValue) -> Option<bool> {
    match (self, needle) {
      (StoryValue::List(items), n) => Some(items.iter().any(|i| i == n)),
      (StoryValue::Text(hay), StoryValue::Text(n)) => Some(hay.contains(n.as_str())),
      _ => None,
    }
  }
}

impl fmt::Display for StoryValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoryValue::Null => write!(f, "null"),
      StoryValue::Bool(b) => write!(f, "{}", b),
      StoryValue::Number(n) => write!(f, "{}", n),
      StoryValue::Text(s) => write!(f, "{:?}", s),
      StoryValue::List(items) => {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", item)?;
        }
        write!(f, "]")
      }
    }
  }
}

impl From<bool> for StoryValue {
  fn from(b: bool) -> Self {
    StoryValue::Bool(b)
  }
}

impl From<f64> for StoryValue {
  fn from(n: f64) -> Self {
    StoryValue::Number(n)
  }
}

impl From<i64> for StoryValue {
  fn from(n: i64) -> Self {
    StoryValue::Number(n as f64)
  }
}

impl From<&str> for StoryValue {
  fn from(s: &str) -> Self {
    StoryValue::Text(s.to_string())
  }
}

impl From<String> for StoryValue {
  fn from(s: String) -> Self {
    StoryValue::Text(s)
  }
}
