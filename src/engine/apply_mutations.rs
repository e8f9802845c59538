//! Apply a choice's variable mutations to a session's variable bag.

use tracing::instrument;

use crate::error::MutationError;
use crate::types::{MutationOp, StoryValue, VariableBag, VariableMutation};

/// Applies `actions` in order to a copy of `bag` and returns it.
///
/// All-or-nothing: on the first failing mutation the error is returned and `bag` is untouched.
#[instrument(level = "trace", skip(bag, actions), fields(actions = actions.len()))]
pub fn apply_mutations(
  bag: &VariableBag,
  actions: &[VariableMutation],
) -> Result<VariableBag, MutationError> {
  let mut next = bag.clone();
  for action in actions {
    let current = next
      .get_mut(&action.variable_id)
      .ok_or_else(|| MutationError::UnknownVariable {
        variable_id: action.variable_id.clone(),
      })?;
    *current = apply_one(action, current)?;
  }
  Ok(next)
}

/// Computes the new value of one variable. Null behaves as the identity of the operation.
pub(crate) fn apply_one(
  action: &VariableMutation,
  current: &StoryValue,
) -> Result<StoryValue, MutationError> {
  let mismatch = || MutationError::TypeMismatch {
    variable_id: action.variable_id.clone(),
    operation: action.operation.to_string(),
    found: current.type_name(),
    value_type: action.value.type_name(),
  };
  let value = &action.value;
  match action.operation {
    MutationOp::Set => {
      if current.is_null() || value.is_null() || current.type_name() == value.type_name() {
        Ok(value.clone())
      } else {
        Err(mismatch())
      }
    }
    MutationOp::Add => match (current, value) {
      (StoryValue::Number(a), StoryValue::Number(b)) => Ok(StoryValue::Number(a + b)),
      (StoryValue::Null, StoryValue::Number(b)) => Ok(StoryValue::Number(*b)),
      (StoryValue::Text(a), StoryValue::Text(b)) => Ok(StoryValue::Text(format!("{}{}", a, b))),
      (StoryValue::List(items), v) => {
        let mut items = items.clone();
        items.push(v.clone());
        Ok(StoryValue::List(items))
      }
      _ => Err(mismatch()),
    },
    MutationOp::Subtract => match (current, value) {
      (StoryValue::Number(a), StoryValue::Number(b)) => Ok(StoryValue::Number(a - b)),
      (StoryValue::Null, StoryValue::Number(b)) => Ok(StoryValue::Number(-b)),
      (StoryValue::List(items), v) => Ok(StoryValue::List(
        items.iter().filter(|i| *i != v).cloned().collect(),
      )),
      _ => Err(mismatch()),
    },
    MutationOp::Toggle => match current {
      StoryValue::Bool(b) => Ok(StoryValue::Bool(!b)),
      StoryValue::Null => Ok(StoryValue::Bool(true)),
      _ => Err(mismatch()),
    },
  }
}
