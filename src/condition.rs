//! Pure evaluation of edge conditions against a variable bag.

use std::fmt;

use tracing::instrument;

use crate::condition_parser::parse_condition;
use crate::error::EvaluationError;
use crate::types::{StoryValue, VariableBag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
  Equals,
  NotEquals,
  GreaterThan,
  GreaterOrEqual,
  LessThan,
  LessOrEqual,
  Includes,
}

impl fmt::Display for ConditionOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConditionOperator::Equals => "==",
      ConditionOperator::NotEquals => "!=",
      ConditionOperator::GreaterThan => ">",
      ConditionOperator::GreaterOrEqual => ">=",
      ConditionOperator::LessThan => "<",
      ConditionOperator::LessOrEqual => "<=",
      ConditionOperator::Includes => "includes",
    };
    f.write_str(s)
  }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
  Compare {
    variable_id: String,
    operator: ConditionOperator,
    value: StoryValue,
  },
  /// True when the variable holds a non-null value.
  Exists { variable_id: String },
  Not(Box<ConditionExpr>),
  All(Vec<ConditionExpr>),
  Any(Vec<ConditionExpr>),
}

impl ConditionExpr {
  /// Evaluates against `bag`. `All`/`Any` short-circuit left to right.
  pub fn evaluate(&self, bag: &VariableBag) -> Result<bool, EvaluationError> {
    match self {
      ConditionExpr::Compare {
        variable_id,
        operator,
        value,
      } => compare(variable_id, *operator, lookup(bag, variable_id)?, value),
      ConditionExpr::Exists { variable_id } => Ok(!lookup(bag, variable_id)?.is_null()),
      ConditionExpr::Not(inner) => Ok(!inner.evaluate(bag)?),
      ConditionExpr::All(terms) => {
        for t in terms {
          if !t.evaluate(bag)? {
            return Ok(false);
          }
        }
        Ok(true)
      }
      ConditionExpr::Any(terms) => {
        for t in terms {
          if t.evaluate(bag)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
    }
  }

  /// Every variable id referenced anywhere in the expression, in source order.
  pub fn referenced_variables(&self) -> Vec<&str> {
    let mut out = Vec::new();
    self.collect_variables(&mut out);
    out
  }

  fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      ConditionExpr::Compare { variable_id, .. } | ConditionExpr::Exists { variable_id } => {
        out.push(variable_id)
      }
      ConditionExpr::Not(inner) => inner.collect_variables(out),
      ConditionExpr::All(terms) | ConditionExpr::Any(terms) => {
        for t in terms {
          t.collect_variables(out);
        }
      }
    }
  }
}

/// Parses and evaluates `expr` against `bag`.
#[instrument(level = "trace", skip(bag))]
pub fn evaluate(expr: &str, bag: &VariableBag) -> Result<bool, EvaluationError> {
  parse_condition(expr)?.evaluate(bag)
}

fn lookup<'a>(bag: &'a VariableBag, variable_id: &str) -> Result<&'a StoryValue, EvaluationError> {
  bag
    .get(variable_id)
    .ok_or_else(|| EvaluationError::UnknownVariable {
      variable_id: variable_id.to_string(),
    })
}

fn compare(
  variable_id: &str,
  operator: ConditionOperator,
  actual: &StoryValue,
  expected: &StoryValue,
) -> Result<bool, EvaluationError> {
  let mismatch = || EvaluationError::TypeMismatch {
    variable_id: variable_id.to_string(),
    operator: operator.to_string(),
    found: actual.type_name(),
  };
  match operator {
    ConditionOperator::Equals => Ok(actual == expected),
    ConditionOperator::NotEquals => Ok(actual != expected),
    ConditionOperator::Includes => actual.includes(expected).ok_or_else(mismatch),
    ConditionOperator::GreaterThan
    | ConditionOperator::GreaterOrEqual
    | ConditionOperator::LessThan
    | ConditionOperator::LessOrEqual => {
      let (a, b) = match (actual.as_number(), expected.as_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(mismatch()),
      };
      Ok(match operator {
        ConditionOperator::GreaterThan => a > b,
        ConditionOperator::GreaterOrEqual => a >= b,
        ConditionOperator::LessThan => a < b,
        _ => a <= b,
      })
    }
  }
}
