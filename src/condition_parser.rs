//! Parser for edge condition expressions.
//!
//! ```text
//! expr       := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!" unary | "(" expr ")" | "exists" IDENT | comparison
//! comparison := IDENT op literal
//! op         := "==" | "!=" | ">" | ">=" | "<" | "<=" | "includes"
//!             | "equals" | "notEquals" | "greaterThan" | "lessThan"
//! literal    := number | "string" | 'string' | true | false | null
//! ```

use crate::condition::{ConditionExpr, ConditionOperator};
use crate::error::ConditionParseError;
use crate::types::StoryValue;

/// Deepest `!` / `(` nesting accepted before parsing fails.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
  Ident(String),
  Number(f64),
  Str(String),
  Op(ConditionOperator),
  And,
  Or,
  Not,
  LParen,
  RParen,
}

/// Parses a condition string into a [`ConditionExpr`].
pub fn parse_condition(source: &str) -> Result<ConditionExpr, ConditionParseError> {
  let tokens = tokenize(source)?;
  if tokens.is_empty() {
    return Err(ConditionParseError::new("empty condition", 0));
  }
  let mut parser = Parser {
    tokens,
    pos: 0,
    depth: 0,
  };
  let expr = parser.parse_or()?;
  if let Some((_, offset)) = parser.tokens.get(parser.pos) {
    return Err(ConditionParseError::new("unexpected trailing input", *offset));
  }
  Ok(expr)
}

/// Splits `source` into tokens, each paired with its byte offset.
pub(crate) fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ConditionParseError> {
  let bytes = source.as_bytes();
  let mut tokens = Vec::new();
  let mut i = 0;
  while i < bytes.len() {
    let c = bytes[i];
    let start = i;
    match c {
      b' ' | b'\t' | b'\n' | b'\r' => {
        i += 1;
      }
      b'(' => {
        tokens.push((Token::LParen, start));
        i += 1;
      }
      b')' => {
        tokens.push((Token::RParen, start));
        i += 1;
      }
      b'&' | b'|' => {
        if bytes.get(i + 1) != Some(&c) {
          return Err(ConditionParseError::new(
            format!("expected '{}{}'", c as char, c as char),
            start,
          ));
        }
        tokens.push((if c == b'&' { Token::And } else { Token::Or }, start));
        i += 2;
      }
      b'=' => {
        if bytes.get(i + 1) == Some(&b'=') {
          i += 2;
        } else {
          i += 1;
        }
        tokens.push((Token::Op(ConditionOperator::Equals), start));
      }
      b'!' => {
        if bytes.get(i + 1) == Some(&b'=') {
          tokens.push((Token::Op(ConditionOperator::NotEquals), start));
          i += 2;
        } else {
          tokens.push((Token::Not, start));
          i += 1;
        }
      }
      b'>' | b'<' => {
        let or_equal = bytes.get(i + 1) == Some(&b'=');
        let op = match (c, or_equal) {
          (b'>', false) => ConditionOperator::GreaterThan,
          (b'>', true) => ConditionOperator::GreaterOrEqual,
          (_, false) => ConditionOperator::LessThan,
          (_, true) => ConditionOperator::LessOrEqual,
        };
        tokens.push((Token::Op(op), start));
        i += if or_equal { 2 } else { 1 };
      }
      b'"' | b'\'' => {
        let (s, next) = read_string(source, i)?;
        tokens.push((Token::Str(s), start));
        i = next;
      }
      b'0'..=b'9' | b'-' | b'.' => {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
          i += 1;
        }
        let text = &source[start..i];
        let n: f64 = text
          .parse()
          .map_err(|_| ConditionParseError::new(format!("invalid number '{}'", text), start))?;
        tokens.push((Token::Number(n), start));
      }
      c if c.is_ascii_alphabetic() || c == b'_' => {
        while i < bytes.len() && is_ident_byte(bytes[i]) {
          i += 1;
        }
        let word = &source[start..i];
        let token = match word {
          "equals" => Token::Op(ConditionOperator::Equals),
          "notEquals" => Token::Op(ConditionOperator::NotEquals),
          "greaterThan" => Token::Op(ConditionOperator::GreaterThan),
          "lessThan" => Token::Op(ConditionOperator::LessThan),
          "includes" => Token::Op(ConditionOperator::Includes),
          _ => Token::Ident(word.to_string()),
        };
        tokens.push((token, start));
      }
      _ => {
        let ch = source[start..].chars().next().unwrap_or('?');
        return Err(ConditionParseError::new(
          format!("unexpected character '{}'", ch),
          start,
        ));
      }
    }
  }
  Ok(tokens)
}

/// Identifiers may contain dots and dashes so that ids like `flags.met-guard` work.
fn is_ident_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
}

/// Reads a quoted string starting at `start` (the quote). Supports `\"`, `\'` and `\\`.
fn read_string(source: &str, start: usize) -> Result<(String, usize), ConditionParseError> {
  let quote = source.as_bytes()[start] as char;
  let mut out = String::new();
  let mut chars = source[start + 1..].char_indices();
  while let Some((off, ch)) = chars.next() {
    match ch {
      '\\' => match chars.next() {
        Some((_, esc)) => out.push(esc),
        None => break,
      },
      c if c == quote => return Ok((out, start + 1 + off + 1)),
      c => out.push(c),
    }
  }
  Err(ConditionParseError::new("unterminated string", start))
}

struct Parser {
  tokens: Vec<(Token, usize)>,
  pos: usize,
  depth: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos).map(|(t, _)| t)
  }

  fn offset(&self) -> usize {
    self
      .tokens
      .get(self.pos)
      .or_else(|| self.tokens.last())
      .map(|(_, o)| *o)
      .unwrap_or(0)
  }

  fn next(&mut self) -> Option<Token> {
    let t = self.tokens.get(self.pos).map(|(t, _)| t.clone());
    if t.is_some() {
      self.pos += 1;
    }
    t
  }

  fn parse_or(&mut self) -> Result<ConditionExpr, ConditionParseError> {
    let mut terms = vec![self.parse_and()?];
    while self.peek() == Some(&Token::Or) {
      self.pos += 1;
      terms.push(self.parse_and()?);
    }
    Ok(if terms.len() == 1 {
      terms.remove(0)
    } else {
      ConditionExpr::Any(terms)
    })
  }

  fn parse_and(&mut self) -> Result<ConditionExpr, ConditionParseError> {
    let mut terms = vec![self.parse_unary()?];
    while self.peek() == Some(&Token::And) {
      self.pos += 1;
      terms.push(self.parse_unary()?);
    }
    Ok(if terms.len() == 1 {
      terms.remove(0)
    } else {
      ConditionExpr::All(terms)
    })
  }

  /// Runs `f` one nesting level deeper, failing past [`MAX_NESTING`].
  fn nested<T>(
    &mut self,
    offset: usize,
    f: impl FnOnce(&mut Self) -> Result<T, ConditionParseError>,
  ) -> Result<T, ConditionParseError> {
    if self.depth >= MAX_NESTING {
      return Err(ConditionParseError::new("condition nested too deeply", offset));
    }
    self.depth += 1;
    let result = f(self);
    self.depth -= 1;
    result
  }

  fn parse_unary(&mut self) -> Result<ConditionExpr, ConditionParseError> {
    let offset = self.offset();
    match self.next() {
      Some(Token::Not) => {
        let inner = self.nested(offset, Self::parse_unary)?;
        Ok(ConditionExpr::Not(Box::new(inner)))
      }
      Some(Token::LParen) => {
        let inner = self.nested(offset, Self::parse_or)?;
        match self.next() {
          Some(Token::RParen) => Ok(inner),
          _ => Err(ConditionParseError::new("expected ')'", self.offset())),
        }
      }
      Some(Token::Ident(word)) if word == "exists" => match self.next() {
        Some(Token::Ident(variable_id)) => Ok(ConditionExpr::Exists { variable_id }),
        _ => Err(ConditionParseError::new(
          "expected variable after 'exists'",
          self.offset(),
        )),
      },
      Some(Token::Ident(variable_id)) => {
        let op_offset = self.offset();
        let operator = match self.next() {
          Some(Token::Op(op)) => op,
          _ => {
            return Err(ConditionParseError::new(
              format!("expected operator after '{}'", variable_id),
              op_offset,
            ));
          }
        };
        let value = self.parse_literal()?;
        Ok(ConditionExpr::Compare {
          variable_id,
          operator,
          value,
        })
      }
      _ => Err(ConditionParseError::new("expected condition", offset)),
    }
  }

  fn parse_literal(&mut self) -> Result<StoryValue, ConditionParseError> {
    let offset = self.offset();
    match self.next() {
      Some(Token::Number(n)) => Ok(StoryValue::Number(n)),
      Some(Token::Str(s)) => Ok(StoryValue::Text(s)),
      Some(Token::Ident(w)) if w == "true" => Ok(StoryValue::Bool(true)),
      Some(Token::Ident(w)) if w == "false" => Ok(StoryValue::Bool(false)),
      Some(Token::Ident(w)) if w == "null" => Ok(StoryValue::Null),
      _ => Err(ConditionParseError::new("expected literal value", offset)),
    }
  }
}
