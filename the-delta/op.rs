use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;
use thiserror::Error;

use crate::{
  Tendril,
  attributes::Attributes,
};

/// Errors decoding an [`Op`] from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OpError {
  #[error("op must have exactly one of `insert`, `delete` or `retain`")]
  AmbiguousKind,
  #[error("op has a zero length")]
  Empty,
  #[error("`delete` ops cannot carry attributes")]
  AttributesOnDelete,
  #[error("embeds cannot be null")]
  NullEmbed,
}

/// Inserted content: a text run or a single length-1 embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
  Text(Tendril),
  Embed(Value),
}

impl Content {
  pub fn len(&self) -> usize {
    match self {
      Content::Text(text) => text.chars().count(),
      Content::Embed(_) => 1,
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Content::Text(text) => text.is_empty(),
      Content::Embed(_) => false,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Content::Text(text) => Some(text.as_str()),
      Content::Embed(_) => None,
    }
  }

  pub fn is_embed(&self) -> bool {
    matches!(self, Content::Embed(_))
  }
}

impl From<&str> for Content {
  fn from(text: &str) -> Self {
    Content::Text(text.into())
  }
}

impl From<Tendril> for Content {
  fn from(text: Tendril) -> Self {
    Content::Text(text)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOp", into = "RawOp")]
pub enum Op {
  /// Insert new content.
  Insert(Content, Option<Attributes>),

  /// Delete n characters.
  Delete(usize),

  /// Keep n characters, optionally reformatting them.
  Retain(usize, Option<Attributes>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
  Insert,
  Delete,
  Retain,
}

impl Op {
  pub fn len(&self) -> usize {
    match self {
      Op::Insert(content, _) => content.len(),
      Op::Delete(n) | Op::Retain(n, _) => *n,
    }
  }

  /// Check that this op can appear in a delta.
  pub fn validate(self) -> Result<Self, OpError> {
    match &self {
      Op::Insert(Content::Embed(Value::Null), _) => Err(OpError::NullEmbed),
      _ if self.is_empty() => Err(OpError::Empty),
      _ => Ok(self),
    }
  }

  /// Zero-length ops never appear in a delta.
  pub fn is_empty(&self) -> bool {
    match self {
      Op::Insert(content, _) => content.is_empty(),
      Op::Delete(n) | Op::Retain(n, _) => *n == 0,
    }
  }

  pub fn kind(&self) -> OpKind {
    match self {
      Op::Insert(..) => OpKind::Insert,
      Op::Delete(_) => OpKind::Delete,
      Op::Retain(..) => OpKind::Retain,
    }
  }

  pub fn is_insert(&self) -> bool {
    matches!(self, Op::Insert(..))
  }

  pub fn is_delete(&self) -> bool {
    matches!(self, Op::Delete(_))
  }

  pub fn is_retain(&self) -> bool {
    matches!(self, Op::Retain(..))
  }

  pub fn attributes(&self) -> Option<&Attributes> {
    match self {
      Op::Insert(_, attributes) | Op::Retain(_, attributes) => attributes.as_ref(),
      Op::Delete(_) => None,
    }
  }

  /// The `len` characters starting at `offset`, as an op of the same kind.
  pub(crate) fn slice(&self, offset: usize, len: usize) -> Op {
    match self {
      Op::Insert(Content::Text(text), attributes) => {
        Op::Insert(
          Content::Text(char_slice(text, offset, len).into()),
          attributes.clone(),
        )
      },
      Op::Insert(embed, attributes) => Op::Insert(embed.clone(), attributes.clone()),
      Op::Delete(_) => Op::Delete(len),
      Op::Retain(_, attributes) => Op::Retain(len, attributes.clone()),
    }
  }
}

/// Slice `text` by char offsets.
pub(crate) fn char_slice(text: &str, offset: usize, len: usize) -> &str {
  let mut indices = text.char_indices().map(|(i, _)| i).chain(Some(text.len()));
  let start = indices.nth(offset).unwrap_or(text.len());
  let end = match len {
    0 => start,
    len => indices.nth(len - 1).unwrap_or(text.len()),
  };
  &text[start..end]
}

/// Wire form: `{ insert | delete | retain, attributes? }`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOp {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  insert:     Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  delete:     Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  retain:     Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  attributes: Option<Attributes>,
}

impl TryFrom<RawOp> for Op {
  type Error = OpError;

  fn try_from(raw: RawOp) -> Result<Self, Self::Error> {
    let attributes = raw.attributes.and_then(Attributes::non_empty);
    let op = match (raw.insert, raw.delete, raw.retain) {
      (Some(Value::String(text)), None, None) => {
        Op::Insert(Content::Text(text.as_str().into()), attributes)
      },
      (Some(Value::Null), None, None) => return Err(OpError::NullEmbed),
      (Some(embed), None, None) => Op::Insert(Content::Embed(embed), attributes),
      (None, Some(n), None) => {
        if attributes.is_some() {
          return Err(OpError::AttributesOnDelete);
        }
        Op::Delete(n)
      },
      (None, None, Some(n)) => Op::Retain(n, attributes),
      _ => return Err(OpError::AmbiguousKind),
    };
    op.validate()
  }
}

impl From<Op> for RawOp {
  fn from(op: Op) -> Self {
    let mut raw = RawOp {
      insert:     None,
      delete:     None,
      retain:     None,
      attributes: None,
    };
    match op {
      Op::Insert(Content::Text(text), attributes) => {
        raw.insert = Some(Value::String(text.into()));
        raw.attributes = attributes;
      },
      Op::Insert(Content::Embed(embed), attributes) => {
        raw.insert = Some(embed);
        raw.attributes = attributes;
      },
      Op::Delete(n) => raw.delete = Some(n),
      Op::Retain(n, attributes) => {
        raw.retain = Some(n);
        raw.attributes = attributes;
      },
    }
    raw
  }
}
