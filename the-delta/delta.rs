use std::ops::{
  Bound,
  RangeBounds,
};

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;
use the_diff::Tag;
use thiserror::Error;

use crate::{
  Tendril,
  attributes::Attributes,
  iter::OpIter,
  op::{
    Content,
    Op,
    OpError,
    OpKind,
  },
};

pub type Result<T> = std::result::Result<T, DeltaError>;

/// Stand-in for an embed when flattening a document to text.
const EMBED_CHAR: char = '\0';

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeltaError {
  #[error("cannot diff the {side} delta: it contains non-insert ops")]
  NotADocument { side: &'static str },
  #[error("cursor {cursor} is out of bounds for document length {len}")]
  CursorOutOfBounds { cursor: usize, len: usize },
  #[error(transparent)]
  Op(#[from] OpError),
}

/// An ordered list of [`Op`]s.
///
/// A delta plays two roles. A *document* contains only inserts. A *change*
/// mixes retains, deletes and inserts and is read left to right against a
/// document. Either way ops are kept canonical by the builder methods:
/// adjacent ops of the same kind and attributes are merged, a delete
/// directly followed by an insert is stored insert first, and zero-length
/// ops are dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
  ops: Vec<Op>,
}

impl Delta {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      ops: Vec::with_capacity(capacity),
    }
  }

  pub fn ops(&self) -> &[Op] {
    &self.ops
  }

  pub fn into_ops(self) -> Vec<Op> {
    self.ops
  }

  pub fn iter(&self) -> OpIter<'_> {
    OpIter::new(&self.ops)
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  /// Sum of all op lengths.
  pub fn len(&self) -> usize {
    self.ops.iter().map(Op::len).sum()
  }

  /// Length of the document this change applies to. Saturates at
  /// `usize::MAX`, which no document can match.
  pub fn base_len(&self) -> usize {
    self
      .ops
      .iter()
      .filter(|op| !op.is_insert())
      .fold(0, |len, op| len.saturating_add(op.len()))
  }

  /// How much applying this change grows (or shrinks) a document.
  pub fn change_len(&self) -> isize {
    self.ops.iter().fold(0, |len, op| {
      match op {
        Op::Insert(..) => len.saturating_add_unsigned(op.len()),
        Op::Delete(n) => len.saturating_sub_unsigned(*n),
        Op::Retain(..) => len,
      }
    })
  }

  /// Whether every op is an insert.
  pub fn is_document(&self) -> bool {
    self.ops.iter().all(Op::is_insert)
  }

  /// Concatenated text of all text inserts. Embeds are skipped.
  pub fn text(&self) -> String {
    self
      .ops
      .iter()
      .filter_map(|op| {
        match op {
          Op::Insert(content, _) => content.as_text(),
          _ => None,
        }
      })
      .collect()
  }

  // Builder operations: insert/delete/retain.
  //

  pub fn insert(&mut self, text: &str) -> &mut Self {
    self.insert_with(text, None)
  }

  pub fn insert_with(&mut self, text: &str, attributes: Option<Attributes>) -> &mut Self {
    if text.is_empty() {
      return self;
    }
    self.push(Op::Insert(
      Content::Text(Tendril::from(text)),
      attributes.and_then(Attributes::non_empty),
    ))
  }

  /// Insert an embed. A `null` embed is not content and is ignored.
  pub fn insert_embed(&mut self, embed: Value, attributes: Option<Attributes>) -> &mut Self {
    self.push(Op::Insert(
      Content::Embed(embed),
      attributes.and_then(Attributes::non_empty),
    ))
  }

  pub fn delete(&mut self, n: usize) -> &mut Self {
    self.push(Op::Delete(n))
  }

  pub fn retain(&mut self, n: usize) -> &mut Self {
    self.retain_with(n, None)
  }

  pub fn retain_with(&mut self, n: usize, attributes: Option<Attributes>) -> &mut Self {
    self.push(Op::Retain(n, attributes.and_then(Attributes::non_empty)))
  }

  /// Append an op, merging it into the previous one where possible.
  pub fn push(&mut self, op: Op) -> &mut Self {
    use Op::*;

    if op.is_empty() || matches!(op, Insert(Content::Embed(Value::Null), _)) {
      return self;
    }

    let mut index = self.ops.len();
    if let (Some(Delete(last)), Delete(n)) = (self.ops.last_mut(), &op) {
      *last = last.saturating_add(*n);
      return self;
    }

    // Inserting before or after a delete at the same position is equivalent,
    // so inserts always go first.
    if matches!(self.ops.last(), Some(Delete(_))) && op.is_insert() {
      index -= 1;
      if index == 0 {
        self.ops.insert(0, op);
        return self;
      }
    }

    if index > 0 {
      match (&mut self.ops[index - 1], &op) {
        (Insert(Content::Text(prev), prev_attrs), Insert(Content::Text(text), attrs))
          if *prev_attrs == *attrs =>
        {
          prev.push_str(text);
          return self;
        },
        (Retain(prev, prev_attrs), Retain(n, attrs)) if *prev_attrs == *attrs => {
          *prev = prev.saturating_add(*n);
          return self;
        },
        _ => {},
      }
    }

    self.ops.insert(index, op);
    self
  }

  /// Drop a trailing plain retain, which has no effect.
  pub fn chop(&mut self) -> &mut Self {
    if matches!(self.ops.last(), Some(Op::Retain(_, None))) {
      self.ops.pop();
    }
    self
  }

  /// The ops covering `range`, split at its bounds.
  pub fn slice(&self, range: impl RangeBounds<usize>) -> Delta {
    let start = match range.start_bound() {
      Bound::Included(&start) => start,
      Bound::Excluded(&start) => start + 1,
      Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
      Bound::Included(&end) => end + 1,
      Bound::Excluded(&end) => end,
      Bound::Unbounded => usize::MAX,
    };

    let mut delta = Delta::new();
    let mut iter = self.iter();
    let mut index = 0;
    while index < end && iter.has_next() {
      let op = if index < start {
        iter.next_len(start - index)
      } else {
        let op = iter.next_len(end - index);
        delta.push(op.clone());
        op
      };
      index += op.len();
    }
    delta
  }

  /// Append `other`, merging at the seam.
  pub fn concat(&self, other: &Delta) -> Delta {
    let mut delta = self.clone();
    let mut ops = other.ops.iter();
    if let Some(first) = ops.next() {
      delta.push(first.clone());
      delta.ops.extend(ops.cloned());
    }
    delta
  }

  /// The delta equivalent to applying `self` and then `other`.
  pub fn compose(&self, other: &Delta) -> Delta {
    let mut this_iter = self.iter();
    let mut other_iter = other.iter();
    let mut delta = Delta::with_capacity(self.ops.len() + other.ops.len());

    // A leading plain retain in `other` keeps our leading inserts verbatim.
    if let Some(&Op::Retain(first_retain, None)) = other_iter.peek() {
      let mut first_left = first_retain;
      while this_iter.peek_kind() == OpKind::Insert && this_iter.peek_len() <= first_left {
        first_left -= this_iter.peek_len();
        delta.push(this_iter.next_len(usize::MAX));
      }
      if first_retain > first_left {
        other_iter.next_len(first_retain - first_left);
      }
    }

    while this_iter.has_next() || other_iter.has_next() {
      if other_iter.peek_kind() == OpKind::Insert {
        delta.push(other_iter.next_len(usize::MAX));
      } else if this_iter.peek_kind() == OpKind::Delete {
        delta.push(this_iter.next_len(usize::MAX));
      } else {
        let len = this_iter.peek_len().min(other_iter.peek_len());
        let this_op = this_iter.next_len(len);
        let other_op = other_iter.next_len(len);
        match (this_op, other_op) {
          (this_op, Op::Retain(_, other_attrs)) => {
            let keep_null = this_op.is_retain();
            let attributes =
              Attributes::compose(this_op.attributes(), other_attrs.as_ref(), keep_null);
            let op = match this_op {
              Op::Insert(content, _) => Op::Insert(content, attributes),
              _ => Op::Retain(len, attributes),
            };
            delta.push(op.clone());

            // The rest of `other` is a plain retain: copy the rest of `self`.
            if !other_iter.has_next() && delta.ops.last() == Some(&op) {
              let rest = Delta {
                ops: this_iter.rest(),
              };
              let mut delta = delta.concat(&rest);
              delta.chop();
              return delta;
            }
          },
          (Op::Retain(..), Op::Delete(n)) => {
            delta.push(Op::Delete(n));
          },
          // Deleting our insert cancels both.
          _ => {},
        }
      }
    }

    delta.chop();
    delta
  }

  /// Rebase `other` so it applies after `self`, both having been made against
  /// the same document.
  ///
  /// `priority` decides ties: when `true`, `self` is considered to have
  /// happened first, so its inserts land before inserts of `other` at the
  /// same position and its attribute changes win.
  pub fn transform(&self, other: &Delta, priority: bool) -> Delta {
    let mut this_iter = self.iter();
    let mut other_iter = other.iter();
    let mut delta = Delta::new();

    while this_iter.has_next() || other_iter.has_next() {
      if this_iter.peek_kind() == OpKind::Insert
        && (priority || other_iter.peek_kind() != OpKind::Insert)
      {
        let op = this_iter.next_len(usize::MAX);
        delta.retain(op.len());
      } else if other_iter.peek_kind() == OpKind::Insert {
        delta.push(other_iter.next_len(usize::MAX));
      } else {
        let len = this_iter.peek_len().min(other_iter.peek_len());
        let this_op = this_iter.next_len(len);
        let other_op = other_iter.next_len(len);
        if this_op.is_delete() {
          // Already gone.
          continue;
        }
        if other_op.is_delete() {
          delta.push(other_op);
        } else {
          delta.retain_with(
            len,
            Attributes::transform(this_op.attributes(), other_op.attributes(), priority),
          );
        }
      }
    }

    delta.chop();
    delta
  }

  /// Map a position through this change.
  ///
  /// An insert exactly at `index` pushes it forward unless `priority` is set.
  pub fn transform_position(&self, index: usize, priority: bool) -> usize {
    let mut index = index;
    let mut offset = 0;
    let mut iter = self.iter();
    while iter.has_next() && offset <= index {
      let len = iter.peek_len();
      let kind = iter.peek_kind();
      iter.next_len(usize::MAX);
      match kind {
        OpKind::Delete => {
          index -= len.min(index - offset);
          continue;
        },
        OpKind::Insert if offset < index || !priority => index += len,
        _ => {},
      }
      offset += len;
    }
    index
  }

  /// The change that undoes `self` on top of `base`, the document `self` was
  /// applied to.
  pub fn invert(&self, base: &Delta) -> Delta {
    let mut inverted = Delta::new();
    let mut base_index = 0;
    for op in &self.ops {
      match op {
        Op::Insert(..) => {
          inverted.delete(op.len());
        },
        Op::Retain(n, None) => {
          inverted.retain(*n);
          base_index += n;
        },
        Op::Delete(n) | Op::Retain(n, Some(_)) => {
          for base_op in base.slice(base_index..base_index + n).ops {
            match op {
              Op::Delete(_) => {
                inverted.push(base_op);
              },
              _ => {
                inverted.retain_with(
                  base_op.len(),
                  Attributes::invert(op.attributes(), base_op.attributes()),
                );
              },
            }
          }
          base_index += n;
        },
      }
    }
    inverted.chop();
    inverted
  }

  /// The change turning the document `self` into the document `other`.
  ///
  /// `cursor` is where the cursor sat in `self`; it decides where an
  /// ambiguous edit is placed.
  pub fn diff(&self, other: &Delta, cursor: Option<usize>) -> Result<Delta> {
    if self.ops == other.ops {
      return Ok(Delta::new());
    }

    let old = self.flatten("old")?;
    let new = other.flatten("new")?;
    if let Some(cursor) = cursor.filter(|&cursor| cursor > old.len()) {
      return Err(DeltaError::CursorOutOfBounds {
        cursor,
        len: old.len(),
      });
    }

    let mut delta = Delta::new();
    let mut this_iter = self.iter();
    let mut other_iter = other.iter();
    for edit in the_diff::diff(&old, &new, cursor) {
      let mut len = edit.len();
      while len > 0 {
        let op_len = match edit.tag {
          Tag::Insert => {
            let op_len = other_iter.peek_len().min(len);
            delta.push(other_iter.next_len(op_len));
            op_len
          },
          Tag::Delete => {
            let op_len = this_iter.peek_len().min(len);
            this_iter.next_len(op_len);
            delta.delete(op_len);
            op_len
          },
          Tag::Equal => {
            let op_len = this_iter.peek_len().min(other_iter.peek_len()).min(len);
            let this_op = this_iter.next_len(op_len);
            let other_op = other_iter.next_len(op_len);
            match (this_op, other_op) {
              (Op::Insert(this, this_attrs), Op::Insert(that, other_attrs)) if this == that => {
                delta.retain_with(
                  op_len,
                  Attributes::diff(this_attrs.as_ref(), other_attrs.as_ref()),
                );
              },
              (_, other_op) => {
                // Embeds flatten to the same char but may differ.
                delta.push(other_op).delete(op_len);
              },
            }
            op_len
          },
        };
        len -= op_len;
      }
    }

    delta.chop();
    tracing::trace!(
      old_len = old.len(),
      new_len = new.len(),
      ops = delta.ops.len(),
      "diffed documents"
    );
    Ok(delta)
  }

  /// The document as chars, with embeds replaced by a placeholder.
  fn flatten(&self, side: &'static str) -> Result<Vec<char>> {
    let mut chars = Vec::with_capacity(self.ops.len());
    for op in &self.ops {
      match op {
        Op::Insert(Content::Text(text), _) => chars.extend(text.chars()),
        Op::Insert(Content::Embed(_), _) => chars.push(EMBED_CHAR),
        _ => return Err(DeltaError::NotADocument { side }),
      }
    }
    Ok(chars)
  }
}

impl TryFrom<Vec<Op>> for Delta {
  type Error = DeltaError;

  /// Like [`Delta::from_iter`], but rejects ops that cannot appear in a
  /// delta instead of dropping them.
  fn try_from(ops: Vec<Op>) -> Result<Self> {
    let ops = ops
      .into_iter()
      .map(Op::validate)
      .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ops.into_iter().collect())
  }
}

impl FromIterator<Op> for Delta {
  fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
    let mut delta = Delta::new();
    for op in iter {
      delta.push(op);
    }
    delta
  }
}

impl<'a> IntoIterator for &'a Delta {
  type Item = &'a Op;
  type IntoIter = std::slice::Iter<'a, Op>;

  fn into_iter(self) -> Self::IntoIter {
    self.ops.iter()
  }
}
