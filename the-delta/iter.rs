use crate::op::{
  Op,
  OpKind,
};

/// Cursor over a slice of ops that hands them out in pieces of a requested
/// length.
///
/// Once the ops run out the iterator behaves as if it were followed by an
/// endless plain retain: [`OpIter::peek_len`] is `usize::MAX`,
/// [`OpIter::peek_kind`] is [`OpKind::Retain`] and [`OpIter::next_len`]
/// returns `Retain(usize::MAX)`. Algorithms walking two deltas in lockstep
/// rely on this to treat the shorter delta as retaining the remainder.
#[derive(Debug, Clone)]
pub struct OpIter<'a> {
  ops:    &'a [Op],
  index:  usize,
  /// Characters of `ops[index]` already handed out.
  offset: usize,
}

impl<'a> OpIter<'a> {
  pub fn new(ops: &'a [Op]) -> Self {
    Self {
      ops,
      index: 0,
      offset: 0,
    }
  }

  pub fn has_next(&self) -> bool {
    self.index < self.ops.len()
  }

  /// The current op, including any part already handed out.
  pub fn peek(&self) -> Option<&'a Op> {
    self.ops.get(self.index)
  }

  /// Remaining length of the current op.
  pub fn peek_len(&self) -> usize {
    match self.peek() {
      Some(op) => op.len() - self.offset,
      None => usize::MAX,
    }
  }

  pub fn peek_kind(&self) -> OpKind {
    self.peek().map_or(OpKind::Retain, Op::kind)
  }

  /// Characters of the current op already handed out.
  pub fn offset(&self) -> usize {
    self.offset
  }

  /// Hand out at most `max` characters of the current op.
  pub fn next_len(&mut self, max: usize) -> Op {
    let Some(op) = self.peek() else {
      return Op::Retain(usize::MAX, None);
    };
    let offset = self.offset;
    let remaining = op.len() - offset;
    let len = if max >= remaining {
      self.index += 1;
      self.offset = 0;
      remaining
    } else {
      self.offset += max;
      max
    };
    if offset == 0 && len == op.len() {
      op.clone()
    } else {
      op.slice(offset, len)
    }
  }

  /// Everything not yet handed out.
  pub fn rest(&self) -> Vec<Op> {
    let Some(op) = self.peek() else {
      return Vec::new();
    };
    let mut rest = Vec::with_capacity(self.ops.len() - self.index);
    if self.offset == 0 {
      rest.push(op.clone());
    } else {
      rest.push(op.slice(self.offset, op.len() - self.offset));
    }
    rest.extend_from_slice(&self.ops[self.index + 1..]);
    rest
  }
}

impl Iterator for OpIter<'_> {
  type Item = Op;

  fn next(&mut self) -> Option<Op> {
    self.has_next().then(|| self.next_len(usize::MAX))
  }
}
