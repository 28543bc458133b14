//! Ordered `[from, to]` selections into a document.
//!
//! A [`Selection`] is always normalized so that `from <= to`. When `from ==
//! to` the selection is collapsed, i.e. a cursor.
//!
//! ```text
//! from=2, to=7: "he[llo w]orld"
//! from=5, to=5: "hello|world"
//! ```
//!
//! # Mapping Through Changes
//!
//! When a change is committed, the selection follows it:
//!
//! ```ignore
//! let selection = selection.transform(&change, false);
//! ```
//!
//! `priority` decides what happens to a position sitting exactly where the
//! change inserts: without it the position is pushed past the insert (the
//! cursor follows text typed at it), with it the position stays put.

use std::ops::Range;

use serde::{
  Deserialize,
  Serialize,
};
use the_delta::Delta;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
  pub from: usize,
  pub to:   usize,
}

impl Selection {
  /// Create a selection, reordering the bounds if needed.
  pub fn new(from: usize, to: usize) -> Self {
    Self {
      from: from.min(to),
      to:   from.max(to),
    }
  }

  pub fn point(pos: usize) -> Self {
    Self { from: pos, to: pos }
  }

  #[inline]
  pub fn is_collapsed(&self) -> bool {
    self.from == self.to
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.to - self.from
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.is_collapsed()
  }

  #[inline]
  pub fn range(&self) -> Range<usize> {
    self.from..self.to
  }

  /// Clamp both ends to `0..=max`.
  #[must_use]
  pub fn clamp(self, max: usize) -> Self {
    Self::new(self.from.min(max), self.to.min(max))
  }

  /// Map both ends through `change`.
  #[must_use]
  pub fn transform(self, change: &Delta, priority: bool) -> Self {
    Self::new(
      change.transform_position(self.from, priority),
      change.transform_position(self.to, priority),
    )
  }
}

impl From<usize> for Selection {
  fn from(pos: usize) -> Self {
    Self::point(pos)
  }
}

impl From<(usize, usize)> for Selection {
  fn from((from, to): (usize, usize)) -> Self {
    Self::new(from, to)
  }
}

impl From<Range<usize>> for Selection {
  fn from(range: Range<usize>) -> Self {
    Self::new(range.start, range.end)
  }
}
