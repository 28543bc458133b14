//! Character-level diffing between two text snapshots.
//!
//! The engine is a Myers O(ND) bisection diff with the usual speedups
//! (common prefix/suffix trimming and the half-match heuristic), followed by
//! a normalization pass that coalesces edit runs and slides edits across
//! equalities where that removes an equality.
//!
//! Two corrections run on the normalized result:
//!
//! - **Cursor bias** - when the caller knows where the cursor was in the old
//!   text, an ambiguous insertion is moved so that it starts at the cursor.
//! - **Surrogate repair** - when diffing UTF-16 code units, an edit never
//!   starts in the middle of a surrogate pair.
//!
//! ```ignore
//! use the_diff::{Tag, diff_str};
//!
//! let edits = diff_str("ab", "axb", Some(1));
//! assert_eq!(edits, vec![
//!   (Tag::Equal, "a".to_string()),
//!   (Tag::Insert, "x".to_string()),
//!   (Tag::Equal, "b".to_string()),
//! ]);
//! ```
//!
//! The engine is generic over [`Unit`], so the same code diffs `char`
//! slices, raw bytes and UTF-16 buffers.

mod cleanup;
mod compute;

use std::{
  fmt,
  time::Instant,
};

/// A single element of the sequences being compared.
pub trait Unit: Copy + Eq + fmt::Debug {
  /// First half of a UTF-16 surrogate pair.
  fn is_high_surrogate(self) -> bool {
    false
  }

  /// Second half of a UTF-16 surrogate pair.
  fn is_low_surrogate(self) -> bool {
    false
  }
}

impl Unit for char {}

impl Unit for u8 {}

impl Unit for u16 {
  fn is_high_surrogate(self) -> bool {
    (0xD800..=0xDBFF).contains(&self)
  }

  fn is_low_surrogate(self) -> bool {
    (0xDC00..=0xDFFF).contains(&self)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
  /// Present in both texts.
  Equal,
  /// Only present in the old text.
  Delete,
  /// Only present in the new text.
  Insert,
}

/// A run of units sharing the same [`Tag`]. Edits returned by [`diff`] are
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit<T> {
  pub tag:  Tag,
  pub text: Vec<T>,
}

impl<T> Edit<T> {
  pub fn new(tag: Tag, text: Vec<T>) -> Self {
    Self { tag, text }
  }

  pub fn len(&self) -> usize {
    self.text.len()
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }
}

/// Compute the edits turning `old` into `new`.
///
/// Concatenating the `Equal` and `Delete` runs reproduces `old`, and
/// concatenating the `Equal` and `Insert` runs reproduces `new`.
///
/// `cursor` is an offset into `old` used to break ties between equally small
/// diffs. An offset past the end of `old` is ignored.
pub fn diff<T: Unit>(old: &[T], new: &[T], cursor: Option<usize>) -> Vec<Edit<T>> {
  let start = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);

  let cursor = cursor.filter(|&pos| pos <= old.len());
  let mut edits = compute::diff_main(old, new);
  if let Some(pos) = cursor {
    edits = cleanup::fix_cursor(edits, pos);
  }
  cleanup::fix_surrogates(&mut edits);

  if let Some(start) = start {
    tracing::debug!(
      old_len = old.len(),
      new_len = new.len(),
      edits = edits.len(),
      "text diff took {}s",
      Instant::now().duration_since(start).as_secs_f64()
    );
  }
  edits
}

/// [`diff`] over the chars of two strings, returning owned string runs.
pub fn diff_str(old: &str, new: &str, cursor: Option<usize>) -> Vec<(Tag, String)> {
  let old: Vec<char> = old.chars().collect();
  let new: Vec<char> = new.chars().collect();
  diff(&old, &new, cursor)
    .into_iter()
    .map(|edit| (edit.tag, edit.text.into_iter().collect()))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
  }

  fn rebuild<T: Unit>(edits: &[Edit<T>], keep: Tag) -> Vec<T> {
    edits
      .iter()
      .filter(|edit| edit.tag == Tag::Equal || edit.tag == keep)
      .flat_map(|edit| edit.text.iter().copied())
      .collect()
  }

  fn runs(edits: &[(Tag, String)]) -> Vec<(Tag, &str)> {
    edits.iter().map(|(tag, text)| (*tag, text.as_str())).collect()
  }

  quickcheck::quickcheck! {
      fn test_reconstruct(a: String, b: String) -> bool {
          let (old, new) = (chars(&a), chars(&b));
          let edits = diff(&old, &new, None);
          rebuild(&edits, Tag::Delete) == old
            && rebuild(&edits, Tag::Insert) == new
            && edits.iter().all(|edit| !edit.is_empty())
      }

      fn test_reconstruct_with_cursor(a: String, b: String, cursor: usize) -> bool {
          let (old, new) = (chars(&a), chars(&b));
          let cursor = cursor % (old.len() + 1);
          let edits = diff(&old, &new, Some(cursor));
          rebuild(&edits, Tag::Delete) == old && rebuild(&edits, Tag::Insert) == new
      }

      fn test_reconstruct_utf16(a: String, b: String) -> bool {
          let old: Vec<u16> = a.encode_utf16().collect();
          let new: Vec<u16> = b.encode_utf16().collect();
          let edits = diff(&old, &new, None);
          rebuild(&edits, Tag::Delete) == old && rebuild(&edits, Tag::Insert) == new
      }
  }

  #[test]
  fn identical_and_empty() {
    assert!(diff_str("", "", None).is_empty());
    assert_eq!(runs(&diff_str("abc", "abc", None)), vec![(Tag::Equal, "abc")]);
    assert_eq!(runs(&diff_str("", "abc", None)), vec![(Tag::Insert, "abc")]);
    assert_eq!(runs(&diff_str("abc", "", None)), vec![(Tag::Delete, "abc")]);
  }

  #[test]
  fn simple_replacement() {
    assert_eq!(runs(&diff_str("abc", "axc", None)), vec![
      (Tag::Equal, "a"),
      (Tag::Delete, "b"),
      (Tag::Insert, "x"),
      (Tag::Equal, "c"),
    ]);
  }

  #[test]
  fn containment() {
    assert_eq!(runs(&diff_str("abc", "xxabcyy", None)), vec![
      (Tag::Insert, "xx"),
      (Tag::Equal, "abc"),
      (Tag::Insert, "yy"),
    ]);
    assert_eq!(runs(&diff_str("xxabcyy", "abc", None)), vec![
      (Tag::Delete, "xx"),
      (Tag::Equal, "abc"),
      (Tag::Delete, "yy"),
    ]);
  }

  #[test]
  fn bisect_interleaved() {
    let edits = diff_str("cat", "map", None);
    assert_eq!(runs(&edits), vec![
      (Tag::Delete, "c"),
      (Tag::Insert, "m"),
      (Tag::Equal, "a"),
      (Tag::Delete, "t"),
      (Tag::Insert, "p"),
    ]);
  }

  #[test]
  fn cursor_places_insert_at_cursor() {
    assert_eq!(runs(&diff_str("ab", "axb", Some(1))), vec![
      (Tag::Equal, "a"),
      (Tag::Insert, "x"),
      (Tag::Equal, "b"),
    ]);
  }

  #[test]
  fn cursor_swaps_repeated_insert() {
    // Without a cursor the trimmed prefix swallows both characters.
    assert_eq!(runs(&diff_str("aa", "aaa", None)), vec![
      (Tag::Equal, "aa"),
      (Tag::Insert, "a"),
    ]);
    assert_eq!(runs(&diff_str("aa", "aaa", Some(1))), vec![
      (Tag::Equal, "a"),
      (Tag::Insert, "a"),
      (Tag::Equal, "a"),
    ]);
    assert_eq!(runs(&diff_str("aa", "aaa", Some(0))), vec![
      (Tag::Insert, "a"),
      (Tag::Equal, "aa"),
    ]);
  }

  #[test]
  fn cursor_prefix_shift() {
    assert_eq!(runs(&diff_str("ab", "abab", Some(0))), vec![
      (Tag::Insert, "ab"),
      (Tag::Equal, "ab"),
    ]);
    assert_eq!(runs(&diff_str("a", "aab", Some(0))), vec![
      (Tag::Insert, "a"),
      (Tag::Equal, "a"),
      (Tag::Insert, "b"),
    ]);
  }

  #[test]
  fn cursor_out_of_range_is_ignored() {
    assert_eq!(diff_str("ab", "axb", Some(10)), diff_str("ab", "axb", None));
  }

  #[test]
  fn surrogate_pairs_stay_whole() {
    let old: Vec<u16> = "😀".encode_utf16().collect();
    let new: Vec<u16> = "😁".encode_utf16().collect();
    let edits = diff(&old, &new, None);
    assert_eq!(edits, vec![
      Edit::new(Tag::Delete, old.clone()),
      Edit::new(Tag::Insert, new.clone()),
    ]);

    let old: Vec<u16> = "a😀b".encode_utf16().collect();
    let new: Vec<u16> = "a😁b".encode_utf16().collect();
    let edits = diff(&old, &new, None);
    assert_eq!(edits.len(), 4);
    assert_eq!(edits[0], Edit::new(Tag::Equal, vec!['a' as u16]));
    assert_eq!(edits[1].tag, Tag::Delete);
    assert_eq!(edits[1].text, "😀".encode_utf16().collect::<Vec<_>>());
    assert_eq!(edits[2].tag, Tag::Insert);
    assert_eq!(edits[3], Edit::new(Tag::Equal, vec!['b' as u16]));
  }

  #[test]
  fn bytes() {
    let edits = diff(b"kitten", b"sitting", None);
    assert_eq!(rebuild(&edits, Tag::Delete), b"kitten");
    assert_eq!(rebuild(&edits, Tag::Insert), b"sitting");
  }
}
