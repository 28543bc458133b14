use std::mem;

use smallvec::SmallVec;

use crate::{
  Edit,
  Tag,
  Unit,
  compute::{
    common_prefix,
    common_suffix,
  },
};

/// Normalize a raw edit list.
///
/// Runs of deletes and inserts between equalities are coalesced into one
/// delete followed by one insert, their common prefix and suffix move into
/// the surrounding equalities, and adjacent equalities merge. A single edit
/// surrounded by equalities is then slid sideways when that eliminates one of
/// them. Sliding can expose new merges, so both steps repeat until stable.
pub(crate) fn cleanup_merge<T: Unit>(edits: &mut Vec<Edit<T>>) {
  loop {
    merge_runs(edits);
    if !shift_singles(edits) {
      break;
    }
  }
}

fn merge_runs<T: Unit>(edits: &mut Vec<Edit<T>>) {
  edits.retain(|edit| !edit.is_empty());
  // Sentinel equality flushing the trailing run.
  edits.push(Edit::new(Tag::Equal, Vec::new()));

  let mut pointer = 0;
  let mut count_delete = 0;
  let mut count_insert = 0;
  let mut text_delete: Vec<T> = Vec::new();
  let mut text_insert: Vec<T> = Vec::new();

  while pointer < edits.len() {
    match edits[pointer].tag {
      Tag::Insert => {
        count_insert += 1;
        text_insert.extend_from_slice(&edits[pointer].text);
        pointer += 1;
      },
      Tag::Delete => {
        count_delete += 1;
        text_delete.extend_from_slice(&edits[pointer].text);
        pointer += 1;
      },
      Tag::Equal => {
        let count = count_delete + count_insert;
        if count > 1 {
          let mut start = pointer - count;
          if count_delete != 0 && count_insert != 0 {
            let prefix = common_prefix(&text_insert, &text_delete);
            if prefix != 0 {
              let common: Vec<T> = text_insert.drain(..prefix).collect();
              text_delete.drain(..prefix);
              if start > 0 && edits[start - 1].tag == Tag::Equal {
                edits[start - 1].text.extend(common);
              } else {
                edits.insert(start, Edit::new(Tag::Equal, common));
                start += 1;
                pointer += 1;
              }
            }

            let suffix = common_suffix(&text_insert, &text_delete);
            if suffix != 0 {
              let mut text = text_insert.split_off(text_insert.len() - suffix);
              text_delete.truncate(text_delete.len() - suffix);
              text.extend_from_slice(&edits[pointer].text);
              edits[pointer].text = text;
            }
          }

          let mut runs: SmallVec<[Edit<T>; 2]> = SmallVec::new();
          if !text_delete.is_empty() {
            runs.push(Edit::new(Tag::Delete, mem::take(&mut text_delete)));
          }
          if !text_insert.is_empty() {
            runs.push(Edit::new(Tag::Insert, mem::take(&mut text_insert)));
          }
          let len = runs.len();
          edits.splice(start..pointer, runs);
          // Revisit the equality so it can merge with a preceding one.
          pointer = start + len;
        } else if pointer != 0 && edits[pointer - 1].tag == Tag::Equal {
          let text = edits.remove(pointer).text;
          edits[pointer - 1].text.extend(text);
        } else {
          pointer += 1;
        }
        count_delete = 0;
        count_insert = 0;
        text_delete.clear();
        text_insert.clear();
      },
    }
  }

  if edits.last().is_some_and(|edit| edit.is_empty()) {
    edits.pop();
  }
}

/// Slide single edits surrounded by equalities, e.g.
/// `A<ins>BA</ins>C` becomes `<ins>AB</ins>AC`. Returns whether anything moved.
fn shift_singles<T: Unit>(edits: &mut Vec<Edit<T>>) -> bool {
  let mut changed = false;
  let mut pointer = 1;
  while pointer + 1 < edits.len() {
    if edits[pointer - 1].tag == Tag::Equal && edits[pointer + 1].tag == Tag::Equal {
      if edits[pointer].text.ends_with(&edits[pointer - 1].text) {
        // Shift the edit over the previous equality.
        let prev = edits.remove(pointer - 1).text;
        let current = &mut edits[pointer - 1].text;
        current.truncate(current.len() - prev.len());
        current.splice(0..0, prev.iter().copied());
        edits[pointer].text.splice(0..0, prev);
        changed = true;
      } else if edits[pointer].text.starts_with(&edits[pointer + 1].text) {
        // Shift the edit over the next equality.
        let next = edits.remove(pointer + 1).text;
        edits[pointer - 1].text.extend_from_slice(&next);
        let current = &mut edits[pointer].text;
        current.drain(..next.len());
        current.extend(next);
        changed = true;
      }
    }
    pointer += 1;
  }
  changed
}

/// Move an ambiguous edit next to the cursor.
///
/// `cursor` is an offset into the old text. When the edit at the cursor is an
/// equality immediately followed by an edit that could equally sit before it,
/// the two are swapped.
pub(crate) fn fix_cursor<T: Unit>(edits: Vec<Edit<T>>, cursor: usize) -> Vec<Edit<T>> {
  let Some((index, mut normalized)) = split_at_cursor(&edits, cursor) else {
    return edits;
  };

  let (Some(current), Some(next)) = (normalized.get(index), normalized.get(index + 1)) else {
    return edits;
  };
  if current.tag != Tag::Equal {
    return edits;
  }

  let commutes = current
    .text
    .iter()
    .chain(&next.text)
    .eq(next.text.iter().chain(&current.text));
  if commutes {
    // `X` then `Y` reads the same as `Y` then `X`.
    normalized.swap(index, index + 1);
    merge_adjacent(&mut normalized, index, 2);
    normalized
  } else if next.text.starts_with(&current.text) {
    // The next edit starts with the equality: emit it first, then the
    // equality, then whatever remains of the edit.
    let tag = next.tag;
    let equal = current.text.clone();
    let rest = next.text[equal.len()..].to_vec();

    let mut replacement: SmallVec<[Edit<T>; 3]> = SmallVec::new();
    replacement.push(Edit::new(tag, equal.clone()));
    replacement.push(Edit::new(Tag::Equal, equal));
    if !rest.is_empty() {
      replacement.push(Edit::new(tag, rest));
    }
    let len = replacement.len();
    normalized.splice(index..index + 2, replacement);
    merge_adjacent(&mut normalized, index, len);
    normalized
  } else {
    edits
  }
}

/// Split the edit straddling `cursor` so an edit boundary sits exactly at the
/// cursor. Returns the index of the first edit after the cursor.
fn split_at_cursor<T: Unit>(edits: &[Edit<T>], cursor: usize) -> Option<(usize, Vec<Edit<T>>)> {
  if cursor == 0 {
    return Some((0, edits.to_vec()));
  }

  let mut pos = 0;
  for (i, edit) in edits.iter().enumerate() {
    if edit.tag == Tag::Insert {
      continue;
    }
    let next_pos = pos + edit.len();
    if cursor == next_pos {
      return Some((i + 1, edits.to_vec()));
    }
    if cursor < next_pos {
      let split = cursor - pos;
      let mut normalized = Vec::with_capacity(edits.len() + 1);
      normalized.extend_from_slice(&edits[..i]);
      normalized.push(Edit::new(edit.tag, edit.text[..split].to_vec()));
      normalized.push(Edit::new(edit.tag, edit.text[split..].to_vec()));
      normalized.extend_from_slice(&edits[i + 1..]);
      return Some((i + 1, normalized));
    }
    pos = next_pos;
  }

  tracing::trace!(cursor, "cursor past the end of the diffed text");
  None
}

/// Merge neighbours with the same tag in `start - 1..=start + len`.
fn merge_adjacent<T: Unit>(edits: &mut Vec<Edit<T>>, start: usize, len: usize) {
  let mut i = start + len;
  while i > start.saturating_sub(1) {
    i -= 1;
    if i + 1 < edits.len() && edits[i].tag == edits[i + 1].tag {
      let right = edits.remove(i + 1).text;
      edits[i].text.extend(right);
    }
  }
}

/// Keep surrogate pairs whole: an equality ending in a high surrogate followed
/// by a delete and an insert that both start with a low surrogate donates the
/// high surrogate to both edits.
pub(crate) fn fix_surrogates<T: Unit>(edits: &mut Vec<Edit<T>>) {
  let mut moved = false;
  for i in 2..edits.len() {
    let split = edits[i - 2].tag == Tag::Equal
      && edits[i - 2].text.last().is_some_and(|unit| unit.is_high_surrogate())
      && edits[i - 1].tag == Tag::Delete
      && edits[i - 1].text.first().is_some_and(|unit| unit.is_low_surrogate())
      && edits[i].tag == Tag::Insert
      && edits[i].text.first().is_some_and(|unit| unit.is_low_surrogate());
    if !split {
      continue;
    }

    let Some(high) = edits[i - 2].text.pop() else {
      continue;
    };
    edits[i - 1].text.insert(0, high);
    edits[i].text.insert(0, high);
    moved = true;
  }

  if moved {
    edits.retain(|edit| !edit.is_empty());
  }
}
