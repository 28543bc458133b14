#![allow(dead_code)]

use the_delta::{
  Attributes,
  Delta,
};

const MAX_TEXT_BYTES: usize = 64;
const MAX_OPS: usize = 32;
const ALPHABET: &[char] = &['a', 'b', '\n', ' ', 'é', '😀'];

/// One edit against a document, reduced into range when applied.
#[derive(Debug, Clone)]
pub struct EditOp {
  pub kind:   u8,
  pub anchor: u16,
  pub len:    u16,
  pub text:   String,
}

pub fn decode_document(cursor: &mut ByteCursor<'_>) -> Delta {
  let mut doc = Delta::new();
  let runs = cursor.next_usize(8);
  for _ in 0..runs {
    let text = cursor.next_text();
    let attributes = match cursor.next_u8() % 3 {
      0 => None,
      1 => Some(bold()),
      _ => Some(italic()),
    };
    doc.insert_with(&text, attributes);
  }
  doc.insert("\n");
  doc
}

pub fn decode_ops(cursor: &mut ByteCursor<'_>) -> Vec<EditOp> {
  let count = cursor.next_usize(MAX_OPS);
  let mut ops = Vec::with_capacity(count);
  for _ in 0..count {
    ops.push(EditOp {
      kind:   cursor.next_u8(),
      anchor: cursor.next_u16(),
      len:    cursor.next_u16(),
      text:   cursor.next_text(),
    });
  }
  ops
}

/// A change over a document of length `base_len`.
pub fn decode_change(cursor: &mut ByteCursor<'_>, base_len: usize) -> Delta {
  let mut change = Delta::new();
  let mut pos = 0;
  for op in decode_ops(cursor) {
    let left = base_len - pos;
    let len = if left == 0 {
      0
    } else {
      (op.len as usize) % (left + 1)
    };
    match op.kind % 4 {
      0 => {
        change.insert(&op.text);
      },
      1 => {
        change.delete(len);
        pos += len;
      },
      2 => {
        change.retain(len);
        pos += len;
      },
      _ => {
        change.retain_with(len, Some(bold()));
        pos += len;
      },
    }
  }
  change
}

pub fn bold() -> Attributes {
  let mut attributes = Attributes::new();
  attributes.insert("bold", true);
  attributes
}

pub fn italic() -> Attributes {
  let mut attributes = Attributes::new();
  attributes.insert("italic", true);
  attributes
}

pub struct ByteCursor<'a> {
  data: &'a [u8],
  pos:  usize,
}

impl<'a> ByteCursor<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  pub fn next_u8(&mut self) -> u8 {
    let value = self.data.get(self.pos).copied().unwrap_or(0);
    self.pos = self.pos.saturating_add(1);
    value
  }

  pub fn next_u16(&mut self) -> u16 {
    let lo = self.next_u8() as u16;
    let hi = self.next_u8() as u16;
    lo | (hi << 8)
  }

  pub fn next_usize(&mut self, max: usize) -> usize {
    if max == 0 {
      return 0;
    }
    (self.next_u16() as usize) % (max + 1)
  }

  /// Text over a small alphabet, so diffs find common runs.
  pub fn next_text(&mut self) -> String {
    let len = self.next_usize(MAX_TEXT_BYTES);
    (0..len)
      .map(|_| ALPHABET[self.next_u8() as usize % ALPHABET.len()])
      .collect()
  }
}
