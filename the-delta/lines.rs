//! Read-only views of a document delta: its lines and the ops covering a
//! range.

use std::{
  mem,
  ops::Range,
};

use crate::{
  attributes::Attributes,
  delta::Delta,
  op::{
    Content,
    Op,
    OpKind,
  },
};

/// One line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
  /// The line's ops, without the terminating newline.
  pub content:     Delta,
  /// Attributes of the terminating newline, i.e. the line format.
  pub attributes:  Option<Attributes>,
  /// Offset of the first character.
  pub start:       usize,
  /// Offset past the newline.
  pub end:         usize,
  /// `false` only for trailing content without a final newline.
  pub has_newline: bool,
}

impl Line {
  pub fn range(&self) -> Range<usize> {
    self.start..self.end
  }

  /// Length including the newline.
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// Offset of the terminating newline.
  pub fn newline_offset(&self) -> Option<usize> {
    self.has_newline.then(|| self.end - 1)
  }
}

/// An op of a document together with the range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpSpan<'a> {
  pub op:    &'a Op,
  pub range: Range<usize>,
}

impl Delta {
  /// Split the document into lines.
  ///
  /// Text inserts are split at each newline; embeds never contain one.
  /// Iteration stops at the first non-insert op.
  pub fn lines(&self) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut iter = self.iter();
    let mut line = Delta::new();
    let mut start = 0;
    let mut pos = 0;

    while iter.has_next() {
      if iter.peek_kind() != OpKind::Insert {
        return lines;
      }
      let newline = match iter.peek() {
        Some(Op::Insert(Content::Text(text), _)) => {
          text.chars().skip(iter.offset()).position(|c| c == '\n')
        },
        _ => None,
      };

      match newline {
        None => {
          pos += iter.peek_len();
          line.push(iter.next_len(usize::MAX));
        },
        Some(0) => {
          let newline = iter.next_len(1);
          pos += 1;
          lines.push(Line {
            content: mem::take(&mut line),
            attributes: newline.attributes().cloned(),
            start,
            end: pos,
            has_newline: true,
          });
          start = pos;
        },
        Some(len) => {
          pos += len;
          line.push(iter.next_len(len));
        },
      }
    }

    if !line.is_empty() {
      lines.push(Line {
        content: line,
        attributes: None,
        start,
        end: pos,
        has_newline: false,
      });
    }
    lines
  }

  /// Lines touched by `from..to`.
  ///
  /// A collapsed range yields the single line containing `from`, or the last
  /// line when `from` is past the end.
  pub fn lines_in(&self, from: usize, to: usize) -> Vec<Line> {
    let (from, to) = (from.min(to), from.max(to));
    let lines = self.lines();
    if from == to {
      let index = lines
        .iter()
        .position(|line| from < line.end)
        .unwrap_or(lines.len().saturating_sub(1));
      return lines.into_iter().nth(index).into_iter().collect();
    }
    lines
      .into_iter()
      .filter(|line| line.start < to && line.end > from)
      .collect()
  }

  /// Whole ops touched by `from..to`, with the ranges they cover.
  ///
  /// A collapsed range yields the op containing `from`, or the op ending at
  /// `from` when it is the end of the document.
  pub fn op_spans(&self, from: usize, to: usize) -> Vec<OpSpan<'_>> {
    let (from, to) = (from.min(to), from.max(to));
    let mut spans = Vec::new();
    let mut pos = 0;
    let mut last = None;
    for op in self.ops() {
      let range = pos..pos + op.len();
      pos = range.end;
      let touched = if from == to {
        range.contains(&from)
      } else {
        range.start < to && range.end > from
      };
      if touched {
        spans.push(OpSpan {
          op,
          range: range.clone(),
        });
      }
      if range.end > to || (from == to && !spans.is_empty()) {
        break;
      }
      last = Some(OpSpan { op, range });
    }

    if spans.is_empty() && from == to {
      spans.extend(last.filter(|last| last.range.end == from));
    }
    spans
  }
}
