//! Editor state: the current document, selection and history.
//!
//! Every mutation goes through [`Editor::update_contents`]. It composes the
//! change onto the contents, keeps the document ending in a newline, maps the
//! selection, asks [`TextChanging`] listeners for permission and only then
//! swaps in the new contents. Higher-level operations (`insert_text`,
//! `format_line`, ...) only build a change from the current contents and
//! hand it to `update_contents`.
//!
//! ```ignore
//! let mut editor = Editor::with_text("abc\n", EditorConfig::default())?;
//! editor.insert_text(1..1, "X", None, Source::User)?;
//! assert_eq!(editor.text(), "aXbc\n");
//! editor.undo()?;
//! assert_eq!(editor.text(), "abc\n");
//! ```
//!
//! # Batches
//!
//! [`Editor::transaction`] runs a producer against the editor and commits
//! everything it did as one change. While the producer runs, mutations are
//! applied to a working copy without notifications or history, so later
//! steps see the result of earlier ones.

use std::sync::Arc;

use serde_json::Value;
use the_delta::{
  Attributes,
  Content,
  Delta,
  DeltaError,
  Line,
  Op,
};
use thiserror::Error;

use crate::{
  config::EditorConfig,
  event::{
    EditorChange,
    Events,
    SelectionChange,
    Source,
    TextChange,
    TextChanging,
  },
  history::{
    History,
    HistoryError,
    HistoryJump,
  },
  selection::Selection,
};

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
  #[error("change applies to a document of length {expected}, but the document has length {len}")]
  ChangeOutOfBounds { expected: usize, len: usize },
  #[error("contents must contain only inserts")]
  NotADocument,
  #[error("delta error: {0}")]
  Delta(#[from] DeltaError),
  #[error("history error: {0}")]
  History(#[from] HistoryError),
}

/// Outcome of a successful call to [`Editor::update_contents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
  /// The change that was applied, including any trailing newline fixup.
  Applied(Delta),
  /// The change had no effect.
  Unchanged,
  /// A [`TextChanging`] listener vetoed the change.
  Canceled,
}

impl Commit {
  pub fn is_applied(&self) -> bool {
    matches!(self, Commit::Applied(_))
  }

  pub fn change(&self) -> Option<&Delta> {
    match self {
      Commit::Applied(change) => Some(change),
      _ => None,
    }
  }
}

/// State saved when a batch opens, restored when it closes.
#[derive(Debug)]
struct Batch {
  change:         Delta,
  contents:       Arc<Delta>,
  length:         usize,
  selection:      Option<Selection>,
  active_formats: Attributes,
}

#[derive(Debug)]
pub struct Editor {
  contents:       Arc<Delta>,
  length:         usize,
  selection:      Option<Selection>,
  /// Formats for the next insert at a collapsed selection.
  active_formats: Attributes,
  history:        History,
  events:         Events,
  config:         EditorConfig,
  batch:          Option<Batch>,
  /// Set while an undo or redo is replayed, so it is not recorded again.
  replaying:      bool,
}

impl Default for Editor {
  fn default() -> Self {
    let mut contents = Delta::new();
    contents.insert("\n");
    Self::from_document(contents, EditorConfig::default())
  }
}

impl Editor {
  pub fn new(config: EditorConfig) -> Self {
    Self {
      history: History::new(config.history.clone()),
      config,
      ..Self::default()
    }
  }

  /// Create an editor holding `contents`, which must be a document.
  pub fn with_contents(mut contents: Delta, config: EditorConfig) -> Result<Self> {
    if !contents.is_document() {
      return Err(EditorError::NotADocument);
    }
    if !ends_with_newline(&contents) {
      contents.insert("\n");
    }
    Ok(Self::from_document(contents, config))
  }

  pub fn with_text(text: &str, config: EditorConfig) -> Result<Self> {
    let mut contents = Delta::new();
    contents.insert(text);
    Self::with_contents(contents, config)
  }

  fn from_document(contents: Delta, config: EditorConfig) -> Self {
    Self {
      length: contents.len(),
      contents: Arc::new(contents),
      selection: None,
      active_formats: Attributes::new(),
      history: History::new(config.history.clone()),
      events: Events::new(),
      config,
      batch: None,
      replaying: false,
    }
  }

  // Queries.
  //

  pub fn contents(&self) -> &Delta {
    &self.contents
  }

  /// A shared handle to the current contents, which are never mutated.
  pub fn snapshot(&self) -> Arc<Delta> {
    Arc::clone(&self.contents)
  }

  #[inline]
  pub fn length(&self) -> usize {
    self.length
  }

  pub fn text(&self) -> String {
    self.contents.text()
  }

  pub fn text_in(&self, range: impl Into<Selection>) -> String {
    self.contents.slice(self.normalize(range).range()).text()
  }

  #[inline]
  pub fn selection(&self) -> Option<Selection> {
    self.selection
  }

  pub fn active_formats(&self) -> &Attributes {
    &self.active_formats
  }

  pub fn lines(&self, range: impl Into<Selection>) -> Vec<Line> {
    let Selection { from, to } = self.normalize(range);
    self.contents.lines_in(from, to)
  }

  /// Text formats shared by every character of `range`, newlines excluded.
  ///
  /// A collapsed range reads the character before it, or the one after it at
  /// the start of a line.
  pub fn text_format(&self, range: impl Into<Selection>) -> Attributes {
    let Selection { from, to } = self.normalize(range);
    let pieces = if from == to {
      let before = match from {
        0 => Vec::new(),
        _ => self.format_pieces(from - 1, from),
      };
      if before.is_empty() {
        self.format_pieces(from, from + 1)
      } else {
        before
      }
    } else {
      self.format_pieces(from, to)
    };
    common_formats(pieces)
  }

  /// Line formats shared by every line touched by `range`.
  pub fn line_format(&self, range: impl Into<Selection>) -> Attributes {
    common_formats(
      self
        .lines(range)
        .into_iter()
        .map(|line| line.attributes.unwrap_or_default()),
    )
  }

  /// Attributes of every non-newline piece of text in `from..to`.
  fn format_pieces(&self, from: usize, to: usize) -> Vec<Attributes> {
    let mut pieces = Vec::new();
    for op in self.contents.slice(from..to).ops() {
      let attributes = op.attributes().cloned().unwrap_or_default();
      match op {
        Op::Insert(Content::Text(text), _) => {
          let parts = text.split('\n').filter(|part| !part.is_empty()).count();
          pieces.extend(std::iter::repeat_n(attributes, parts));
        },
        _ => pieces.push(attributes),
      }
    }
    pieces
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  pub fn history_mut(&mut self) -> &mut History {
    &mut self.history
  }

  pub fn events(&self) -> &Events {
    &self.events
  }

  pub fn events_mut(&mut self) -> &mut Events {
    &mut self.events
  }

  pub fn config(&self) -> &EditorConfig {
    &self.config
  }

  pub fn set_config(&mut self, config: EditorConfig) {
    self.history.set_config(config.history.clone());
    self.config = config;
  }

  /// Reorder and clamp a range to the document.
  fn normalize(&self, range: impl Into<Selection>) -> Selection {
    range.into().clamp(self.length)
  }

  // The commit gate.
  //

  /// Apply `change` to the contents.
  ///
  /// `selection` is the selection after the change; when `None` the current
  /// selection is mapped through the change. Changes from other sources leave
  /// a cursor in front of text inserted at it.
  pub fn update_contents(
    &mut self,
    change: Delta,
    source: Source,
    selection: Option<Selection>,
  ) -> Result<Commit> {
    if is_noop(&change) {
      if selection.is_some() {
        self.set_selection(selection, source);
      }
      return Ok(Commit::Unchanged);
    }
    let expected = change.base_len();
    if expected > self.length {
      return Err(EditorError::ChangeOutOfBounds {
        expected,
        len: self.length,
      });
    }

    let (change, new_contents) = self.compose_normalized(change);
    if !new_contents.is_document() {
      return Err(EditorError::NotADocument);
    }
    if new_contents == *self.contents {
      if selection.is_some() {
        self.set_selection(selection, source);
      }
      return Ok(Commit::Unchanged);
    }
    let new_length = new_contents.len();
    let old_selection = self.selection;
    let new_selection = selection
      .or_else(|| old_selection.map(|old| old.transform(&change, source != Source::User)))
      .map(|selection| selection.clamp(new_length - 1));

    if let Some(batch) = self.batch.as_mut() {
      batch.change = batch.change.compose(&change);
      self.contents = Arc::new(new_contents);
      self.length = new_length;
      self.selection = new_selection;
      return Ok(Commit::Applied(change));
    }

    let old_contents = Arc::clone(&self.contents);
    let mut event = TextChanging::new(
      &old_contents,
      &new_contents,
      &change,
      old_selection,
      new_selection,
      source,
    );
    if !self.events.emit_text_changing(&mut event) {
      return Ok(Commit::Canceled);
    }

    match source {
      Source::User if self.replaying => {},
      Source::User => {
        self.history.record(
          &change,
          &old_contents,
          &new_contents,
          old_selection,
          new_selection,
        )?;
      },
      Source::Api | Source::Silent => self.history.transform(&change),
    }

    self.contents = Arc::new(new_contents);
    self.length = new_length;
    self.selection = new_selection;
    self.update_active_formats();
    tracing::debug!(
      ?source,
      length = new_length,
      ops = change.ops().len(),
      "committed change"
    );

    if source != Source::Silent {
      self.events.emit_text_change(&TextChange {
        old_contents: &old_contents,
        contents: &self.contents,
        change: &change,
        old_selection,
        selection: new_selection,
        source,
      });
      if old_selection != new_selection {
        self.events.emit_selection_change(&SelectionChange {
          old_selection,
          selection: new_selection,
          source,
        });
      }
    }
    self.events.emit_editor_change(&EditorChange {
      contents: &self.contents,
      change: Some(&change),
      selection: new_selection,
      source,
    });

    Ok(Commit::Applied(change))
  }

  /// Compose `change` onto the contents, appending a newline when the result
  /// does not end with one. The returned change includes that newline.
  fn compose_normalized(&self, mut change: Delta) -> (Delta, Delta) {
    let mut contents = self.contents.compose(&change);
    if !ends_with_newline(&contents) {
      let mut newline = Delta::new();
      newline.retain(contents.len()).insert("\n");
      change = change.compose(&newline);
      contents.insert("\n");
    }
    (change, contents)
  }

  fn update_active_formats(&mut self) {
    self.active_formats = match self.selection {
      Some(selection) if selection.is_collapsed() => self.text_format(selection),
      _ => Attributes::new(),
    };
  }

  /// Move the selection. Returns whether it changed.
  ///
  /// A selection change made on its own ends history merging.
  pub fn set_selection(&mut self, selection: Option<Selection>, source: Source) -> bool {
    let selection = selection.map(|selection| selection.clamp(self.length - 1));
    if selection == self.selection {
      return false;
    }
    let old_selection = self.selection;
    self.selection = selection;
    if self.batch.is_some() {
      return true;
    }

    self.history.cutoff();
    self.update_active_formats();
    if source != Source::Silent {
      self.events.emit_selection_change(&SelectionChange {
        old_selection,
        selection,
        source,
      });
    }
    self.events.emit_editor_change(&EditorChange {
      contents: &self.contents,
      change: None,
      selection,
      source,
    });
    true
  }

  // Batches.
  //

  /// Run `producer` and return everything it changed as one delta, without
  /// committing it.
  ///
  /// The editor is left as it was before the call, also when the producer
  /// fails.
  pub fn get_change<F>(&mut self, producer: F) -> Result<Delta>
  where
    F: FnOnce(&mut Editor) -> Result<()>,
  {
    let batch = Batch {
      change:         Delta::new(),
      contents:       Arc::clone(&self.contents),
      length:         self.length,
      selection:      self.selection,
      active_formats: self.active_formats.clone(),
    };
    let outer = self.batch.replace(batch);
    let result = producer(self);
    let batch = std::mem::replace(&mut self.batch, outer);

    let mut change = Delta::new();
    if let Some(batch) = batch {
      self.contents = batch.contents;
      self.length = batch.length;
      self.selection = batch.selection;
      self.active_formats = batch.active_formats;
      change = batch.change;
    }
    result.map(|()| change)
  }

  /// Run `producer` and commit everything it changed as a single change.
  ///
  /// Inside another batch the change joins the outer batch instead.
  pub fn transaction<F>(
    &mut self,
    source: Source,
    selection: Option<Selection>,
    producer: F,
  ) -> Result<Commit>
  where
    F: FnOnce(&mut Editor) -> Result<()>,
  {
    let change = self.get_change(producer)?;
    self.update_contents(change, source, selection)
  }

  // Mutations.
  //

  /// Replace `range` with `text`.
  ///
  /// Without explicit `formats` the text takes the pending formats of a
  /// collapsed selection at `range`, or the text format at its start. New
  /// lines take the line format of the line they split.
  pub fn insert_text(
    &mut self,
    range: impl Into<Selection>,
    text: &str,
    formats: Option<Attributes>,
    source: Source,
  ) -> Result<Commit> {
    let range = self.normalize(range);
    let formats = match formats {
      Some(formats) => formats.non_empty(),
      None => self.insert_formats(range),
    };
    let line_format = if text.contains('\n') {
      self.line_format(range.from).non_empty()
    } else {
      None
    };

    let mut change = Delta::new();
    change.retain(range.from).delete(range.len());
    for (i, line) in text.split('\n').enumerate() {
      if i > 0 {
        change.insert_with("\n", line_format.clone());
      }
      change.insert_with(line, formats.clone());
    }

    let selection = self
      .user_selection(source)
      .map(|_| Selection::point(range.from + text.chars().count()));
    self.update_contents(change, source, selection)
  }

  /// Replace `range` with an embed.
  pub fn insert_embed(
    &mut self,
    range: impl Into<Selection>,
    embed: Value,
    formats: Option<Attributes>,
    source: Source,
  ) -> Result<Commit> {
    let range = self.normalize(range);
    let mut change = Delta::new();
    change
      .retain(range.from)
      .delete(range.len())
      .insert_embed(embed, formats);
    let selection = self
      .user_selection(source)
      .map(|_| Selection::point(range.from + 1));
    self.update_contents(change, source, selection)
  }

  pub fn delete_text(&mut self, range: impl Into<Selection>, source: Source) -> Result<Commit> {
    let range = self.normalize(range);
    if range.is_empty() {
      return Ok(Commit::Unchanged);
    }
    let mut change = Delta::new();
    change.retain(range.from).delete(range.len());
    let selection = self
      .user_selection(source)
      .map(|_| Selection::point(range.from));
    self.update_contents(change, source, selection)
  }

  /// Apply text formats to `range`. Newlines keep their line formats.
  ///
  /// On a collapsed range the formats become pending for the next insert.
  pub fn format_text(
    &mut self,
    range: impl Into<Selection>,
    formats: Attributes,
    source: Source,
  ) -> Result<Commit> {
    let range = self.normalize(range);
    if range.is_collapsed() {
      self.active_formats =
        Attributes::compose(Some(&self.active_formats), Some(&formats), false).unwrap_or_default();
      if self.batch.is_none() {
        self.events.emit_editor_change(&EditorChange {
          contents: &self.contents,
          change: None,
          selection: self.selection,
          source,
        });
      }
      return Ok(Commit::Unchanged);
    }

    let mut change = Delta::new();
    change.retain(range.from);
    for op in self.contents.slice(range.range()).ops() {
      match op {
        Op::Insert(Content::Text(text), _) => {
          for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
              change.retain(1);
            }
            change.retain_with(part.chars().count(), Some(formats.clone()));
          }
        },
        _ => {
          change.retain_with(op.len(), Some(formats.clone()));
        },
      }
    }
    change.chop();
    self.update_contents(change, source, None)
  }

  /// Apply line formats to every line touched by `range`.
  pub fn format_line(
    &mut self,
    range: impl Into<Selection>,
    formats: Attributes,
    source: Source,
  ) -> Result<Commit> {
    let mut change = Delta::new();
    let mut pos = 0;
    for line in self.lines(range) {
      if let Some(newline) = line.newline_offset() {
        change
          .retain(newline - pos)
          .retain_with(1, Some(formats.clone()));
        pos = newline + 1;
      }
    }
    self.update_contents(change, source, None)
  }

  /// Apply `formats` to `range`, or remove them when the whole range already
  /// has them.
  pub fn toggle_text_format(
    &mut self,
    range: impl Into<Selection>,
    formats: Attributes,
    source: Source,
  ) -> Result<Commit> {
    let range = self.normalize(range);
    let existing = if range.is_collapsed() && self.selection == Some(range) {
      self.active_formats.clone()
    } else {
      self.text_format(range)
    };
    let formats = toggled(formats, &existing);
    self.format_text(range, formats, source)
  }

  pub fn toggle_line_format(
    &mut self,
    range: impl Into<Selection>,
    formats: Attributes,
    source: Source,
  ) -> Result<Commit> {
    let range = self.normalize(range);
    let formats = toggled(formats, &self.line_format(range));
    self.format_line(range, formats, source)
  }

  /// Remove all text formats in `range` and the line formats of every line
  /// it touches.
  pub fn remove_format(&mut self, range: impl Into<Selection>, source: Source) -> Result<Commit> {
    let range = self.normalize(range);
    if range.is_collapsed() {
      self.active_formats = Attributes::new();
    }

    let mut text = Delta::new();
    text.retain(range.from);
    for op in self.contents.slice(range.range()).ops() {
      text.retain_with(op.len(), op.attributes().map(Attributes::nulled));
    }

    let mut lines = Delta::new();
    let mut pos = 0;
    for line in self.lines(range) {
      if let (Some(newline), Some(attributes)) = (line.newline_offset(), &line.attributes) {
        lines
          .retain(newline - pos)
          .retain_with(1, Some(attributes.nulled()));
        pos = newline + 1;
      }
    }

    let change = text.compose(&lines);
    self.update_contents(change, source, None)
  }

  /// Replace the whole document, committing the difference as one change.
  ///
  /// The cursor position decides where ambiguous edits are placed.
  pub fn set_contents(&mut self, mut contents: Delta, source: Source) -> Result<Commit> {
    if !contents.is_document() {
      return Err(EditorError::NotADocument);
    }
    if !ends_with_newline(&contents) {
      contents.insert("\n");
    }
    let cursor = self.selection.map(|selection| selection.from);
    let change = self.contents.diff(&contents, cursor)?;
    self.update_contents(change, source, None)
  }

  pub fn set_text(&mut self, text: &str, source: Source) -> Result<Commit> {
    let mut contents = Delta::new();
    contents.insert(text);
    self.set_contents(contents, source)
  }

  // History.
  //

  pub fn undo(&mut self) -> Result<Commit> {
    let jump = self.history.undo();
    self.replay(jump)
  }

  pub fn redo(&mut self) -> Result<Commit> {
    let jump = self.history.redo();
    self.replay(jump)
  }

  fn replay(&mut self, jump: Option<HistoryJump>) -> Result<Commit> {
    let Some(jump) = jump else {
      return Ok(Commit::Unchanged);
    };
    self.replaying = true;
    let result = self.update_contents(jump.change.clone(), Source::User, jump.selection);
    self.replaying = false;

    let commit = result?;
    if commit != Commit::Canceled {
      self.history.apply_jump(&jump)?;
    }
    Ok(commit)
  }

  /// The selection, when a user edit should move it.
  fn user_selection(&self, source: Source) -> Option<Selection> {
    self.selection.filter(|_| source == Source::User)
  }

  /// Formats for text inserted at `range` without explicit formats.
  fn insert_formats(&self, range: Selection) -> Option<Attributes> {
    if range.is_collapsed() && self.selection == Some(range) {
      self.active_formats.clone().non_empty()
    } else {
      self.text_format(range.from).non_empty()
    }
  }
}

fn ends_with_newline(contents: &Delta) -> bool {
  matches!(
    contents.ops().last(),
    Some(Op::Insert(Content::Text(text), _)) if text.ends_with('\n')
  )
}

/// Empty, or only plain retains.
fn is_noop(change: &Delta) -> bool {
  change.ops().iter().all(|op| matches!(op, Op::Retain(_, None)))
}

fn common_formats(formats: impl IntoIterator<Item = Attributes>) -> Attributes {
  formats
    .into_iter()
    .reduce(|common, formats| common.common(&formats))
    .unwrap_or_default()
}

/// `formats` with every key set to `null` when `existing` already has them.
fn toggled(formats: Attributes, existing: &Attributes) -> Attributes {
  if formats.is_subset_of(existing) {
    formats.nulled()
  } else {
    formats
  }
}
