use std::time::{
  Duration,
  Instant,
};

use serde::{
  Deserialize,
  Serialize,
};
use the_delta::{
  Delta,
  DeltaError,
  Op,
};
use thiserror::Error;

use crate::selection::Selection;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur during history operations.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
  #[error("delta error: {0}")]
  Delta(#[from] DeltaError),
  #[error("nothing to {0:?}")]
  EmptyStack(Direction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HistoryConfig {
  /// Milliseconds during which similar edits merge into one entry.
  pub delay:     u64,
  /// Maximum number of entries per stack. The oldest entries are dropped.
  pub max_stack: usize,
}

impl Default for HistoryConfig {
  fn default() -> Self {
    Self {
      delay:     1000,
      max_stack: 100,
    }
  }
}

impl HistoryConfig {
  pub fn delay(&self) -> Duration {
    Duration::from_millis(self.delay)
  }
}

/// One undoable step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
  /// Applies the step to the document before it.
  pub redo:           Delta,
  /// Reverts the step from the document after it.
  pub undo:           Delta,
  pub redo_selection: Option<Selection>,
  pub undo_selection: Option<Selection>,
}

/// Coarse kind of an edit, used to decide whether consecutive edits merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  Insert,
  Newline,
  Delete,
  Other,
}

impl Action {
  pub fn classify(change: &Delta) -> Self {
    let ops = match change.ops() {
      [Op::Retain(_, None), rest @ ..] => rest,
      ops => ops,
    };
    match ops {
      [Op::Insert(content, _)] => {
        match content.as_text() {
          Some("\n") => Action::Newline,
          Some(text) if !text.contains('\n') => Action::Insert,
          _ => Action::Other,
        }
      },
      [Op::Delete(_)] => Action::Delete,
      _ => Action::Other,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
  Undo,
  Redo,
}

/// A pending undo or redo that has not been applied yet.
///
/// Returned by [`History::undo`] and [`History::redo`]. The caller applies
/// `change` to the document and only then calls [`History::apply_jump`], so
/// history never moves ahead of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryJump {
  pub change:    Delta,
  pub selection: Option<Selection>,
  pub direction: Direction,
}

/// Undo and redo stacks of recorded user edits.
///
/// Consecutive edits of the same [`Action`] merge into the top entry while
/// they arrive within [`HistoryConfig::delay`] of the edit that opened it.
/// [`History::cutoff`] forces the next edit into a new entry.
///
/// Changes from other sources are not recorded, but every entry is rebased
/// over them with [`History::transform`] so it still applies to the document
/// they produce.
#[derive(Debug, Default)]
pub struct History {
  config:      HistoryConfig,
  undo:        Vec<Entry>,
  redo:        Vec<Entry>,
  last_action: Option<Action>,
  /// When the top entry was opened.
  last_record: Option<Instant>,
}

impl History {
  pub fn new(config: HistoryConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  pub fn config(&self) -> &HistoryConfig {
    &self.config
  }

  pub fn set_config(&mut self, config: HistoryConfig) {
    self.config = config;
    let max = self.config.max_stack;
    truncate_oldest(&mut self.undo, max);
    truncate_oldest(&mut self.redo, max);
  }

  #[inline]
  pub fn has_undo(&self) -> bool {
    !self.undo.is_empty()
  }

  #[inline]
  pub fn has_redo(&self) -> bool {
    !self.redo.is_empty()
  }

  pub fn undo_stack(&self) -> &[Entry] {
    &self.undo
  }

  pub fn redo_stack(&self) -> &[Entry] {
    &self.redo
  }

  pub fn clear(&mut self) {
    self.undo.clear();
    self.redo.clear();
    self.cutoff();
  }

  /// Start a new entry on the next record.
  pub fn cutoff(&mut self) {
    self.last_action = None;
    self.last_record = None;
  }

  pub fn record(
    &mut self,
    change: &Delta,
    old_contents: &Delta,
    new_contents: &Delta,
    old_selection: Option<Selection>,
    new_selection: Option<Selection>,
  ) -> Result<()> {
    self.record_at(
      change,
      old_contents,
      new_contents,
      old_selection,
      new_selection,
      Instant::now(),
    )
  }

  /// Record a committed user change turning `old_contents` into
  /// `new_contents`.
  pub fn record_at(
    &mut self,
    change: &Delta,
    old_contents: &Delta,
    new_contents: &Delta,
    old_selection: Option<Selection>,
    new_selection: Option<Selection>,
    timestamp: Instant,
  ) -> Result<()> {
    if change.is_empty() {
      return Ok(());
    }
    let cursor = new_selection
      .map(|selection| selection.from)
      .filter(|&cursor| cursor <= new_contents.len());
    let undo = new_contents.diff(old_contents, cursor)?;
    self.redo.clear();

    let action = Action::classify(change);
    let within_delay = self
      .last_record
      .is_some_and(|last| timestamp.saturating_duration_since(last) < self.config.delay());
    let merge = action != Action::Other && self.last_action == Some(action) && within_delay;

    match self.undo.last_mut() {
      Some(top) if merge => {
        tracing::trace!(?action, "merging into history entry");
        top.redo = top.redo.compose(change);
        top.undo = undo.compose(&top.undo);
        top.redo_selection = new_selection;
      },
      _ => {
        tracing::trace!(?action, depth = self.undo.len() + 1, "new history entry");
        self.undo.push(Entry {
          redo: change.clone(),
          undo,
          redo_selection: new_selection,
          undo_selection: old_selection,
        });
        truncate_oldest(&mut self.undo, self.config.max_stack);
        self.last_record = Some(timestamp);
      },
    }
    self.last_action = Some(action);
    Ok(())
  }

  /// Rebase both stacks over a change that was not recorded.
  pub fn transform(&mut self, change: &Delta) {
    if change.is_empty() {
      return;
    }
    tracing::trace!(
      undo = self.undo.len(),
      redo = self.redo.len(),
      "rebasing history"
    );
    rebase_stack(&mut self.undo, change, Direction::Undo);
    rebase_stack(&mut self.redo, change, Direction::Redo);
  }

  /// Prepare an undo without mutating history state.
  ///
  /// Returns `None` when there is nothing to undo. After applying the jump's
  /// change, call [`History::apply_jump`].
  pub fn undo(&self) -> Option<HistoryJump> {
    self.undo.last().map(|entry| {
      HistoryJump {
        change:    entry.undo.clone(),
        selection: entry.undo_selection,
        direction: Direction::Undo,
      }
    })
  }

  /// Prepare a redo without mutating history state.
  pub fn redo(&self) -> Option<HistoryJump> {
    self.redo.last().map(|entry| {
      HistoryJump {
        change:    entry.redo.clone(),
        selection: entry.redo_selection,
        direction: Direction::Redo,
      }
    })
  }

  /// Move the top entry to the other stack.
  ///
  /// This should only be called after the jump's change was applied.
  pub fn apply_jump(&mut self, jump: &HistoryJump) -> Result<()> {
    let (from, to) = match jump.direction {
      Direction::Undo => (&mut self.undo, &mut self.redo),
      Direction::Redo => (&mut self.redo, &mut self.undo),
    };
    let entry = from.pop().ok_or(HistoryError::EmptyStack(jump.direction))?;
    to.push(entry);
    truncate_oldest(to, self.config.max_stack);
    self.cutoff();
    Ok(())
  }
}

fn truncate_oldest(stack: &mut Vec<Entry>, max: usize) {
  if stack.len() > max {
    stack.drain(..stack.len() - max);
  }
}

/// Rebase `stack` over `change`, which applies to the document the top entry
/// applies to.
///
/// Walking down the stack, `change` is itself rebased over each entry's
/// applied side so it always matches the document the next entry applies to.
/// Entries whose applied side vanishes are dropped.
fn rebase_stack(stack: &mut Vec<Entry>, change: &Delta, direction: Direction) {
  let mut remote = change.clone();
  for index in (0..stack.len()).rev() {
    let entry = &mut stack[index];
    let (applied, paired, applied_selection, paired_selection) = match direction {
      Direction::Undo => {
        (
          &mut entry.undo,
          &mut entry.redo,
          &mut entry.undo_selection,
          &mut entry.redo_selection,
        )
      },
      Direction::Redo => {
        (
          &mut entry.redo,
          &mut entry.undo,
          &mut entry.redo_selection,
          &mut entry.undo_selection,
        )
      },
    };

    let rebased = remote.transform(applied, true);
    let next = applied.transform(&remote, false);
    *paired = next.transform(paired, true);
    *paired_selection = paired_selection.map(|selection| selection.transform(&remote, true));
    *applied_selection = applied_selection.map(|selection| selection.transform(&next, true));
    *applied = rebased;
    remote = next;

    if applied.is_empty() {
      stack.remove(index);
    }
  }
}
