//! Notifications fired by an [`Editor`](crate::editor::Editor).
//!
//! Every editor owns its own [`Events`]. Listeners are registered per kind
//! and receive a typed event borrowing the editor's state for the duration
//! of the call:
//!
//! - [`TextChanging`] fires before a change is committed. It is the only
//!   cancelable event: a listener calling [`TextChanging::cancel`] stops
//!   dispatch and the change is dropped.
//! - [`TextChange`] fires after contents were replaced.
//! - [`SelectionChange`] fires after the selection moved.
//! - [`EditorChange`] always fires last, whatever the source.
//!
//! [`TextChange`] and [`SelectionChange`] are not fired for
//! [`Source::Silent`] changes.

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};
use the_delta::Delta;

use crate::selection::Selection;

/// Who made a change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
  /// Programmatic changes, e.g. a remote collaborator.
  #[default]
  Api,
  /// Changes made by the local user. Only these are recorded in history.
  User,
  /// Like [`Source::Api`] but without change notifications.
  Silent,
}

#[derive(Debug)]
pub struct TextChanging<'a> {
  pub old_contents:  &'a Delta,
  pub new_contents:  &'a Delta,
  pub change:        &'a Delta,
  pub old_selection: Option<Selection>,
  pub new_selection: Option<Selection>,
  pub source:        Source,
  canceled:          bool,
}

impl<'a> TextChanging<'a> {
  pub fn new(
    old_contents: &'a Delta,
    new_contents: &'a Delta,
    change: &'a Delta,
    old_selection: Option<Selection>,
    new_selection: Option<Selection>,
    source: Source,
  ) -> Self {
    Self {
      old_contents,
      new_contents,
      change,
      old_selection,
      new_selection,
      source,
      canceled: false,
    }
  }

  /// Veto the change.
  pub fn cancel(&mut self) {
    self.canceled = true;
  }

  pub fn is_canceled(&self) -> bool {
    self.canceled
  }
}

#[derive(Debug, Clone, Copy)]
pub struct TextChange<'a> {
  pub old_contents:  &'a Delta,
  pub contents:      &'a Delta,
  pub change:        &'a Delta,
  pub old_selection: Option<Selection>,
  pub selection:     Option<Selection>,
  pub source:        Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
  pub old_selection: Option<Selection>,
  pub selection:     Option<Selection>,
  pub source:        Source,
}

/// Fired after every commit or selection update. `change` is `None` when only
/// the selection moved.
#[derive(Debug, Clone, Copy)]
pub struct EditorChange<'a> {
  pub contents:  &'a Delta,
  pub change:    Option<&'a Delta>,
  pub selection: Option<Selection>,
  pub source:    Source,
}

/// Handle returned when registering a listener, used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type Listeners<F> = Vec<(ListenerId, Box<F>)>;

/// Listener registries, one per event kind.
#[derive(Default)]
pub struct Events {
  next_id:          usize,
  text_changing:    Listeners<dyn FnMut(&mut TextChanging<'_>) + Send>,
  text_change:      Listeners<dyn FnMut(&TextChange<'_>) + Send>,
  selection_change: Listeners<dyn FnMut(&SelectionChange) + Send>,
  editor_change:    Listeners<dyn FnMut(&EditorChange<'_>) + Send>,
}

impl fmt::Debug for Events {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Events")
      .field("text_changing", &self.text_changing.len())
      .field("text_change", &self.text_change.len())
      .field("selection_change", &self.selection_change.len())
      .field("editor_change", &self.editor_change.len())
      .finish()
  }
}

impl Events {
  pub fn new() -> Self {
    Self::default()
  }

  fn next_id(&mut self) -> ListenerId {
    let id = ListenerId(self.next_id);
    self.next_id += 1;
    id
  }

  pub fn on_text_changing<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&mut TextChanging<'_>) + Send + 'static,
  {
    let id = self.next_id();
    self.text_changing.push((id, Box::new(listener)));
    id
  }

  pub fn on_text_change<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&TextChange<'_>) + Send + 'static,
  {
    let id = self.next_id();
    self.text_change.push((id, Box::new(listener)));
    id
  }

  pub fn on_selection_change<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&SelectionChange) + Send + 'static,
  {
    let id = self.next_id();
    self.selection_change.push((id, Box::new(listener)));
    id
  }

  pub fn on_editor_change<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&EditorChange<'_>) + Send + 'static,
  {
    let id = self.next_id();
    self.editor_change.push((id, Box::new(listener)));
    id
  }

  /// Remove a listener. Returns whether it was registered.
  pub fn off(&mut self, id: ListenerId) -> bool {
    let before = self.len();
    self.text_changing.retain(|(listener, _)| *listener != id);
    self.text_change.retain(|(listener, _)| *listener != id);
    self.selection_change.retain(|(listener, _)| *listener != id);
    self.editor_change.retain(|(listener, _)| *listener != id);
    self.len() != before
  }

  /// Number of registered listeners.
  pub fn len(&self) -> usize {
    self.text_changing.len()
      + self.text_change.len()
      + self.selection_change.len()
      + self.editor_change.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Dispatch until a listener cancels. Returns whether the change may go
  /// ahead.
  pub(crate) fn emit_text_changing(&mut self, event: &mut TextChanging<'_>) -> bool {
    for (id, listener) in &mut self.text_changing {
      listener(event);
      if event.is_canceled() {
        tracing::debug!(listener = id.0, source = ?event.source, "change canceled");
        return false;
      }
    }
    true
  }

  pub(crate) fn emit_text_change(&mut self, event: &TextChange<'_>) {
    for (_, listener) in &mut self.text_change {
      listener(event);
    }
  }

  pub(crate) fn emit_selection_change(&mut self, event: &SelectionChange) {
    for (_, listener) in &mut self.selection_change {
      listener(event);
    }
  }

  pub(crate) fn emit_editor_change(&mut self, event: &EditorChange<'_>) {
    for (_, listener) in &mut self.editor_change {
      listener(event);
    }
  }
}
