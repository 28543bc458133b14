//! Editor state machine over [`the_delta`] documents.
//!
//! - [`editor`]: the [`Editor`], its commit gate, mutations and batches
//! - [`history`]: undo and redo stacks
//! - [`selection`]: ordered `[from, to]` selections
//! - [`event`]: typed, per-editor notifications
//! - [`config`]: TOML configuration

pub mod config;
pub mod editor;
pub mod event;
pub mod history;
pub mod selection;

pub use config::EditorConfig;
pub use editor::{
  Commit,
  Editor,
  EditorError,
};
pub use event::Source;
pub use selection::Selection;
pub use the_delta::{
  Attributes,
  Delta,
};
