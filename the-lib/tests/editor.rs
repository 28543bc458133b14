use std::{
  sync::{
    Arc,
    Mutex,
  },
  thread,
  time::Duration,
};

use serde_json::{
  Value,
  json,
};
use the_lib::{
  Attributes,
  Commit,
  Delta,
  Editor,
  EditorConfig,
  Selection,
  Source,
  history::HistoryConfig,
};

fn delta(value: Value) -> Delta {
  serde_json::from_value(value).unwrap()
}

fn attrs(value: Value) -> Attributes {
  serde_json::from_value(value).unwrap()
}

fn editor(value: Value) -> Editor {
  Editor::with_contents(delta(value), EditorConfig::default()).unwrap()
}

struct Log {
  entries: Arc<Mutex<Vec<String>>>,
}

impl Log {
  fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(Vec::new())),
    }
  }

  fn sink(&self) -> Arc<Mutex<Vec<String>>> {
    self.entries.clone()
  }

  fn entries(&self) -> Vec<String> {
    self.entries.lock().unwrap().clone()
  }

  fn clear(&self) {
    self.entries.lock().unwrap().clear();
  }
}

/// Log every notification the editor fires.
fn listen(editor: &mut Editor, log: &Log) {
  let events = editor.events_mut();
  let sink = log.sink();
  events.on_text_changing(move |_| sink.lock().unwrap().push("text-changing".into()));
  let sink = log.sink();
  events.on_text_change(move |event| {
    sink
      .lock()
      .unwrap()
      .push(format!("text-change {:?}", event.source));
  });
  let sink = log.sink();
  events.on_selection_change(move |event| {
    sink
      .lock()
      .unwrap()
      .push(format!("selection-change {:?}", event.selection));
  });
  let sink = log.sink();
  events.on_editor_change(move |_| sink.lock().unwrap().push("editor-change".into()));
}

#[test]
fn insert_then_undo() {
  let mut editor = editor(json!([{ "insert": "abc\n" }]));
  editor.insert_text(1..1, "X", None, Source::User).unwrap();
  assert_eq!(*editor.contents(), delta(json!([{ "insert": "aXbc\n" }])));

  editor.undo().unwrap();
  assert_eq!(*editor.contents(), delta(json!([{ "insert": "abc\n" }])));

  editor.redo().unwrap();
  assert_eq!(*editor.contents(), delta(json!([{ "insert": "aXbc\n" }])));
}

#[test]
fn typing_a_word_is_one_undo_step() {
  let mut editor = editor(json!([{ "insert": "\n" }]));
  editor.set_selection(Some(Selection::point(0)), Source::User);
  for (i, c) in "Hello".chars().enumerate() {
    editor
      .insert_text(i, &c.to_string(), None, Source::User)
      .unwrap();
  }
  assert_eq!(editor.text(), "Hello\n");
  assert_eq!(editor.selection(), Some(Selection::point(5)));
  assert_eq!(editor.history().undo_stack().len(), 1);

  editor.undo().unwrap();
  assert_eq!(editor.text(), "\n");
  assert_eq!(editor.selection(), Some(Selection::point(0)));
  assert!(!editor.history().has_undo());

  editor.redo().unwrap();
  assert_eq!(editor.text(), "Hello\n");
  assert_eq!(editor.selection(), Some(Selection::point(5)));
}

#[test]
fn pauses_split_undo_steps() {
  let config = EditorConfig {
    history: HistoryConfig {
      delay:     10,
      max_stack: 100,
    },
  };
  let mut editor = Editor::with_text("\n", config).unwrap();
  editor.insert_text(0, "a", None, Source::User).unwrap();
  thread::sleep(Duration::from_millis(30));
  editor.insert_text(1, "b", None, Source::User).unwrap();
  assert_eq!(editor.history().undo_stack().len(), 2);

  editor.undo().unwrap();
  assert_eq!(editor.text(), "a\n");
}

#[test]
fn moving_the_selection_splits_undo_steps() {
  let mut editor = editor(json!([{ "insert": "\n" }]));
  editor.set_selection(Some(Selection::point(0)), Source::User);
  editor.insert_text(0, "ab", None, Source::User).unwrap();
  editor.set_selection(Some(Selection::point(1)), Source::User);
  editor.insert_text(1, "x", None, Source::User).unwrap();
  assert_eq!(editor.text(), "axb\n");
  assert_eq!(editor.history().undo_stack().len(), 2);

  editor.undo().unwrap();
  assert_eq!(editor.text(), "ab\n");
  assert_eq!(editor.selection(), Some(Selection::point(1)));
}

#[test]
fn notifications_in_order() {
  let mut editor = editor(json!([{ "insert": "abc\n" }]));
  let log = Log::new();
  listen(&mut editor, &log);

  editor.set_selection(Some(Selection::point(1)), Source::User);
  assert_eq!(log.entries(), vec![
    "selection-change Some(Selection { from: 1, to: 1 })".to_string(),
    "editor-change".to_string(),
  ]);

  log.clear();
  editor.insert_text(1, "X", None, Source::User).unwrap();
  assert_eq!(log.entries(), vec![
    "text-changing".to_string(),
    "text-change User".to_string(),
    "selection-change Some(Selection { from: 2, to: 2 })".to_string(),
    "editor-change".to_string(),
  ]);

  log.clear();
  editor.insert_text(0, "_", None, Source::Silent).unwrap();
  assert_eq!(log.entries(), vec![
    "text-changing".to_string(),
    "editor-change".to_string(),
  ]);
  assert_eq!(editor.selection(), Some(Selection::point(3)));
}

#[test]
fn canceled_change_commits_nothing() {
  let mut editor = editor(json!([{ "insert": "abc\n" }]));
  let log = Log::new();
  listen(&mut editor, &log);
  let veto = editor.events_mut().on_text_changing(|event| {
    if event.new_contents.text().contains('!') {
      event.cancel();
    }
  });

  assert_eq!(
    editor.insert_text(0, "!", None, Source::User),
    Ok(Commit::Canceled)
  );
  assert_eq!(editor.text(), "abc\n");
  assert!(!editor.history().has_undo());
  assert_eq!(log.entries(), vec!["text-changing".to_string()]);

  assert!(editor.events_mut().off(veto));
  assert!(editor.insert_text(0, "!", None, Source::User).unwrap().is_applied());
  assert_eq!(editor.text(), "!abc\n");
}

#[test]
fn remote_changes_rebase_history() {
  let mut editor = editor(json!([{ "insert": "abc\n" }]));
  editor.insert_text(3, "!", None, Source::User).unwrap();
  assert_eq!(editor.text(), "abc!\n");

  // A collaborator inserts at the start.
  let mut remote = Delta::new();
  remote.insert(">> ");
  editor.update_contents(remote, Source::Api, None).unwrap();
  assert_eq!(editor.text(), ">> abc!\n");
  assert_eq!(editor.history().undo_stack().len(), 1);

  editor.undo().unwrap();
  assert_eq!(editor.text(), ">> abc\n");
  editor.redo().unwrap();
  assert_eq!(editor.text(), ">> abc!\n");
}

#[test]
fn transaction_commits_once() {
  let mut editor = editor(json!([{ "insert": "one\ntwo\n" }]));
  let log = Log::new();
  listen(&mut editor, &log);

  let commit = editor
    .transaction(Source::User, Some(Selection::point(0)), |editor| {
      editor.insert_text(0, "# ", None, Source::User)?;
      editor.format_line(0, attrs(json!({ "header": 1 })), Source::User)?;
      editor.format_text(2..5, attrs(json!({ "bold": true })), Source::User)?;
      editor.delete_text(6..10, Source::User)?;
      Ok(())
    })
    .unwrap();

  assert!(commit.is_applied());
  assert_eq!(
    *editor.contents(),
    delta(json!([
      { "insert": "# " },
      { "insert": "one", "attributes": { "bold": true } },
      { "insert": "\n", "attributes": { "header": 1 } },
    ]))
  );
  assert_eq!(log.entries(), vec![
    "text-changing".to_string(),
    "text-change User".to_string(),
    "selection-change Some(Selection { from: 0, to: 0 })".to_string(),
    "editor-change".to_string(),
  ]);
  assert_eq!(editor.history().undo_stack().len(), 1);

  editor.undo().unwrap();
  assert_eq!(editor.text(), "one\ntwo\n");
}

#[test]
fn nested_transactions_join_the_outer_one() {
  let mut editor = editor(json!([{ "insert": "abc\n" }]));
  editor
    .transaction(Source::User, None, |editor| {
      editor.insert_text(0, "1", None, Source::User)?;
      let inner = editor.transaction(Source::User, None, |editor| {
        editor.insert_text(0, "2", None, Source::User)?;
        Ok(())
      })?;
      assert!(inner.is_applied());
      assert_eq!(editor.text(), "21abc\n");
      Ok(())
    })
    .unwrap();
  assert_eq!(editor.text(), "21abc\n");
  assert_eq!(editor.history().undo_stack().len(), 1);
}

#[test]
fn set_contents_reconciles_snapshot() {
  let mut editor = editor(json!([{ "insert": "aa\n" }]));
  editor.set_selection(Some(Selection::point(1)), Source::User);
  let commit = editor
    .set_contents(delta(json!([{ "insert": "aaa\n" }])), Source::User)
    .unwrap();
  assert_eq!(
    commit,
    Commit::Applied(delta(json!([{ "retain": 1 }, { "insert": "a" }])))
  );
  assert_eq!(editor.selection(), Some(Selection::point(2)));
}

#[test]
fn toggles_through_the_public_api() {
  let mut editor = editor(json!([{ "insert": "Hello\n" }]));
  let italic = attrs(json!({ "italic": true }));

  editor
    .toggle_text_format(0..5, italic.clone(), Source::User)
    .unwrap();
  assert_eq!(editor.text_format(0..5), italic);
  editor
    .toggle_text_format(0..5, italic.clone(), Source::User)
    .unwrap();
  assert_eq!(*editor.contents(), delta(json!([{ "insert": "Hello\n" }])));

  let quote = attrs(json!({ "blockquote": true }));
  editor
    .toggle_line_format(0..5, quote.clone(), Source::User)
    .unwrap();
  assert_eq!(editor.line_format(0), quote);
  editor.remove_format(0..6, Source::User).unwrap();
  assert_eq!(*editor.contents(), delta(json!([{ "insert": "Hello\n" }])));
}

#[test]
fn undo_on_empty_stack_is_a_noop() {
  let mut editor = Editor::default();
  assert_eq!(editor.undo(), Ok(Commit::Unchanged));
  assert_eq!(editor.redo(), Ok(Commit::Unchanged));
}
