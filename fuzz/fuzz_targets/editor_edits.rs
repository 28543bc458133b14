#![no_main]

mod common;

use libfuzzer_sys::fuzz_target;
use the_lib::{
  Editor,
  EditorConfig,
  Selection,
  Source,
};

use crate::common::{
  ByteCursor,
  bold,
  decode_document,
  decode_ops,
};

fuzz_target!(|data: &[u8]| {
  let mut cursor = ByteCursor::new(data);
  let Ok(mut editor) = Editor::with_contents(decode_document(&mut cursor), EditorConfig::default())
  else {
    return;
  };

  for op in decode_ops(&mut cursor) {
    let len = editor.length();
    let from = (op.anchor as usize) % len;
    let to = from + (op.len as usize) % (len - from);
    let range = Selection::new(from, to);
    let result = match op.kind % 7 {
      0 => editor.insert_text(range, &op.text, None, Source::User),
      1 => editor.delete_text(range, Source::User),
      2 => editor.toggle_text_format(range, bold(), Source::User),
      3 => editor.toggle_line_format(range, bold(), Source::User),
      4 => editor.insert_text(from, &op.text, None, Source::Api),
      5 => {
        editor.set_selection(Some(range), Source::User);
        continue;
      },
      _ => editor.remove_format(range, Source::User),
    };
    assert!(result.is_ok());
    assert!(editor.contents().is_document());
    assert!(editor.text().ends_with('\n'));
    assert_eq!(editor.length(), editor.contents().len());
  }

  while editor.history().has_undo() {
    assert!(editor.undo().is_ok());
    assert!(editor.text().ends_with('\n'));
  }
  while editor.history().has_redo() {
    assert!(editor.redo().is_ok());
  }
});
