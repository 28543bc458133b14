#![no_main]

mod common;

use libfuzzer_sys::fuzz_target;

use crate::common::{
  ByteCursor,
  decode_change,
  decode_document,
};

fuzz_target!(|data: &[u8]| {
  let mut cursor = ByteCursor::new(data);
  let doc = decode_document(&mut cursor);
  let a = decode_change(&mut cursor, doc.len());
  let b = decode_change(&mut cursor, doc.len());

  let left = doc.compose(&a);
  assert!(left.is_document());
  assert_eq!(left.compose(&a.invert(&doc)), doc);

  // Concurrent changes converge whichever side wins ties.
  let a_then_b = left.compose(&a.transform(&b, true));
  let b_then_a = doc.compose(&b).compose(&b.transform(&a, false));
  assert_eq!(a_then_b, b_then_a);

  let at = cursor.next_usize(doc.len());
  let diff = doc.diff(&left, Some(at)).unwrap();
  assert_eq!(doc.compose(&diff), left);
});
