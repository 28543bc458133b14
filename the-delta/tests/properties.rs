//! Algebraic properties of deltas over generated documents and changes.

use quickcheck::quickcheck;
use serde_json::Value;
use the_delta::{
  Attributes,
  Delta,
  Op,
};

/// A document from text runs, each optionally bold, ending in a newline.
fn document(runs: &[(String, bool)]) -> Delta {
  let mut doc = Delta::new();
  for (text, bold) in runs {
    doc.insert_with(text, bold.then(bold_attrs));
  }
  doc.insert("\n");
  doc
}

fn bold_attrs() -> Attributes {
  [("bold", true)].into_iter().collect()
}

fn unbold_attrs() -> Attributes {
  [("bold", Value::Null)].into_iter().collect()
}

/// A change valid against a document of length `base`, driven by `steps`.
fn change(base: usize, steps: &[(u8, u8, String)]) -> Delta {
  let mut change = Delta::new();
  let mut pos = 0;
  for (kind, n, text) in steps {
    let left = base - pos;
    let n = (*n as usize % 4 + 1).min(left);
    match kind % 5 {
      0 => {
        change.insert(text);
      },
      1 if n > 0 => {
        change.delete(n);
        pos += n;
      },
      2 if n > 0 => {
        change.retain(n);
        pos += n;
      },
      3 if n > 0 => {
        change.retain_with(n, Some(bold_attrs()));
        pos += n;
      },
      4 if n > 0 => {
        change.retain_with(n, Some(unbold_attrs()));
        pos += n;
      },
      _ => {},
    }
  }
  change.chop();
  change
}

fn is_coalesced(delta: &Delta) -> bool {
  delta.ops().windows(2).all(|pair| {
    match pair {
      [Op::Insert(a, a_attrs), Op::Insert(b, b_attrs)] => {
        a.is_embed() || b.is_embed() || a_attrs != b_attrs
      },
      [Op::Retain(_, a), Op::Retain(_, b)] => a != b,
      [Op::Delete(_), Op::Delete(_)] => false,
      [Op::Delete(_), Op::Insert(..)] => false,
      _ => true,
    }
  }) && delta.ops().iter().all(|op| !op.is_empty())
}

quickcheck! {
    fn diff_with_itself_is_empty(runs: Vec<(String, bool)>) -> bool {
        let doc = document(&runs);
        doc.diff(&doc, None) == Ok(Delta::new())
    }

    fn compose_diff_round_trip(a: Vec<(String, bool)>, b: Vec<(String, bool)>) -> bool {
        let (old, new) = (document(&a), document(&b));
        let change = old.diff(&new, None).unwrap();
        old.compose(&change) == new
    }

    fn compose_diff_round_trip_with_cursor(
        a: Vec<(String, bool)>,
        b: Vec<(String, bool)>,
        cursor: usize
    ) -> bool {
        let (old, new) = (document(&a), document(&b));
        let cursor = cursor % (old.len() + 1);
        let change = old.diff(&new, Some(cursor)).unwrap();
        old.compose(&change) == new
    }

    fn compose_is_coalesced(runs: Vec<(String, bool)>, a: Vec<(u8, u8, String)>, b: Vec<(u8, u8, String)>) -> bool {
        let doc = document(&runs);
        let a = change(doc.len(), &a);
        let after_a = doc.compose(&a);
        let b = change(after_a.len(), &b);
        is_coalesced(&after_a) && is_coalesced(&after_a.compose(&b)) && is_coalesced(&a.compose(&b))
    }

    fn compose_is_associative(
        runs: Vec<(String, bool)>,
        b: Vec<(u8, u8, String)>,
        c: Vec<(u8, u8, String)>
    ) -> bool {
        let doc = document(&runs);
        let b = change(doc.len(), &b);
        let c = change(doc.compose(&b).len(), &c);
        doc.compose(&b).compose(&c) == doc.compose(&b.compose(&c))
    }

    fn transform_converges(
        runs: Vec<(String, bool)>,
        a: Vec<(u8, u8, String)>,
        b: Vec<(u8, u8, String)>
    ) -> bool {
        let doc = document(&runs);
        let a = change(doc.len(), &a);
        let b = change(doc.len(), &b);
        let left = doc.compose(&a).compose(&a.transform(&b, true));
        let right = doc.compose(&b).compose(&b.transform(&a, false));
        left == right
    }

    fn invert_undoes(runs: Vec<(String, bool)>, a: Vec<(u8, u8, String)>) -> bool {
        let doc = document(&runs);
        let a = change(doc.len(), &a);
        doc.compose(&a).compose(&a.invert(&doc)) == doc
    }

    fn slices_concat_back(runs: Vec<(String, bool)>, at: usize) -> bool {
        let doc = document(&runs);
        let at = at % (doc.len() + 1);
        doc.slice(..at).concat(&doc.slice(at..)) == doc
    }

    fn lines_cover_document(runs: Vec<(String, bool)>) -> bool {
        let doc = document(&runs);
        let lines = doc.lines();
        let mut pos = 0;
        for line in &lines {
            if line.start != pos || line.content.len() + 1 != line.len() {
                return false;
            }
            pos = line.end;
        }
        pos == doc.len() && lines.iter().all(|line| line.has_newline)
    }
}

#[test]
fn cursor_decides_ambiguous_insert() {
  let mut old = Delta::new();
  old.insert("ab\n");
  let mut new = Delta::new();
  new.insert("axb\n");

  let mut expected = Delta::new();
  expected.retain(1).insert("x");
  assert_eq!(old.diff(&new, Some(1)).unwrap(), expected);

  let mut old = Delta::new();
  old.insert("aaa\n");
  let mut new = Delta::new();
  new.insert("aaaa\n");
  for cursor in 0..=3 {
    let mut expected = Delta::new();
    expected.retain(cursor).insert("a");
    assert_eq!(old.diff(&new, Some(cursor)).unwrap(), expected.chop().clone());
  }
}

#[test]
fn diff_keeps_emoji_whole() {
  let mut old = Delta::new();
  old.insert("a😀b\n");
  let mut new = Delta::new();
  new.insert("a😁b\n");

  let mut expected = Delta::new();
  expected.retain(1).insert("😁").delete(1);
  assert_eq!(old.diff(&new, None).unwrap(), expected);
}
