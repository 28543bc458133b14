//! Rich-text documents and changes as lists of operations.
//!
//! A [`Delta`] is an ordered list of [`Op`]s:
//!
//! - **Insert(content, attributes)** - Insert a text run or an embed
//! - **Delete(n)** - Remove `n` characters
//! - **Retain(n, attributes)** - Keep `n` characters, optionally reformatting
//!   them
//!
//! A document is a delta of inserts only. A change is read against a
//! document from its start. Lengths count `char`s; an embed counts as one.
//!
//! ```ignore
//! use the_delta::Delta;
//!
//! let mut doc = Delta::new();
//! doc.insert("Hello\n");
//!
//! let mut change = Delta::new();
//! change.retain(5).insert(" World");
//!
//! let doc = doc.compose(&change);
//! assert_eq!(doc.text(), "Hello World\n");
//! ```
//!
//! # Concurrent edits
//!
//! Two changes made against the same document can be rebased onto each
//! other with [`Delta::transform`]:
//!
//! ```ignore
//! let b_after_a = a.transform(&b, true);
//! let a_after_b = b.transform(&a, false);
//! assert_eq!(doc.compose(&a).compose(&b_after_a), doc.compose(&b).compose(&a_after_b));
//! ```
//!
//! # Wire format
//!
//! Deltas serialize as the JSON array of their ops, each op being one of
//! `{"insert": ..}`, `{"delete": n}` or `{"retain": n}` with optional
//! `"attributes"`.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod attributes;
pub mod delta;
pub mod iter;
pub mod lines;
pub mod op;

pub type Tendril = SmartString<LazyCompact>;

pub use attributes::Attributes;
pub use delta::{
  Delta,
  DeltaError,
};
pub use iter::OpIter;
pub use lines::{
  Line,
  OpSpan,
};
pub use op::{
  Content,
  Op,
  OpError,
  OpKind,
};
