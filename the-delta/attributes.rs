//! Formatting attributes attached to inserts and retains.
//!
//! An attribute value of `null` is meaningful: on a retain it removes the
//! format from the retained text. Functions here take and return
//! `Option<Attributes>`, and never return an empty map: "no attributes" is
//! always `None`.

use std::collections::{
  BTreeMap,
  btree_map,
};

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.0.insert(key.into(), value.into())
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.0.remove(key)
  }

  pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
    self.0.iter()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  /// `Some(self)` unless empty.
  pub fn non_empty(self) -> Option<Self> {
    (!self.is_empty()).then_some(self)
  }

  /// The same keys, all set to `null`.
  pub fn nulled(&self) -> Self {
    self.keys().map(|key| (key, Value::Null)).collect()
  }

  /// Whether every key of `self` is set to the same value in `other`.
  pub fn is_subset_of(&self, other: &Attributes) -> bool {
    self.iter().all(|(key, value)| other.get(key) == Some(value))
  }

  /// Keys present in both maps with equal values.
  pub fn common(&self, other: &Attributes) -> Attributes {
    self
      .iter()
      .filter(|(key, value)| other.get(key) == Some(*value))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect()
  }

  /// Apply `b` on top of `a`.
  ///
  /// Keys in `b` win. `null` values in `b` are dropped unless `keep_null` is
  /// set, which is the case when composing two retains: the `null` must
  /// survive to clear the format from the underlying text.
  pub fn compose(
    a: Option<&Attributes>,
    b: Option<&Attributes>,
    keep_null: bool,
  ) -> Option<Attributes> {
    let mut attributes: Attributes = match b {
      Some(b) => {
        b.iter()
          .filter(|(_, value)| keep_null || !value.is_null())
          .map(|(key, value)| (key.clone(), value.clone()))
          .collect()
      },
      None => Attributes::new(),
    };
    if let Some(a) = a {
      for (key, value) in a.iter() {
        if !b.is_some_and(|b| b.contains_key(key)) {
          attributes.0.insert(key.clone(), value.clone());
        }
      }
    }
    attributes.non_empty()
  }

  /// The attributes to retain with to turn `a` into `b`.
  pub fn diff(a: Option<&Attributes>, b: Option<&Attributes>) -> Option<Attributes> {
    let empty = Attributes::new();
    let (a, b) = (a.unwrap_or(&empty), b.unwrap_or(&empty));
    let mut attributes = Attributes::new();
    for key in a.0.keys().chain(b.0.keys()) {
      let (old, new) = (a.get(key), b.get(key));
      if old != new {
        attributes
          .0
          .insert(key.clone(), new.cloned().unwrap_or(Value::Null));
      }
    }
    attributes.non_empty()
  }

  /// The attributes that undo retaining `base`-formatted text with `attr`.
  pub fn invert(attr: Option<&Attributes>, base: Option<&Attributes>) -> Option<Attributes> {
    let empty = Attributes::new();
    let (attr, base) = (attr.unwrap_or(&empty), base.unwrap_or(&empty));
    let mut inverted = Attributes::new();
    for (key, value) in base.iter() {
      if attr.get(key).is_some_and(|changed| changed != value) {
        inverted.0.insert(key.clone(), value.clone());
      }
    }
    for key in attr.keys() {
      if !base.contains_key(key) {
        inverted.0.insert(key.to_string(), Value::Null);
      }
    }
    inverted.non_empty()
  }

  /// Rebase `b` over a concurrent `a`.
  ///
  /// With `priority`, `a` is considered to have happened first and its keys
  /// take precedence: they are removed from `b`.
  pub fn transform(
    a: Option<&Attributes>,
    b: Option<&Attributes>,
    priority: bool,
  ) -> Option<Attributes> {
    let Some(a) = a else {
      return b.cloned();
    };
    let b = b?;
    if !priority {
      return Some(b.clone());
    }
    b.iter()
      .filter(|(key, _)| !a.contains_key(key))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect::<Attributes>()
      .non_empty()
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(
      iter
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect(),
    )
  }
}

impl<'a> IntoIterator for &'a Attributes {
  type Item = (&'a String, &'a Value);
  type IntoIter = btree_map::Iter<'a, String, Value>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn attrs(value: Value) -> Attributes {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn compose_left_is_none() {
    let b = attrs(json!({ "bold": true }));
    assert_eq!(Attributes::compose(None, Some(&b), false), Some(b));
  }

  #[test]
  fn compose_adds_and_overwrites() {
    let a = attrs(json!({ "bold": true, "color": "red" }));
    let b = attrs(json!({ "italic": true, "color": "blue" }));
    assert_eq!(
      Attributes::compose(Some(&a), Some(&b), false),
      Some(attrs(json!({ "bold": true, "italic": true, "color": "blue" })))
    );
  }

  #[test]
  fn compose_removes_with_null() {
    let a = attrs(json!({ "bold": true, "color": "red" }));
    let b = attrs(json!({ "bold": null }));
    assert_eq!(
      Attributes::compose(Some(&a), Some(&b), false),
      Some(attrs(json!({ "color": "red" })))
    );
    assert_eq!(
      Attributes::compose(Some(&a), Some(&b), true),
      Some(attrs(json!({ "bold": null, "color": "red" })))
    );
  }

  #[test]
  fn compose_removes_everything() {
    let a = attrs(json!({ "bold": true }));
    let b = attrs(json!({ "bold": null }));
    assert_eq!(Attributes::compose(Some(&a), Some(&b), false), None);
  }

  #[test]
  fn diff_keys() {
    let a = attrs(json!({ "bold": true, "color": "red" }));
    let b = attrs(json!({ "color": "blue", "italic": true }));
    assert_eq!(
      Attributes::diff(Some(&a), Some(&b)),
      Some(attrs(json!({ "bold": null, "color": "blue", "italic": true })))
    );
    assert_eq!(Attributes::diff(Some(&a), Some(&a)), None);
    assert_eq!(Attributes::diff(None, None), None);
  }

  #[test]
  fn invert_restores_base() {
    let attr = attrs(json!({ "bold": true, "color": "blue", "italic": null }));
    let base = attrs(json!({ "color": "red", "italic": true }));
    assert_eq!(
      Attributes::invert(Some(&attr), Some(&base)),
      Some(attrs(json!({ "bold": null, "color": "red", "italic": true })))
    );
  }

  #[test]
  fn transform_with_priority() {
    let a = attrs(json!({ "bold": true, "color": "red" }));
    let b = attrs(json!({ "bold": false, "italic": true }));
    assert_eq!(
      Attributes::transform(Some(&a), Some(&b), true),
      Some(attrs(json!({ "italic": true })))
    );
    assert_eq!(Attributes::transform(Some(&a), Some(&b), false), Some(b.clone()));
    assert_eq!(Attributes::transform(None, Some(&b), true), Some(b));
    assert_eq!(Attributes::transform(Some(&a), None, true), None);
  }

  #[test]
  fn common_and_nulled() {
    let a = attrs(json!({ "bold": true, "color": "red" }));
    let b = attrs(json!({ "bold": true, "color": "blue" }));
    assert_eq!(a.common(&b), attrs(json!({ "bold": true })));
    assert_eq!(a.nulled(), attrs(json!({ "bold": null, "color": null })));
    assert!(attrs(json!({ "bold": true })).is_subset_of(&a));
    assert!(!b.is_subset_of(&a));
  }
}
