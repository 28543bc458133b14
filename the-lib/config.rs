//! Editor configuration, loaded from TOML.
//!
//! ```toml
//! [history]
//! delay = 500
//! max-stack = 50
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use toml::{
  Table,
  Value,
};

use crate::history::HistoryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid editor config: {0}")]
  BadConfig(#[from] toml::de::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditorConfig {
  pub history: HistoryConfig,
}

impl EditorConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  /// Load a global config overridden key by key by a local one.
  pub fn load(global: &str, local: &str) -> Result<Self, ConfigError> {
    let global: Table = toml::from_str(global)?;
    let local: Table = toml::from_str(local)?;
    Ok(merge_toml_values(Value::Table(global), Value::Table(local)).try_into()?)
  }
}

/// Merge `right` into `left`. Tables merge recursively, everything else is
/// replaced.
fn merge_toml_values(left: Value, right: Value) -> Value {
  match (left, right) {
    (Value::Table(mut left), Value::Table(right)) => {
      for (key, value) in right {
        let merged = match left.remove(&key) {
          Some(existing) => merge_toml_values(existing, value),
          None => value,
        };
        left.insert(key, merged);
      }
      Value::Table(left)
    },
    (_, right) => right,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_is_default() {
    assert_eq!(EditorConfig::from_toml("").unwrap(), EditorConfig::default());
  }

  #[test]
  fn parses_history() {
    let config = EditorConfig::from_toml(
      r#"
      [history]
      delay = 250
      max-stack = 10
      "#,
    )
    .unwrap();
    assert_eq!(config.history, HistoryConfig {
      delay:     250,
      max_stack: 10,
    });
  }

  #[test]
  fn rejects_unknown_keys() {
    assert!(EditorConfig::from_toml("[history]\nmax_stack = 3\n").is_err());
    assert!(EditorConfig::from_toml("theme = \"dark\"\n").is_err());
  }

  #[test]
  fn local_overrides_global() {
    let config = EditorConfig::load(
      "[history]\ndelay = 250\nmax-stack = 10\n",
      "[history]\nmax-stack = 20\n",
    )
    .unwrap();
    assert_eq!(config.history.delay, 250);
    assert_eq!(config.history.max_stack, 20);
  }
}
