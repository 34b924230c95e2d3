//! Resolver configuration: behavior options and per-property defaults
//!
//! Both are plain serde documents and can be loaded from YAML or JSON,
//! either inline or from a file (format chosen by extension).

use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Behavior switches for a resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverOptions {
    /// Drop an override instead of storing it when the new value equals
    /// the value the node would inherit anyway
    pub collapse_redundant_overrides: bool,
}

impl ResolverOptions {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        parse_yaml(yaml)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse_json(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        parse_file(path.as_ref())
    }
}

/// Values a property resolves to when no node on the chain overrides it
///
/// ```rust
/// use cascade_core::{PropertyDefaults, Value};
///
/// let defaults = PropertyDefaults::new()
///     .with("logRotator", "off")
///     .with("blockBuildWhenUpstreamBuilding", false);
/// assert_eq!(defaults.get("logRotator"), Some(&Value::from("off")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyDefaults {
    values: IndexMap<String, Value>,
}

impl PropertyDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the default for a property, returning the previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        parse_yaml(yaml)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse_json(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        parse_file(path.as_ref())
    }
}

pub(crate) fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).map_err(|e| Error::parse(e.to_string()))
}

pub(crate) fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::parse(e.to_string()))
}

/// Read a YAML or JSON document, JSON only for a `.json` extension
pub(crate) fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path.display(), e))?;

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&content),
        _ => parse_yaml(&content),
    };
    parsed.map_err(|e| e.with_help(format!("Check the syntax of '{}'", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_default_off() {
        assert!(!ResolverOptions::default().collapse_redundant_overrides);
        assert_eq!(ResolverOptions::from_yaml("{}").unwrap(), ResolverOptions::default());
    }

    #[test]
    fn test_options_from_yaml() {
        let opts = ResolverOptions::from_yaml("collapse_redundant_overrides: true").unwrap();
        assert!(opts.collapse_redundant_overrides);
    }

    #[test]
    fn test_options_reject_unknown_fields() {
        let err = ResolverOptions::from_yaml("colapse: true").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Parse);
    }

    #[test]
    fn test_defaults_from_yaml_keep_order() {
        let yaml = r#"
logRotator: "off"
blockBuildWhenUpstreamBuilding: false
scm:
  type: none
"#;
        let defaults = PropertyDefaults::from_yaml(yaml).unwrap();

        assert_eq!(
            defaults.keys().collect::<Vec<_>>(),
            vec!["logRotator", "blockBuildWhenUpstreamBuilding", "scm"]
        );
        assert_eq!(
            defaults.iter().next(),
            Some(("logRotator", &Value::from("off")))
        );
        assert_eq!(
            defaults.get("scm").and_then(|v| v.field("type")),
            Some(&Value::from("none"))
        );
    }

    #[test]
    fn test_defaults_from_json() {
        let defaults = PropertyDefaults::from_json(r#"{"quietPeriod": 5}"#).unwrap();
        assert_eq!(defaults.get("quietPeriod"), Some(&Value::Integer(5)));
        assert_eq!(defaults.len(), 1);
    }

    #[test]
    fn test_defaults_set_and_remove() {
        let mut defaults = PropertyDefaults::new().with("logRotator", "off");
        assert_eq!(defaults.set("logRotator", "on"), Some(Value::from("off")));
        assert_eq!(defaults.remove("logRotator"), Some(Value::from("on")));
        assert!(defaults.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PropertyDefaults::from_file("/nonexistent/defaults.yaml").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Io);
    }
}
