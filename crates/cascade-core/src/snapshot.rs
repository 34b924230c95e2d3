//! Serializable form of a resolver for an external store
//!
//! ```yaml
//! options:
//!   collapse_redundant_overrides: false
//! defaults:
//!   logRotator: "off"
//! nodes:
//!   - name: parent
//!   - name: child
//!     parent: parent
//!     overrides:
//!       logRotator: {days: 2}
//! ```
//!
//! Only overrides are stored; reset properties read back as never set.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cascade::CascadingConfigResolver;
use crate::error::{Error, Result};
use crate::node::ConfigNode;
use crate::options::{self, PropertyDefaults, ResolverOptions};
use crate::value::Value;

/// A whole resolver as plain data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    #[serde(default)]
    pub options: ResolverOptions,
    #[serde(default, skip_serializing_if = "PropertyDefaults::is_empty")]
    pub defaults: PropertyDefaults,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// One node inside a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, Value>,
}

impl Snapshot {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        options::parse_yaml(yaml)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        options::parse_json(json)
    }

    /// Load from a YAML or JSON file (by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        options::parse_file(path.as_ref())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::internal(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::internal(e.to_string()))
    }

    /// Write to a file, JSON for a `.json` extension and YAML otherwise
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.to_json()?,
            _ => self.to_yaml()?,
        };
        std::fs::write(path, content).map_err(|e| Error::io(path.display(), e))
    }
}

impl CascadingConfigResolver {
    /// Rebuild a resolver from stored data
    ///
    /// Duplicate names and parent cycles are rejected. Parent links to
    /// nodes that are not in the snapshot are kept and logged.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut resolver = Self::with_config(snapshot.defaults, snapshot.options);

        for record in snapshot.nodes {
            let mut node = ConfigNode::new(record.name, record.parent);
            for (key, value) in record.overrides {
                node.set_override(&key, value);
            }
            resolver.insert_unchecked(node)?;
        }

        for node in resolver.nodes() {
            if let Some(parent) = node.parent() {
                if !resolver.contains(parent) {
                    log::warn!(
                        "Node '{}' cascades from '{}', which is not in the snapshot",
                        node.name(),
                        parent
                    );
                }
            }
        }
        resolver.check_acyclic()?;

        log::debug!("Loaded {} nodes from snapshot", resolver.len());
        Ok(resolver)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            options: self.options().clone(),
            defaults: self.defaults().clone(),
            nodes: self
                .nodes()
                .map(|node| NodeRecord {
                    name: node.name().to_string(),
                    parent: node.parent().map(str::to_string),
                    overrides: node
                        .overrides()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Load a resolver from a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_snapshot(Snapshot::from_file(path)?)
    }

    /// Save the resolver to a snapshot file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_snapshot().save(path)
    }
}
