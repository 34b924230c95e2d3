//! Configuration nodes

use indexmap::IndexMap;

use crate::property::PropertyValue;
use crate::value::Value;

/// A named node in the cascading tree
///
/// The parent is held by name only. It may point at a node that does not
/// exist (yet); the resolver treats such a link as the end of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    name: String,
    parent: Option<String>,
    properties: IndexMap<String, PropertyValue>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent,
            properties: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Local state of a property; never-touched keys read as `Inherited`
    pub fn property(&self, key: &str) -> &PropertyValue {
        const INHERITED: &PropertyValue = &PropertyValue::Inherited;
        self.properties.get(key).unwrap_or(INHERITED)
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.property(key).is_overridden()
    }

    /// Keys this node has ever held state for, including reset ones
    pub fn property_keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Locally overridden keys and values, in first-override order
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties
            .iter()
            .filter_map(|(k, p)| p.overridden_value().map(|v| (k.as_str(), v)))
    }

    pub(crate) fn set_parent(&mut self, parent: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.parent, parent)
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_override(&mut self, key: &str, value: Value) -> PropertyValue {
        match self.properties.get_mut(key) {
            Some(slot) => std::mem::replace(slot, PropertyValue::Overridden(value)),
            None => {
                self.properties
                    .insert(key.to_string(), PropertyValue::Overridden(value));
                PropertyValue::Inherited
            }
        }
    }

    /// Flip an override back to `Inherited`, returning the dropped value
    ///
    /// The key stays in the map so "cleared" remains distinguishable from
    /// "never set".
    pub(crate) fn reset(&mut self, key: &str) -> Option<Value> {
        let slot = self.properties.get_mut(key)?;
        match std::mem::take(slot) {
            PropertyValue::Overridden(v) => Some(v),
            PropertyValue::Inherited => None,
        }
    }
}
