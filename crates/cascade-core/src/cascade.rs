//! Cascading resolution over a tree of named configuration nodes
//!
//! Every node may name a cascading parent. A property resolves to the
//! nearest override found walking from the node toward the root, then to
//! the configured default, then to unset. Parent links are checked for
//! cycles before they are committed, so every mutation either applies
//! completely or leaves the tree untouched.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::node::ConfigNode;
use crate::options::{PropertyDefaults, ResolverOptions};
use crate::property::EffectiveValue;
use crate::value::Value;

/// Owns the node tree and answers resolution queries against it
#[derive(Debug, Clone, Default)]
pub struct CascadingConfigResolver {
    nodes: IndexMap<String, ConfigNode>,
    defaults: PropertyDefaults,
    options: ResolverOptions,
}

impl CascadingConfigResolver {
    /// Create an empty resolver with no defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty resolver with the given defaults and options
    pub fn with_config(defaults: PropertyDefaults, options: ResolverOptions) -> Self {
        Self {
            nodes: IndexMap::new(),
            defaults,
            options,
        }
    }

    pub fn defaults(&self) -> &PropertyDefaults {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut PropertyDefaults {
        &mut self.defaults
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &ConfigNode> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Result<&ConfigNode> {
        self.nodes
            .get(name)
            .ok_or_else(|| Error::unknown_node(name))
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut ConfigNode> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| Error::unknown_node(name))
    }

    /// Define a new node, optionally cascading from an existing one
    pub fn create_node(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        if self.nodes.contains_key(name) {
            return Err(Error::duplicate_node(name));
        }
        if let Some(p) = parent {
            self.check_link_activation(name, p)?;
        }

        log::debug!("Creating node '{}' (parent: {:?})", name, parent);
        self.nodes.insert(
            name.to_string(),
            ConfigNode::new(name, parent.map(str::to_string)),
        );
        Ok(())
    }

    /// Insert a node as-is, without checking its parent link
    ///
    /// Callers must run [`Self::check_acyclic`] once loading is complete.
    pub(crate) fn insert_unchecked(&mut self, node: ConfigNode) -> Result<()> {
        if self.nodes.contains_key(node.name()) {
            return Err(Error::duplicate_node(node.name()));
        }
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Verify that no parent chain in the tree loops
    pub(crate) fn check_acyclic(&self) -> Result<()> {
        for name in self.nodes.keys() {
            self.chain(name)?;
        }
        Ok(())
    }

    pub fn parent(&self, name: &str) -> Result<Option<&str>> {
        Ok(self.node(name)?.parent())
    }

    /// Direct cascading children, in creation order
    pub fn children(&self, name: &str) -> Result<Vec<&str>> {
        self.node(name)?;
        Ok(self
            .nodes
            .values()
            .filter(|n| n.parent() == Some(name))
            .map(ConfigNode::name)
            .collect())
    }

    /// Existing ancestors, nearest first
    pub fn ancestors(&self, name: &str) -> Result<Vec<&str>> {
        Ok(self
            .chain(name)?
            .into_iter()
            .skip(1)
            .map(ConfigNode::name)
            .collect())
    }

    /// Change (or clear) the cascading parent of a node
    ///
    /// Fails without touching the tree when either name is unknown or the
    /// new link would close a cycle.
    pub fn set_parent(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        self.node(name)?;
        if let Some(p) = parent {
            self.check_parent_link(name, p)?;
        }

        let previous = self.node_mut(name)?.set_parent(parent.map(str::to_string));
        log::debug!(
            "Parent of '{}' changed from {:?} to {:?}",
            name,
            previous,
            parent
        );
        Ok(())
    }

    fn check_parent_link(&self, name: &str, parent: &str) -> Result<()> {
        self.node(parent)?;

        let mut trail = vec![name.to_string()];
        for ancestor in self.chain(parent)? {
            trail.push(ancestor.name().to_string());
            if ancestor.name() == name {
                return Err(Error::cycle(name, trail));
            }
        }
        Ok(())
    }

    /// Override a property on one node
    ///
    /// Descendants that inherit the property see the new value on their
    /// next resolution.
    pub fn set_override(&mut self, name: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();

        if self.options.collapse_redundant_overrides {
            let inherited = self.resolve_inherited(name, key)?;
            if inherited.value.as_ref() == Some(&value) {
                log::debug!(
                    "'{}' on '{}' equals the inherited value; keeping it inherited",
                    key,
                    name
                );
                self.node_mut(name)?.reset(key);
                return Ok(());
            }
        }

        log::debug!("Overriding '{}' on '{}' with {}", key, name, value);
        self.node_mut(name)?.set_override(key, value);
        Ok(())
    }

    /// Drop a local override so the property inherits again
    ///
    /// Returns the value that was removed.
    pub fn reset_override(&mut self, name: &str, key: &str) -> Result<Value> {
        let node = self.node_mut(name)?;
        match node.reset(key) {
            Some(previous) => {
                log::debug!("Reset '{}' on '{}' to inherited", key, name);
                Ok(previous)
            }
            None => Err(Error::not_overridden(name, key)),
        }
    }

    /// Effective value of a property on a node
    pub fn resolve(&self, name: &str, key: &str) -> Result<EffectiveValue> {
        self.resolve_from(name, key, 0)
    }

    /// The value the node would have if it did not override the property
    pub fn resolve_inherited(&self, name: &str, key: &str) -> Result<EffectiveValue> {
        self.resolve_from(name, key, 1)
    }

    fn resolve_from(&self, name: &str, key: &str, skip: usize) -> Result<EffectiveValue> {
        let chain = self.chain(name)?;

        for (depth, node) in chain.iter().enumerate().skip(skip) {
            if let Some(value) = node.property(key).overridden_value() {
                log::trace!("'{}' on '{}' found at '{}'", key, name, node.name());
                return Ok(if depth == 0 {
                    EffectiveValue::local(value.clone())
                } else {
                    EffectiveValue::inherited(value.clone(), node.name())
                });
            }
        }

        Ok(match self.defaults.get(key) {
            Some(value) => EffectiveValue::default_value(value.clone()),
            None => EffectiveValue::unset(),
        })
    }

    /// Effective values for every property known on the chain or in the
    /// defaults: defaults first, then keys from the root down
    pub fn resolve_all(&self, name: &str) -> Result<IndexMap<String, EffectiveValue>> {
        let chain = self.chain(name)?;

        let mut keys: IndexSet<&str> = self.defaults.keys().collect();
        for node in chain.iter().rev() {
            keys.extend(node.property_keys());
        }

        let mut resolved = IndexMap::with_capacity(keys.len());
        for key in keys {
            resolved.insert(key.to_string(), self.resolve(name, key)?);
        }
        Ok(resolved)
    }

    pub fn is_locally_overridden(&self, name: &str, key: &str) -> Result<bool> {
        Ok(self.node(name)?.is_overridden(key))
    }

    pub fn overridden_properties(&self, name: &str) -> Result<Vec<&str>> {
        Ok(self.node(name)?.overrides().map(|(k, _)| k).collect())
    }

    /// Link for the "reset to inherited" affordance, present only while the
    /// property is overridden on this node
    pub fn reset_link(&self, name: &str, key: &str) -> Result<Option<String>> {
        if !self.is_locally_overridden(name, key)? {
            return Ok(None);
        }
        Ok(Some(format!(
            "/job/{}/resetProjectProperty?propertyName={}",
            name, key
        )))
    }

    /// Rename a node; children follow the rename
    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<()> {
        self.node(old)?;
        if old == new {
            return Ok(());
        }
        if self.nodes.contains_key(new) {
            return Err(Error::duplicate_node(new));
        }

        self.check_link_activation(new, old)?;

        let index = self
            .nodes
            .get_index_of(old)
            .ok_or_else(|| Error::unknown_node(old))?;
        let mut node = self
            .nodes
            .shift_remove(old)
            .ok_or_else(|| Error::unknown_node(old))?;
        node.rename(new.to_string());
        self.nodes.shift_insert(index, new.to_string(), node);

        for child in self.nodes.values_mut() {
            if child.parent() == Some(old) {
                child.set_parent(Some(new.to_string()));
            }
        }

        log::debug!("Renamed node '{}' to '{}'", old, new);
        Ok(())
    }

    /// Remove a node; its children become roots and keep their overrides
    pub fn remove_node(&mut self, name: &str) -> Result<ConfigNode> {
        let removed = self
            .nodes
            .shift_remove(name)
            .ok_or_else(|| Error::unknown_node(name))?;

        for child in self.nodes.values_mut() {
            if child.parent() == Some(name) {
                log::debug!("Detaching '{}' from removed parent '{}'", child.name(), name);
                child.set_parent(None);
            }
        }

        log::debug!("Removed node '{}'", name);
        Ok(removed)
    }

    /// Reject giving `name` the chain starting at `start` when a dangling
    /// link to `name` already sits on that chain
    ///
    /// Such a link becomes live the moment `name` exists and would close a
    /// loop through `name` itself.
    fn check_link_activation(&self, name: &str, start: &str) -> Result<()> {
        let chain = self.chain(start)?;
        if let Some(pos) = chain.iter().position(|n| n.parent() == Some(name)) {
            let mut trail = vec![name.to_string()];
            trail.extend(chain[..=pos].iter().map(|n| n.name().to_string()));
            trail.push(name.to_string());
            return Err(Error::cycle(name, trail));
        }
        Ok(())
    }

    /// The node followed by its existing ancestors
    ///
    /// A dangling parent link ends the walk. Revisiting a node fails with a
    /// cycle error instead of looping.
    fn chain(&self, start: &str) -> Result<Vec<&ConfigNode>> {
        let mut node = self.node(start)?;
        let mut chain = vec![node];
        let mut seen = HashSet::from([node.name()]);

        while let Some(parent) = node.parent() {
            let Some(next) = self.nodes.get(parent) else {
                log::trace!(
                    "Cascading parent '{}' of '{}' does not exist; treating '{}' as a root",
                    parent,
                    node.name(),
                    node.name()
                );
                break;
            };
            if !seen.insert(next.name()) {
                let mut trail: Vec<String> =
                    chain.iter().map(|n| n.name().to_string()).collect();
                trail.push(next.name().to_string());
                return Err(Error::cycle(start, trail));
            }
            chain.push(next);
            node = next;
        }

        Ok(chain)
    }
}
