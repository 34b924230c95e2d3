//! Thread-safe handle for concurrent editors
//!
//! Each mutation holds the write lock across its whole check-then-commit
//! sequence, so a parent reassignment can never race a cycle check.
//! Reads share the read lock and see a consistent tree.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::cascade::CascadingConfigResolver;
use crate::error::{Error, Result};
use crate::property::EffectiveValue;
use crate::snapshot::Snapshot;
use crate::value::Value;

/// Cloneable, lock-guarded [`CascadingConfigResolver`]
#[derive(Debug, Clone, Default)]
pub struct SharedResolver {
    inner: Arc<RwLock<CascadingConfigResolver>>,
}

impl SharedResolver {
    pub fn new(resolver: CascadingConfigResolver) -> Self {
        Self {
            inner: Arc::new(RwLock::new(resolver)),
        }
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, CascadingConfigResolver>> {
        self.inner
            .read()
            .map_err(|_| Error::internal("resolver lock poisoned"))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, CascadingConfigResolver>> {
        self.inner
            .write()
            .map_err(|_| Error::internal("resolver lock poisoned"))
    }

    /// Run a read-only closure against a consistent view of the tree
    pub fn read<T>(&self, f: impl FnOnce(&CascadingConfigResolver) -> T) -> Result<T> {
        Ok(f(&*self.read_guard()?))
    }

    /// Run several mutations as one atomic step
    ///
    /// If the closure fails, the tree is restored to its state before the
    /// call.
    pub fn write<T>(
        &self,
        f: impl FnOnce(&mut CascadingConfigResolver) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.write_guard()?;
        let before = (*guard).clone();
        let result = f(&mut *guard);
        if result.is_err() {
            log::debug!("Rolling back failed batch update");
            *guard = before;
        }
        result
    }

    pub fn create_node(&self, name: &str, parent: Option<&str>) -> Result<()> {
        self.write_guard()?.create_node(name, parent)
    }

    pub fn set_parent(&self, name: &str, parent: Option<&str>) -> Result<()> {
        self.write_guard()?.set_parent(name, parent)
    }

    pub fn set_override(&self, name: &str, key: &str, value: impl Into<Value>) -> Result<()> {
        self.write_guard()?.set_override(name, key, value)
    }

    pub fn reset_override(&self, name: &str, key: &str) -> Result<Value> {
        self.write_guard()?.reset_override(name, key)
    }

    pub fn rename_node(&self, old: &str, new: &str) -> Result<()> {
        self.write_guard()?.rename_node(old, new)
    }

    pub fn remove_node(&self, name: &str) -> Result<()> {
        self.write_guard()?.remove_node(name).map(|_| ())
    }

    pub fn resolve(&self, name: &str, key: &str) -> Result<EffectiveValue> {
        self.read_guard()?.resolve(name, key)
    }

    pub fn resolve_all(&self, name: &str) -> Result<IndexMap<String, EffectiveValue>> {
        self.read_guard()?.resolve_all(name)
    }

    pub fn is_locally_overridden(&self, name: &str, key: &str) -> Result<bool> {
        self.read_guard()?.is_locally_overridden(name, key)
    }

    pub fn parent(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read_guard()?.parent(name)?.map(str::to_string))
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.read_guard()?.to_snapshot())
    }
}

impl From<CascadingConfigResolver> for SharedResolver {
    fn from(resolver: CascadingConfigResolver) -> Self {
        Self::new(resolver)
    }
}
