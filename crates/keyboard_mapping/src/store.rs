//! The live key mapping shared by gameplay dispatch and every menu screen.
//!
//! The store owns the live mapping and an immutable copy of the default
//! mapping. Every mutation happens under a single mutex, so readers never
//! observe a half-applied `set`, `unset` or `reset_to_default` even when the
//! host polls the store from other threads.

use crate::action::ActionId;
use crate::error::MappingRepair;
use crate::key_code::KeyCode;
use crate::mapping::KeyMapping;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// An opaque identifier of the live mapping's revision.
/// Changes whenever the live mapping changes.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct MappingVersion(u64);

/// Inner state of the [`MappingStore`], protected by a mutex.
struct StoreInner {
    live: KeyMapping,
    dirty: bool,
    version: MappingVersion,
}

impl StoreInner {
    fn replace(&mut self, mapping: KeyMapping, dirty: bool) {
        if self.live != mapping {
            self.live = mapping;
            self.version.0 += 1;
            self.dirty |= dirty;
        }
    }
}

/// Owner of the live key mapping.
pub struct MappingStore {
    default_mapping: KeyMapping,
    inner: Mutex<StoreInner>,
}

impl MappingStore {
    /// Create a store whose live mapping starts as a copy of the defaults.
    ///
    /// The escape fallback is applied to the defaults first.
    pub fn new(mut default_mapping: KeyMapping) -> Self {
        if default_mapping.ensure_escape() {
            debug!("default mapping has no escape binding, assigned fallback");
        }

        Self {
            inner: Mutex::new(StoreInner {
                live: default_mapping.clone(),
                dirty: false,
                version: MappingVersion::default(),
            }),
            default_mapping,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: KeyCode) -> Option<ActionId> {
        self.lock().live.get(key).cloned()
    }

    /// Bind `key` to `action`, overwriting any previous binding.
    ///
    /// The action is not checked against the catalog.
    pub fn set(&self, key: KeyCode, action: impl Into<ActionId>) {
        let action = action.into();
        let mut inner = self.lock();
        let previous = inner.live.insert(key, action.clone());
        if previous.as_ref() != Some(&action) {
            inner.version.0 += 1;
            inner.dirty = true;
        }
        debug!(key_code = key.get(), %action, previous = ?previous, "key bound");
    }

    /// Remove the binding of `key`, returning the action it had.
    pub fn unset(&self, key: KeyCode) -> Option<ActionId> {
        let mut inner = self.lock();
        let previous = inner.live.remove(key);
        if previous.is_some() {
            inner.version.0 += 1;
            inner.dirty = true;
            debug!(key_code = key.get(), previous = ?previous, "key unbound");
        }
        previous
    }

    /// Replace the whole live mapping with a copy of the defaults.
    pub fn reset_to_default(&self) {
        let defaults = self.default_mapping.clone();
        self.lock().replace(defaults, true);
        info!(bindings = self.default_mapping.len(), "keyboard mapping reset to defaults");
    }

    /// Copy of the live mapping for the persistence layer.
    pub fn snapshot_for_persistence(&self) -> KeyMapping {
        self.lock().live.clone()
    }

    /// Replace the live mapping with persisted data.
    ///
    /// Re-applies the escape fallback if the data lacks it. A repaired mapping
    /// is marked dirty so the repair is written back on the next save.
    pub fn restore_from_persistence(&self, mut mapping: KeyMapping) -> Vec<MappingRepair> {
        let mut repairs = Vec::new();
        if mapping.ensure_escape() {
            repairs.push(MappingRepair::MissingEscape);
        }
        for repair in &repairs {
            warn!(%repair, "repaired persisted keyboard mapping");
        }

        let repaired = !repairs.is_empty();
        let mut inner = self.lock();
        inner.replace(mapping, false);
        inner.dirty |= repaired;
        repairs
    }

    /// Like [`restore_from_persistence`](Self::restore_from_persistence), but
    /// starting from raw JSON that may be corrupt.
    ///
    /// Data that is not a JSON object at all leaves the live mapping untouched.
    pub fn restore_from_persisted_value(&self, value: &Value) -> Vec<MappingRepair> {
        let (mapping, mut repairs) = KeyMapping::from_value_lossy(value);
        for repair in &repairs {
            warn!(%repair, "repaired persisted keyboard mapping");
        }
        if repairs.contains(&MappingRepair::NotAnObject) {
            warn!("persisted keyboard mapping unusable, keeping the current mapping");
            return repairs;
        }

        let parse_repaired = !repairs.is_empty();
        repairs.extend(self.restore_from_persistence(mapping));
        if parse_repaired {
            self.lock().dirty = true;
        }
        repairs
    }

    /// The immutable restore target.
    pub fn default_mapping(&self) -> &KeyMapping {
        &self.default_mapping
    }

    /// `true` when the live mapping changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn mark_saved(&self) {
        self.lock().dirty = false;
    }

    pub fn version(&self) -> MappingVersion {
        self.lock().version
    }

    /// Execute a function with read access to the live mapping.
    pub fn with_mapping<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&KeyMapping) -> R,
    {
        let inner = self.lock();
        f(&inner.live)
    }
}
