//! The key code -> action code mapping value.

use crate::action::{ActionId, ESCAPE_ACTION};
use crate::error::MappingRepair;
use crate::key_code::KeyCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// A function from key code to action code.
///
/// Serializes as a JSON object keyed by the decimal key code, which is the
/// shape persisted in the settings file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMapping {
    bindings: BTreeMap<KeyCode, ActionId>,
}

impl KeyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: KeyCode) -> Option<&ActionId> {
        self.bindings.get(&key)
    }

    /// Bind `key`, returning the action it was bound to before.
    pub fn insert(&mut self, key: KeyCode, action: impl Into<ActionId>) -> Option<ActionId> {
        self.bindings.insert(key, action.into())
    }

    pub fn remove(&mut self, key: KeyCode) -> Option<ActionId> {
        self.bindings.remove(&key)
    }

    pub fn contains_key(&self, key: KeyCode) -> bool {
        self.bindings.contains_key(&key)
    }

    /// Iterate bindings in ascending key code order.
    pub fn iter(&self) -> btree_map::Iter<'_, KeyCode, ActionId> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind the escape key to [`ESCAPE_ACTION`] if it is unbound.
    ///
    /// Returns `true` when the fallback had to be applied.
    pub fn ensure_escape(&mut self) -> bool {
        if self.bindings.contains_key(&KeyCode::ESCAPE) {
            return false;
        }
        self.bindings
            .insert(KeyCode::ESCAPE, ActionId::from(ESCAPE_ACTION));
        true
    }

    /// Parse persisted data without failing on bad entries.
    ///
    /// Entries whose key is not a decimal integer or whose value is not a
    /// string are dropped. Keys like `"013"`, `"+13"` or `" 13"` are accepted
    /// but reported as [`MappingRepair::NonCanonicalKeyCode`]; when two keys
    /// parse to the same code the first one in iteration order wins. The
    /// escape fallback is not applied here.
    pub fn from_value_lossy(value: &Value) -> (Self, Vec<MappingRepair>) {
        let mut mapping = Self::new();
        let mut repairs = Vec::new();

        let Some(object) = value.as_object() else {
            repairs.push(MappingRepair::NotAnObject);
            return (mapping, repairs);
        };

        for (raw_key, raw_action) in object {
            let Ok(code) = raw_key.trim().parse::<u32>() else {
                repairs.push(MappingRepair::InvalidKeyCode(raw_key.clone()));
                continue;
            };
            let key = KeyCode(code);
            if *raw_key != code.to_string() {
                repairs.push(MappingRepair::NonCanonicalKeyCode(raw_key.clone()));
            }

            let Some(action) = raw_action.as_str() else {
                repairs.push(MappingRepair::InvalidAction(key));
                continue;
            };

            if mapping.contains_key(key) {
                repairs.push(MappingRepair::DuplicateKeyCode(key));
                continue;
            }
            mapping.insert(key, action);
        }

        (mapping, repairs)
    }
}

impl FromIterator<(KeyCode, ActionId)> for KeyMapping {
    fn from_iter<T: IntoIterator<Item = (KeyCode, ActionId)>>(iter: T) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a KeyMapping {
    type Item = (&'a KeyCode, &'a ActionId);
    type IntoIter = btree_map::Iter<'a, KeyCode, ActionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}
