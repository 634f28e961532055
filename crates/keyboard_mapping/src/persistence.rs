//! Loading and saving the live mapping.
//!
//! The engine only ever hands out a [`KeyMapping`] snapshot and takes raw JSON
//! back; where the data lives is up to the [`PersistenceBridge`]. The bundled
//! [`JsonFilePersistence`] writes a small versioned envelope next to the
//! game's other settings files.

use crate::error::MappingRepair;
use crate::mapping::KeyMapping;
use crate::store::MappingStore;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Storage backend for the persisted mapping.
pub trait PersistenceBridge {
    /// `Ok(None)` when nothing was persisted yet.
    fn load(&self) -> Result<Option<Value>>;

    fn save(&self, mapping: &KeyMapping) -> Result<()>;
}

/// Root structure of the mapping file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingFile {
    /// Schema version for migrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Raw so that corrupt entries are repaired instead of failing the parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
}

/// Persistence to a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceBridge for JsonFilePersistence {
    fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted keyboard mapping");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read keyboard mapping file {}", self.path.display()))?;

        let file: MappingFile =
            serde_json::from_str(&content).context("Failed to parse keyboard mapping JSON")?;
        if file.mapping.is_none() {
            warn!(path = %self.path.display(), "keyboard mapping file has no mapping, ignoring it");
        }
        Ok(file.mapping)
    }

    fn save(&self, mapping: &KeyMapping) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = MappingFile {
            schema_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            mapping: Some(serde_json::to_value(mapping)?),
        };

        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write keyboard mapping file {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory persistence for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    value: Mutex<Option<Value>>,
    saves: Mutex<usize>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw persisted data.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            saves: Mutex::new(0),
        }
    }

    pub fn value(&self) -> Option<Value> {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        *self
            .saves
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PersistenceBridge for MemoryPersistence {
    fn load(&self) -> Result<Option<Value>> {
        Ok(self.value())
    }

    fn save(&self, mapping: &KeyMapping) -> Result<()> {
        let value = serde_json::to_value(mapping)?;
        *self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(value);
        *self
            .saves
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Restore the store from the bridge. A missing file leaves the defaults live.
pub fn load_into<P>(store: &MappingStore, bridge: &P) -> Result<Vec<MappingRepair>>
where
    P: PersistenceBridge + ?Sized,
{
    match bridge.load()? {
        Some(value) => {
            let repairs = store.restore_from_persisted_value(&value);
            info!(repairs = repairs.len(), "keyboard mapping loaded");
            Ok(repairs)
        }
        None => Ok(Vec::new()),
    }
}

/// Save the store if it changed since the last save; `true` when written.
pub fn save_if_dirty<P>(store: &MappingStore, bridge: &P) -> Result<bool>
where
    P: PersistenceBridge + ?Sized,
{
    if !store.is_dirty() {
        return Ok(false);
    }
    let snapshot = store.snapshot_for_persistence();
    bridge.save(&snapshot)?;
    store.mark_saved();
    debug!(bindings = snapshot.len(), "keyboard mapping saved");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionId;
    use crate::key_code::KeyCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> MappingStore {
        let defaults: KeyMapping = [
            (KeyCode(13), ActionId::from("ok")),
            (KeyCode(27), ActionId::from("escape")),
        ]
        .into_iter()
        .collect();
        MappingStore::new(defaults)
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let bridge = JsonFilePersistence::new(dir.path().join("keyboard.json"));

        assert!(bridge.load().unwrap().is_none());
        let store = store();
        assert!(load_into(&store, &bridge).unwrap().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn file_round_trip_with_envelope() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings").join("keyboard.json");
        let bridge = JsonFilePersistence::new(&path);

        let store = store();
        store.set(KeyCode(65), "shift");
        assert!(save_if_dirty(&store, &bridge).unwrap());
        assert!(!save_if_dirty(&store, &bridge).unwrap());

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["schema_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(raw["mapping"]["65"], "shift");

        let fresh = self::store();
        assert!(load_into(&fresh, &bridge).unwrap().is_empty());
        assert_eq!(fresh.snapshot_for_persistence(), store.snapshot_for_persistence());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyboard.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFilePersistence::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("keyboard mapping JSON"));
    }

    #[test]
    fn envelope_without_mapping_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyboard.json");
        fs::write(&path, r#"{ "schema_version": "0.1.0" }"#).unwrap();
        let bridge = JsonFilePersistence::new(&path);

        assert!(bridge.load().unwrap().is_none());
        let store = store();
        let defaults = store.snapshot_for_persistence();
        assert!(load_into(&store, &bridge).unwrap().is_empty());
        assert_eq!(store.snapshot_for_persistence(), defaults);
        assert!(!save_if_dirty(&store, &bridge).unwrap());
    }

    #[test]
    fn non_object_mapping_is_reported_but_not_applied() {
        for value in [json!(null), json!([["13", "ok"]])] {
            let bridge = MemoryPersistence::with_value(value);
            let store = store();
            let defaults = store.snapshot_for_persistence();

            let repairs = load_into(&store, &bridge).unwrap();
            assert_eq!(repairs, vec![MappingRepair::NotAnObject]);
            assert_eq!(store.snapshot_for_persistence(), defaults);
            assert!(!save_if_dirty(&store, &bridge).unwrap());
            assert_eq!(bridge.saves(), 0);
        }
    }

    #[test]
    fn corrupt_entries_are_repaired_and_rewritten() {
        let bridge = MemoryPersistence::with_value(json!({ "13": "ok", "x": "left" }));
        let store = store();

        let repairs = load_into(&store, &bridge).unwrap();
        assert_eq!(repairs.len(), 2);
        assert!(store.is_dirty());

        assert!(save_if_dirty(&store, &bridge).unwrap());
        assert_eq!(bridge.value(), Some(json!({ "13": "ok", "27": "escape" })));
        assert_eq!(bridge.saves(), 1);
    }
}
