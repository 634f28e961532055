//! Static configuration supplied at startup.
//!
//! Defaults are authored in code (the stock action list and bindings); games
//! ship their own JSON to replace any section. The engine treats the result
//! as immutable once built.

use crate::action::{ActionDescriptor, ActionId};
use crate::key_code::KeyCode;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A default binding entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingEntry {
    pub key_code: KeyCode,
    pub action: ActionId,
}

/// A custom display name for one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNameEntry {
    pub key_code: KeyCode,
    pub name: String,
}

/// Startup configuration of the mapping engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Assignable actions, in menu order.
    pub actions: Vec<ActionDescriptor>,
    /// Factory bindings. May reference actions outside `actions`; a later
    /// entry for the same key replaces an earlier one.
    pub default_mapping: Vec<BindingEntry>,
    /// Keys the capture session refuses to rebind.
    pub safeguard_key_codes: Vec<KeyCode>,
    /// Keys whose native default action is always cancelled.
    pub suppress_key_codes: Vec<KeyCode>,
    /// Overrides for the English key names.
    pub key_names: Vec<KeyNameEntry>,
}

impl MappingConfig {
    /// Configuration with nothing in it; the builder adds to it.
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            default_mapping: Vec::new(),
            safeguard_key_codes: Vec::new(),
            suppress_key_codes: Vec::new(),
            key_names: Vec::new(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse keyboard mapping config JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyboard mapping config {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        let actions = [
            ("ok", "Action/Confirm"),
            ("escape", "Cancel/Menu"),
            ("up", "Move Up"),
            ("down", "Move Down"),
            ("right", "Move Right"),
            ("left", "Move Left"),
            ("shift", "Dash"),
            ("control", "Control"),
            ("pageup", "Page Up"),
            ("pagedown", "Page Down"),
            ("tab", "Tab"),
            ("_fullscreen", "Toggle Fullscreen"),
            ("_stretch", "Toggle Stretch Mode"),
            ("_fps", "Toggle FPS Display"),
        ]
        .into_iter()
        .map(|(code, name)| ActionDescriptor::new(code, name))
        .collect();

        let default_mapping = [
            (9, "tab"),
            (13, "ok"),
            (16, "shift"),
            (17, "control"),
            (18, "control"),
            (27, "escape"),
            (32, "ok"),
            (33, "pageup"),
            (34, "pagedown"),
            (37, "left"),
            (38, "up"),
            (39, "right"),
            (40, "down"),
            (45, "escape"),
            (81, "pageup"),
            (87, "pagedown"),
            (88, "escape"),
            (90, "ok"),
            (96, "escape"),
            (98, "down"),
            (100, "left"),
            (102, "right"),
            (104, "up"),
            (113, "_fps"),
            (114, "_stretch"),
            (115, "_fullscreen"),
            (120, "debug"),
        ]
        .into_iter()
        .map(|(code, action)| BindingEntry {
            key_code: KeyCode(code),
            action: ActionId::from(action),
        })
        .collect();

        Self {
            actions,
            default_mapping,
            // Enter and the arrow keys keep menus navigable.
            safeguard_key_codes: [13, 37, 38, 39, 40].map(KeyCode).to_vec(),
            // F1 help, F5 reload, F11 browser fullscreen, F12 devtools.
            suppress_key_codes: [112, 116, 122, 123].map(KeyCode).to_vec(),
            key_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_defaults() {
        let config = MappingConfig::default();
        assert_eq!(config.actions.len(), 14);
        assert_eq!(config.default_mapping.len(), 27);
        assert!(config.safeguard_key_codes.contains(&KeyCode::ENTER));
        assert!(config.suppress_key_codes.contains(&KeyCode(116)));
        assert!(
            config
                .default_mapping
                .iter()
                .any(|entry| entry.key_code == KeyCode(120) && entry.action == "debug")
        );
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = MappingConfig::from_json_str(
            r#"{ "safeguard_key_codes": [13], "key_names": [{ "key_code": 90, "name": "Y" }] }"#,
        )
        .unwrap();

        assert_eq!(config.safeguard_key_codes, vec![KeyCode(13)]);
        assert_eq!(config.key_names[0].name, "Y");
        assert_eq!(config.actions, MappingConfig::default().actions);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = MappingConfig::from_json_str("{ \"actions\": 5 }").unwrap_err();
        assert!(err.to_string().contains("keyboard mapping config"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mapping.json");
        let config = MappingConfig::default();
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(MappingConfig::load(&path).unwrap(), config);
        assert!(MappingConfig::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn load_errors_keep_their_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = MappingConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(missing.to_string().starts_with("Failed to read keyboard mapping config"));
        assert!(missing.root_cause().is::<std::io::Error>());

        let malformed = MappingConfig::from_json_str("{").unwrap_err();
        assert!(malformed.root_cause().is::<serde_json::Error>());
    }
}
