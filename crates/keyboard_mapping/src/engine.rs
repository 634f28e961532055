//! The engine handle tying configuration, store and capture gate together.

use crate::action::{ActionCatalog, ActionDescriptor, ActionId};
use crate::config::{BindingEntry, KeyNameEntry, MappingConfig};
use crate::key_code::{KeyCatalog, KeyCode};
use crate::mapping::KeyMapping;
use crate::resolver::ActionResolver;
use crate::store::MappingStore;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where the process-wide capture currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    /// No capture session exists.
    Idle,
    /// A session holds the exclusive key listener.
    AwaitingKey,
    /// A session captured its key and waits for the user's choice.
    ChoosingAction,
}

impl CapturePhase {
    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::AwaitingKey => 1,
            Self::ChoosingAction => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::AwaitingKey,
            2 => Self::ChoosingAction,
            _ => Self::Idle,
        }
    }
}

/// The single flag enforcing "at most one capture session".
#[derive(Debug, Default)]
pub(crate) struct CaptureGate {
    phase: AtomicU8,
}

impl CaptureGate {
    /// Move from `Idle` to `AwaitingKey`; `false` if a session is active.
    pub(crate) fn try_acquire(&self) -> bool {
        self.phase
            .compare_exchange(
                CapturePhase::Idle.to_u8(),
                CapturePhase::AwaitingKey.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn set(&self, phase: CapturePhase) {
        self.phase.store(phase.to_u8(), Ordering::Release);
    }

    pub(crate) fn release(&self) {
        self.set(CapturePhase::Idle);
    }

    pub(crate) fn phase(&self) -> CapturePhase {
        CapturePhase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

/// Immutable rules derived from the configuration.
#[derive(Debug)]
pub(crate) struct MappingRules {
    pub(crate) actions: ActionCatalog,
    pub(crate) keys: KeyCatalog,
    pub(crate) safeguard: BTreeSet<KeyCode>,
    pub(crate) suppress: BTreeSet<KeyCode>,
}

/// Handle to the keyboard mapping engine.
///
/// Cheap to clone; clones share the same store and capture gate, so there is
/// one engine per process (or per player profile) and every screen and the
/// input hook hold a clone of it.
#[derive(Clone)]
pub struct KeyboardMapping {
    pub(crate) rules: Arc<MappingRules>,
    pub(crate) store: Arc<MappingStore>,
    pub(crate) gate: Arc<CaptureGate>,
}

impl KeyboardMapping {
    /// Create a new builder starting from an empty configuration.
    pub fn builder() -> KeyboardMappingBuilder {
        KeyboardMappingBuilder::new()
    }

    pub fn from_config(config: MappingConfig) -> Self {
        KeyboardMappingBuilder::new().with_config(config).build()
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// The assignable actions in menu order.
    pub fn actions(&self) -> &ActionCatalog {
        &self.rules.actions
    }

    pub fn keys(&self) -> &KeyCatalog {
        &self.rules.keys
    }

    pub fn is_safeguarded(&self, key: KeyCode) -> bool {
        self.rules.safeguard.contains(&key)
    }

    pub fn is_suppressed(&self, key: KeyCode) -> bool {
        self.rules.suppress.contains(&key)
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.gate.phase()
    }

    pub fn resolver(&self) -> ActionResolver<'_> {
        ActionResolver::new(&self.store, &self.rules.actions)
    }
}

impl Default for KeyboardMapping {
    fn default() -> Self {
        Self::from_config(MappingConfig::default())
    }
}

impl std::fmt::Debug for KeyboardMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardMapping")
            .field("actions", &self.rules.actions.len())
            .field("safeguard", &self.rules.safeguard)
            .field("suppress", &self.rules.suppress)
            .field("capture_phase", &self.gate.phase())
            .finish()
    }
}

/// Builder for creating a [`KeyboardMapping`].
pub struct KeyboardMappingBuilder {
    config: MappingConfig,
}

impl KeyboardMappingBuilder {
    pub fn new() -> Self {
        Self {
            config: MappingConfig::empty(),
        }
    }

    /// Replace the configuration entirely.
    pub fn with_config(mut self, config: MappingConfig) -> Self {
        self.config = config;
        self
    }

    /// Append an assignable action.
    pub fn add_action(mut self, code: impl Into<ActionId>, name: impl Into<String>) -> Self {
        self.config.actions.push(ActionDescriptor::new(code, name));
        self
    }

    /// Append a default binding; replaces earlier defaults for the same key.
    pub fn add_default_binding(mut self, key: impl Into<KeyCode>, action: impl Into<ActionId>) -> Self {
        self.config.default_mapping.push(BindingEntry {
            key_code: key.into(),
            action: action.into(),
        });
        self
    }

    pub fn safeguard(mut self, key: impl Into<KeyCode>) -> Self {
        self.config.safeguard_key_codes.push(key.into());
        self
    }

    pub fn suppress(mut self, key: impl Into<KeyCode>) -> Self {
        self.config.suppress_key_codes.push(key.into());
        self
    }

    pub fn with_key_name(mut self, key: impl Into<KeyCode>, name: impl Into<String>) -> Self {
        self.config.key_names.push(KeyNameEntry {
            key_code: key.into(),
            name: name.into(),
        });
        self
    }

    /// Build the engine. The default mapping gets the escape fallback.
    pub fn build(self) -> KeyboardMapping {
        let MappingConfig {
            actions,
            default_mapping,
            safeguard_key_codes,
            suppress_key_codes,
            key_names,
        } = self.config;

        let mut keys = KeyCatalog::english();
        for entry in key_names {
            keys.set_name(entry.key_code, entry.name);
        }

        let defaults: KeyMapping = default_mapping
            .into_iter()
            .map(|entry| (entry.key_code, entry.action))
            .collect();

        let rules = MappingRules {
            actions: actions.into_iter().collect(),
            keys,
            safeguard: safeguard_key_codes.into_iter().collect(),
            suppress: suppress_key_codes.into_iter().collect(),
        };

        tracing::debug!(
            actions = rules.actions.len(),
            defaults = defaults.len(),
            safeguarded = rules.safeguard.len(),
            suppressed = rules.suppress.len(),
            "keyboard mapping engine built"
        );

        KeyboardMapping {
            rules: Arc::new(rules),
            store: Arc::new(MappingStore::new(defaults)),
            gate: Arc::new(CaptureGate::default()),
        }
    }
}

impl Default for KeyboardMappingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_configuration() {
        let engine = KeyboardMapping::builder()
            .add_action("ok", "Confirm")
            .add_action("left", "Move Left")
            .add_default_binding(13u32, "ok")
            .add_default_binding(37u32, "left")
            .safeguard(37u32)
            .suppress(116u32)
            .with_key_name(37u32, "Links")
            .build();

        assert_eq!(engine.actions().len(), 2);
        assert!(engine.is_safeguarded(KeyCode(37)));
        assert!(engine.is_suppressed(KeyCode(116)));
        assert_eq!(engine.keys().display_name(KeyCode(37)), "Links");
        assert_eq!(engine.store().get(KeyCode(13)), Some(ActionId::from("ok")));
        assert_eq!(engine.store().get(KeyCode::ESCAPE), Some(ActionId::from("escape")));
    }

    #[test]
    fn later_default_binding_wins() {
        let engine = KeyboardMapping::builder()
            .add_default_binding(90u32, "ok")
            .add_default_binding(90u32, "escape")
            .build();

        assert_eq!(engine.store().get(KeyCode(90)), Some(ActionId::from("escape")));
    }

    #[test]
    fn stock_engine() {
        let engine = KeyboardMapping::default();
        assert_eq!(engine.actions().len(), 14);
        assert_eq!(engine.store().get(KeyCode(120)), Some(ActionId::from("debug")));
        assert_eq!(engine.capture_phase(), CapturePhase::Idle);
    }

    #[test]
    fn gate_admits_one_holder() {
        let gate = CaptureGate::default();
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        gate.set(CapturePhase::ChoosingAction);
        assert!(!gate.try_acquire());
        gate.release();
        assert!(gate.try_acquire());
    }

    #[test]
    fn clones_share_state() {
        let engine = KeyboardMapping::default();
        let other = engine.clone();
        engine.store().set(KeyCode(65), "ok");
        assert_eq!(other.store().get(KeyCode(65)), Some(ActionId::from("ok")));
    }
}
