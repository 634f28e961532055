//! Bevy integration for the keyboard mapping engine.
//!
//! This module provides:
//! - bevy `KeyCode` -> legacy key code conversion
//! - the interceptor system feeding `KeyboardInput` through the engine
//! - resources for the engine handle, the active capture and persistence
//! - [`BevyHost`], the host side for menu systems committing a binding
//! - auto-save of the dirty mapping
//!
//! # Usage
//!
//! ```ignore
//! use bevy::prelude::*;
//! use keyboard_mapping::bevy::{GameplayKeyMessage, HostToggleMessage, KeyboardMappingPlugin};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(KeyboardMappingPlugin::default().with_save_path("settings/keyboard.json"))
//!         .add_systems(Update, (handle_gameplay_keys, handle_toggles))
//!         .run();
//! }
//!
//! fn handle_gameplay_keys(mut keys: MessageReader<GameplayKeyMessage>) {
//!     for key in keys.read() {
//!         if key.action == "ok" {
//!             // confirm
//!         }
//!     }
//! }
//!
//! fn handle_toggles(mut toggles: MessageReader<HostToggleMessage>) {
//!     for toggle in toggles.read() {
//!         // switch window mode, fps overlay, ...
//!     }
//! }
//! ```

use crate::action::{ActionId, ToggleAction};
use crate::capture::CaptureSession;
use crate::config::MappingConfig;
use crate::engine::KeyboardMapping;
use crate::error::MappingError;
use crate::host::{HostBridge, KeyDispatch, KeyDownEvent};
use crate::key_code::KeyCode;
use crate::persistence::{load_into, save_if_dirty, JsonFilePersistence, PersistenceBridge};
use crate::workflow::Workflow;
use bevy::ecs::system::SystemParam;
use bevy::input::keyboard::{KeyCode as BevyKeyCode, KeyboardInput};
use bevy::input::{ButtonState, InputSystems};
use bevy::prelude::*;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// A host toggle requested by a key press.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostToggleMessage(pub ToggleAction);

/// A key press that resolved to a gameplay action.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct GameplayKeyMessage {
    pub key_code: KeyCode,
    pub action: ActionId,
}

/// Resource wrapper for the engine handle.
#[derive(Resource, Clone)]
pub struct KeyboardMappingResource(pub KeyboardMapping);

impl std::ops::Deref for KeyboardMappingResource {
    type Target = KeyboardMapping;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The capture session the binding menu is driving, if any.
///
/// A finished session stays here so the menu can show its outcome; the next
/// [`begin`](ActiveCapture::begin) replaces it.
#[derive(Resource, Default, Debug)]
pub struct ActiveCapture(pub Option<CaptureSession>);

impl ActiveCapture {
    pub fn begin(&mut self, engine: &KeyboardMapping) -> Result<&mut CaptureSession, MappingError> {
        if self.0.as_ref().is_some_and(CaptureSession::is_finished) {
            self.0 = None;
        }
        let session = engine.start_capture()?;
        Ok(self.0.insert(session))
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.0.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CaptureSession> {
        self.0.as_mut()
    }

    pub fn take(&mut self) -> Option<CaptureSession> {
        self.0.take()
    }
}

/// Where the mapping is loaded from and saved to.
#[derive(Resource)]
pub struct MappingPersistence(pub Box<dyn PersistenceBridge + Send + Sync>);

impl MappingPersistence {
    pub fn new<P>(bridge: P) -> Self
    where
        P: PersistenceBridge + Send + Sync + 'static,
    {
        Self(Box::new(bridge))
    }
}

/// Bevy plugin for keyboard mapping integration.
pub struct KeyboardMappingPlugin {
    engine: KeyboardMapping,
    save_path: Option<PathBuf>,
}

impl Default for KeyboardMappingPlugin {
    fn default() -> Self {
        Self::new(KeyboardMapping::default())
    }
}

impl KeyboardMappingPlugin {
    /// Use an existing engine; clones share its store.
    pub fn new(engine: KeyboardMapping) -> Self {
        Self {
            engine,
            save_path: None,
        }
    }

    pub fn from_config(config: MappingConfig) -> Self {
        Self::new(KeyboardMapping::from_config(config))
    }

    /// Persist to a JSON file at `path`.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }
}

impl Plugin for KeyboardMappingPlugin {
    fn build(&self, app: &mut App) {
        if let Some(path) = &self.save_path {
            app.insert_resource(MappingPersistence::new(JsonFilePersistence::new(path.clone())));
        }

        app.insert_resource(KeyboardMappingResource(self.engine.clone()))
            .init_resource::<ActiveCapture>()
            .add_message::<KeyboardInput>()
            .add_message::<HostToggleMessage>()
            .add_message::<GameplayKeyMessage>()
            .add_systems(Startup, load_keyboard_mapping)
            .add_systems(PreUpdate, intercept_key_downs.after(InputSystems))
            .add_systems(
                PostUpdate,
                save_keyboard_mapping_on_change.run_if(resource_exists::<MappingPersistence>),
            );
    }

    fn name(&self) -> &str {
        "KeyboardMappingPlugin"
    }
}

/// Convert bevy's physical key to the legacy key code numbering.
pub fn legacy_key_code(key_code: BevyKeyCode) -> Option<KeyCode> {
    let code = match key_code {
        BevyKeyCode::Backspace => 8,
        BevyKeyCode::Tab => 9,
        BevyKeyCode::Enter | BevyKeyCode::NumpadEnter => 13,
        BevyKeyCode::ShiftLeft | BevyKeyCode::ShiftRight => 16,
        BevyKeyCode::ControlLeft | BevyKeyCode::ControlRight => 17,
        BevyKeyCode::AltLeft | BevyKeyCode::AltRight => 18,
        BevyKeyCode::Pause => 19,
        BevyKeyCode::CapsLock => 20,
        BevyKeyCode::Escape => 27,
        BevyKeyCode::Space => 32,
        BevyKeyCode::PageUp => 33,
        BevyKeyCode::PageDown => 34,
        BevyKeyCode::End => 35,
        BevyKeyCode::Home => 36,
        BevyKeyCode::ArrowLeft => 37,
        BevyKeyCode::ArrowUp => 38,
        BevyKeyCode::ArrowRight => 39,
        BevyKeyCode::ArrowDown => 40,
        BevyKeyCode::PrintScreen => 44,
        BevyKeyCode::Insert => 45,
        BevyKeyCode::Delete => 46,

        // Digits
        BevyKeyCode::Digit0 => 48,
        BevyKeyCode::Digit1 => 49,
        BevyKeyCode::Digit2 => 50,
        BevyKeyCode::Digit3 => 51,
        BevyKeyCode::Digit4 => 52,
        BevyKeyCode::Digit5 => 53,
        BevyKeyCode::Digit6 => 54,
        BevyKeyCode::Digit7 => 55,
        BevyKeyCode::Digit8 => 56,
        BevyKeyCode::Digit9 => 57,

        // Letters
        BevyKeyCode::KeyA => 65,
        BevyKeyCode::KeyB => 66,
        BevyKeyCode::KeyC => 67,
        BevyKeyCode::KeyD => 68,
        BevyKeyCode::KeyE => 69,
        BevyKeyCode::KeyF => 70,
        BevyKeyCode::KeyG => 71,
        BevyKeyCode::KeyH => 72,
        BevyKeyCode::KeyI => 73,
        BevyKeyCode::KeyJ => 74,
        BevyKeyCode::KeyK => 75,
        BevyKeyCode::KeyL => 76,
        BevyKeyCode::KeyM => 77,
        BevyKeyCode::KeyN => 78,
        BevyKeyCode::KeyO => 79,
        BevyKeyCode::KeyP => 80,
        BevyKeyCode::KeyQ => 81,
        BevyKeyCode::KeyR => 82,
        BevyKeyCode::KeyS => 83,
        BevyKeyCode::KeyT => 84,
        BevyKeyCode::KeyU => 85,
        BevyKeyCode::KeyV => 86,
        BevyKeyCode::KeyW => 87,
        BevyKeyCode::KeyX => 88,
        BevyKeyCode::KeyY => 89,
        BevyKeyCode::KeyZ => 90,

        BevyKeyCode::SuperLeft => 91,
        BevyKeyCode::SuperRight => 92,
        BevyKeyCode::ContextMenu => 93,

        // Numpad
        BevyKeyCode::Numpad0 => 96,
        BevyKeyCode::Numpad1 => 97,
        BevyKeyCode::Numpad2 => 98,
        BevyKeyCode::Numpad3 => 99,
        BevyKeyCode::Numpad4 => 100,
        BevyKeyCode::Numpad5 => 101,
        BevyKeyCode::Numpad6 => 102,
        BevyKeyCode::Numpad7 => 103,
        BevyKeyCode::Numpad8 => 104,
        BevyKeyCode::Numpad9 => 105,
        BevyKeyCode::NumpadMultiply => 106,
        BevyKeyCode::NumpadAdd => 107,
        BevyKeyCode::NumpadSubtract => 109,
        BevyKeyCode::NumpadDecimal => 110,
        BevyKeyCode::NumpadDivide => 111,

        // Function keys
        BevyKeyCode::F1 => 112,
        BevyKeyCode::F2 => 113,
        BevyKeyCode::F3 => 114,
        BevyKeyCode::F4 => 115,
        BevyKeyCode::F5 => 116,
        BevyKeyCode::F6 => 117,
        BevyKeyCode::F7 => 118,
        BevyKeyCode::F8 => 119,
        BevyKeyCode::F9 => 120,
        BevyKeyCode::F10 => 121,
        BevyKeyCode::F11 => 122,
        BevyKeyCode::F12 => 123,
        BevyKeyCode::F13 => 124,
        BevyKeyCode::F14 => 125,
        BevyKeyCode::F15 => 126,
        BevyKeyCode::F16 => 127,
        BevyKeyCode::F17 => 128,
        BevyKeyCode::F18 => 129,
        BevyKeyCode::F19 => 130,
        BevyKeyCode::F20 => 131,
        BevyKeyCode::F21 => 132,
        BevyKeyCode::F22 => 133,
        BevyKeyCode::F23 => 134,
        BevyKeyCode::F24 => 135,

        BevyKeyCode::NumLock => 144,
        BevyKeyCode::ScrollLock => 145,

        // Punctuation (US layout positions)
        BevyKeyCode::Semicolon => 186,
        BevyKeyCode::Equal => 187,
        BevyKeyCode::Comma => 188,
        BevyKeyCode::Minus => 189,
        BevyKeyCode::Period => 190,
        BevyKeyCode::Slash => 191,
        BevyKeyCode::Backquote => 192,
        BevyKeyCode::BracketLeft => 219,
        BevyKeyCode::Backslash => 220,
        BevyKeyCode::BracketRight => 221,
        BevyKeyCode::Quote => 222,
        BevyKeyCode::IntlBackslash => 226,

        _ => return None,
    };
    Some(KeyCode(code))
}

/// [`HostBridge`] for systems that drive a capture or restore.
///
/// Toggles become [`HostToggleMessage`]s; clearing pending input resets
/// `ButtonInput<KeyCode>` so the committing key does not reach gameplay.
///
/// ```ignore
/// fn bind_selected(mut capture: ResMut<ActiveCapture>, mut host: BevyHost) {
///     if let Some(session) = capture.session_mut() {
///         let _ = session.choose(0, &mut host);
///     }
/// }
/// ```
#[derive(SystemParam)]
pub struct BevyHost<'w> {
    toggles: MessageWriter<'w, HostToggleMessage>,
    input: Option<ResMut<'w, ButtonInput<BevyKeyCode>>>,
}

impl HostBridge for BevyHost<'_> {
    fn toggle(&mut self, toggle: ToggleAction) {
        self.toggles.write(HostToggleMessage(toggle));
    }

    fn clear_pending_input(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.reset_all();
        }
    }
}

fn load_keyboard_mapping(
    engine: Res<KeyboardMappingResource>,
    persistence: Option<Res<MappingPersistence>>,
) {
    let Some(persistence) = persistence else {
        return;
    };
    match load_into(engine.store(), persistence.0.as_ref()) {
        Ok(repairs) if !repairs.is_empty() => {
            warn!(repairs = repairs.len(), "persisted keyboard mapping needed repairs");
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to load keyboard mapping: {e:#}"),
    }
}

/// Feed key presses through the engine and forward the results as messages.
fn intercept_key_downs(
    mut keyboard: MessageReader<KeyboardInput>,
    engine: Res<KeyboardMappingResource>,
    mut capture: ResMut<ActiveCapture>,
    mut gameplay: MessageWriter<GameplayKeyMessage>,
    mut host: BevyHost,
) {
    for event in keyboard.read() {
        if event.state != ButtonState::Pressed || event.repeat {
            continue;
        }
        let Some(key_code) = legacy_key_code(event.key_code) else {
            debug!(key = ?event.key_code, "key has no legacy key code");
            continue;
        };

        let mut key_down = KeyDownEvent::new(key_code);
        let dispatch = engine.on_key_down(&mut key_down, &mut host, capture.session_mut());
        if let KeyDispatch::Action(action) = dispatch {
            gameplay.write(GameplayKeyMessage { key_code, action });
        }
    }
}

/// Auto-save the mapping when it has unsaved changes.
fn save_keyboard_mapping_on_change(
    engine: Res<KeyboardMappingResource>,
    persistence: Res<MappingPersistence>,
) {
    match save_if_dirty(engine.store(), persistence.0.as_ref()) {
        Ok(true) => info!("Keyboard mapping auto-saved"),
        Ok(false) => {}
        Err(e) => error!("Failed to save keyboard mapping: {e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::input::keyboard::{Key, NativeKey};
    use tempfile::TempDir;

    #[derive(Resource, Default)]
    struct Collected {
        toggles: Vec<ToggleAction>,
        actions: Vec<ActionId>,
    }

    fn collect(
        mut toggles: MessageReader<HostToggleMessage>,
        mut gameplay: MessageReader<GameplayKeyMessage>,
        mut collected: ResMut<Collected>,
    ) {
        collected.toggles.extend(toggles.read().map(|message| message.0));
        collected
            .actions
            .extend(gameplay.read().map(|message| message.action.clone()));
    }

    fn press(app: &mut App, key_code: BevyKeyCode) {
        app.world_mut().write_message(KeyboardInput {
            key_code,
            logical_key: Key::Unidentified(NativeKey::Unidentified),
            state: ButtonState::Pressed,
            text: None,
            repeat: false,
            window: Entity::PLACEHOLDER,
        });
    }

    /// Action the binding menu commits on the next frame.
    #[derive(Resource, Default)]
    struct PendingChoice(Option<ActionId>);

    fn apply_choice(
        mut choice: ResMut<PendingChoice>,
        mut capture: ResMut<ActiveCapture>,
        mut host: BevyHost,
    ) {
        let Some(action) = choice.0.take() else {
            return;
        };
        if let Some(session) = capture.session_mut() {
            session.choose_action(&action, &mut host).unwrap();
        }
    }

    fn app(engine: &KeyboardMapping, save_path: PathBuf) -> App {
        let mut app = App::new();
        app.add_plugins(KeyboardMappingPlugin::new(engine.clone()).with_save_path(save_path))
            .init_resource::<Collected>()
            .init_resource::<PendingChoice>()
            .init_resource::<ButtonInput<BevyKeyCode>>()
            .add_systems(Update, (apply_choice, collect));
        app.update();
        app
    }

    #[test]
    fn test_legacy_key_codes() {
        assert_eq!(legacy_key_code(BevyKeyCode::KeyA), Some(KeyCode(65)));
        assert_eq!(legacy_key_code(BevyKeyCode::Escape), Some(KeyCode::ESCAPE));
        assert_eq!(legacy_key_code(BevyKeyCode::F11), Some(KeyCode(122)));
        assert_eq!(legacy_key_code(BevyKeyCode::ArrowDown), Some(KeyCode(40)));
        assert_eq!(legacy_key_code(BevyKeyCode::Numpad0), Some(KeyCode(96)));
        assert_eq!(legacy_key_code(BevyKeyCode::Fn), None);
    }

    #[test]
    fn test_presses_become_messages() {
        let dir = TempDir::new().unwrap();
        let engine = KeyboardMapping::default();
        let mut app = app(&engine, dir.path().join("keyboard.json"));

        press(&mut app, BevyKeyCode::F4);
        press(&mut app, BevyKeyCode::Enter);
        app.update();

        let collected = app.world().resource::<Collected>();
        assert_eq!(collected.toggles, vec![ToggleAction::Fullscreen]);
        assert_eq!(collected.actions, vec![ActionId::from("ok")]);
    }

    #[test]
    fn test_restore_through_bevy_host_clears_input() {
        fn confirm_restore(engine: Res<KeyboardMappingResource>, mut host: BevyHost) {
            engine.start_restore().confirm(&mut host).unwrap();
        }

        let dir = TempDir::new().unwrap();
        let engine = KeyboardMapping::default();
        engine.store().unset(KeyCode(13));
        let mut app = app(&engine, dir.path().join("keyboard.json"));
        app.world_mut()
            .resource_mut::<ButtonInput<BevyKeyCode>>()
            .press(BevyKeyCode::KeyY);

        app.add_systems(Update, confirm_restore);
        app.update();

        let input = app.world().resource::<ButtonInput<BevyKeyCode>>();
        assert!(input.get_pressed().next().is_none());
        assert_eq!(engine.store().get(KeyCode(13)), Some(ActionId::from("ok")));
    }

    #[test]
    fn test_capture_commit_is_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyboard.json");
        let engine = KeyboardMapping::default();
        let mut app = app(&engine, path.clone());

        app.world_mut()
            .resource_mut::<ActiveCapture>()
            .begin(&engine)
            .unwrap();
        press(&mut app, BevyKeyCode::KeyA);
        app.update();

        // Captured keys never reach gameplay.
        assert!(app.world().resource::<Collected>().actions.is_empty());

        // The key that confirms the menu entry is still held.
        app.world_mut()
            .resource_mut::<ButtonInput<BevyKeyCode>>()
            .press(BevyKeyCode::Enter);
        app.world_mut().resource_mut::<PendingChoice>().0 = Some(ActionId::from("shift"));
        app.update();

        let input = app.world().resource::<ButtonInput<BevyKeyCode>>();
        assert!(input.get_pressed().next().is_none());
        assert!(input.get_just_pressed().next().is_none());
        assert!(app.world().resource::<ActiveCapture>().session().unwrap().is_finished());
        assert!(!engine.store().is_dirty());
        let saved = JsonFilePersistence::new(&path).load().unwrap().unwrap();
        assert_eq!(saved["65"], "shift");
    }
}
