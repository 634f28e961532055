//! Interception of the host's native key-down pipeline.
//!
//! The host hands every raw key-down to [`KeyboardMapping::on_key_down`]
//! before its own dispatch. The interceptor cancels the native default action
//! of suppressed keys, routes the event to a listening capture session, fires
//! host toggles and otherwise reports the action gameplay should run.

use crate::action::{ActionId, ToggleAction};
use crate::capture::{CaptureSession, CaptureStep};
use crate::engine::{CapturePhase, KeyboardMapping};
use crate::key_code::KeyCode;
use tracing::{debug, trace};

/// Side effects the engine asks of the host.
pub trait HostBridge {
    fn toggle(&mut self, toggle: ToggleAction);

    /// Forget keys currently held or queued, so the key that just committed a
    /// binding is not also read as gameplay input this frame.
    fn clear_pending_input(&mut self);
}

/// A raw key-down as delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDownEvent {
    pub key_code: KeyCode,
    /// Set when the native default action must not run.
    pub default_prevented: bool,
}

impl KeyDownEvent {
    pub fn new(key_code: impl Into<KeyCode>) -> Self {
        Self {
            key_code: key_code.into(),
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// What the interceptor did with a key-down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyDispatch {
    /// Consumed by the capture session.
    Captured(CaptureStep),
    /// A capture is listening but no session was handed in; nothing ran.
    Suspended,
    Toggled(ToggleAction),
    /// Gameplay should run this action.
    Action(ActionId),
    Unbound,
}

impl KeyboardMapping {
    /// Intercept one key-down.
    ///
    /// Pass the active capture session, if any. While the capture is awaiting
    /// a key, neither toggles nor gameplay actions fire. Escape while the
    /// session is choosing an action cancels it.
    pub fn on_key_down<H>(
        &self,
        event: &mut KeyDownEvent,
        host: &mut H,
        session: Option<&mut CaptureSession>,
    ) -> KeyDispatch
    where
        H: HostBridge + ?Sized,
    {
        let key = event.key_code;
        if self.is_suppressed(key) {
            event.prevent_default();
            trace!(key_code = key.get(), "native default action suppressed");
        }

        let session = session.filter(|session| session.belongs_to(self));
        match (self.capture_phase(), session) {
            (CapturePhase::AwaitingKey, Some(session)) => {
                return KeyDispatch::Captured(session.handle_key_down(key, host));
            }
            (CapturePhase::AwaitingKey, None) => return KeyDispatch::Suspended,
            (CapturePhase::ChoosingAction, Some(session)) if key.is_escape() => {
                return KeyDispatch::Captured(session.handle_key_down(key, host));
            }
            _ => {}
        }

        let Some(action) = self.store.get(key) else {
            return KeyDispatch::Unbound;
        };
        match action.toggle() {
            Some(toggle) => {
                debug!(key_code = key.get(), %toggle, "host toggle");
                host.toggle(toggle);
                KeyDispatch::Toggled(toggle)
            }
            None => KeyDispatch::Action(action),
        }
    }
}

/// Host that records what it was asked to do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingHost {
    pub toggles: Vec<ToggleAction>,
    pub cleared: usize,
}

impl HostBridge for RecordingHost {
    fn toggle(&mut self, toggle: ToggleAction) {
        self.toggles.push(toggle);
    }

    fn clear_pending_input(&mut self) {
        self.cleared += 1;
    }
}
