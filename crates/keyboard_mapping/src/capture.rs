//! The key capture session: listen for one key, let the user pick what it
//! does, commit exactly one mapping change.
//!
//! A session is started from the engine handle and holds the engine's capture
//! gate until it reaches a terminal state or is dropped. Only one session can
//! exist per engine; a second `start` fails with
//! [`MappingError::AlreadyCapturing`] and leaves the first untouched.
//!
//! ```text
//! AwaitingKey --escape--------------------------> Terminal(Cancelled)
//! AwaitingKey --safeguarded key--> AwaitingKey
//! AwaitingKey --other key--> ChoosingAction --pick--> Terminal(Bound)
//!                                           --unbind--> Terminal(Unbound)
//!                                           --cancel/escape--> Terminal(Cancelled)
//! ```

use crate::action::ActionId;
use crate::engine::{CapturePhase, KeyboardMapping};
use crate::error::MappingError;
use crate::host::HostBridge;
use crate::key_code::KeyCode;
use crate::resolver::Candidate;
use crate::workflow::Workflow;
use tracing::{debug, info, warn};

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Bound(KeyCode, ActionId),
    Unbound(KeyCode),
    Cancelled,
}

/// State of a live session.
///
/// There is no idle state here: "no session" is idle, see
/// [`CapturePhase::Idle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureState {
    AwaitingKey,
    ChoosingAction,
    Terminal(CaptureOutcome),
}

impl CaptureState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingKey => "awaiting a key",
            Self::ChoosingAction => "choosing an action",
            Self::Terminal(_) => "finished",
        }
    }
}

/// Result of feeding one key-down to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureStep {
    /// The key was dropped; the state did not change.
    Ignored,
    /// The key was captured; the session now waits for a choice.
    Captured,
    Finished(CaptureOutcome),
}

/// The action a captured key was bound to when it was captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundAction {
    pub code: ActionId,
    /// `None` when the action is not in the catalog.
    pub display_name: Option<String>,
}

/// What the prompt shows about the captured key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedKey {
    pub key_code: KeyCode,
    pub key_name: String,
    pub bound_to: Option<BoundAction>,
}

impl CapturedKey {
    pub fn is_bound(&self) -> bool {
        self.bound_to.is_some()
    }
}

/// A running key capture.
pub struct CaptureSession {
    engine: KeyboardMapping,
    state: CaptureState,
    captured: Option<CapturedKey>,
    candidates: Vec<Candidate>,
    holds_gate: bool,
}

impl KeyboardMapping {
    /// Start a capture session.
    pub fn start_capture(&self) -> Result<CaptureSession, MappingError> {
        CaptureSession::start(self)
    }
}

impl CaptureSession {
    pub fn captured(&self) -> Option<&CapturedKey> {
        self.captured.as_ref()
    }

    pub fn key_code(&self) -> Option<KeyCode> {
        self.captured.as_ref().map(|captured| captured.key_code)
    }

    /// The menu entries; empty until a key was captured.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn outcome(&self) -> Option<&CaptureOutcome> {
        match &self.state {
            CaptureState::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Feed a raw key-down to the session.
    ///
    /// Capturing a key clears the host's pending input so it does not also
    /// select a menu entry.
    pub fn handle_key_down<H>(&mut self, key: KeyCode, host: &mut H) -> CaptureStep
    where
        H: HostBridge + ?Sized,
    {
        match self.state {
            CaptureState::AwaitingKey if key.is_escape() => {
                self.finish(CaptureOutcome::Cancelled);
                CaptureStep::Finished(CaptureOutcome::Cancelled)
            }
            CaptureState::AwaitingKey if self.engine.is_safeguarded(key) => {
                debug!(key_code = key.get(), "safeguarded key ignored during capture");
                CaptureStep::Ignored
            }
            CaptureState::AwaitingKey => {
                self.capture(key);
                host.clear_pending_input();
                CaptureStep::Captured
            }
            CaptureState::ChoosingAction if key.is_escape() => {
                self.finish(CaptureOutcome::Cancelled);
                CaptureStep::Finished(CaptureOutcome::Cancelled)
            }
            CaptureState::ChoosingAction | CaptureState::Terminal(_) => CaptureStep::Ignored,
        }
    }

    /// Pick the candidate at `index` in [`candidates`](Self::candidates).
    pub fn choose<H>(&mut self, index: usize, host: &mut H) -> Result<CaptureOutcome, MappingError>
    where
        H: HostBridge + ?Sized,
    {
        let key = self.choosing_key("choose an action")?;
        let Some(candidate) = self.candidates.get(index) else {
            let len = self.candidates.len();
            warn!(index, len, "candidate index out of range");
            return Err(MappingError::CandidateOutOfRange { index, len });
        };

        let outcome = match &candidate.action {
            Some(action) => CaptureOutcome::Bound(key, action.clone()),
            None => CaptureOutcome::Unbound(key),
        };
        Ok(self.commit(outcome, host))
    }

    /// Pick a catalog action by code.
    pub fn choose_action<H>(&mut self, action: &ActionId, host: &mut H) -> Result<CaptureOutcome, MappingError>
    where
        H: HostBridge + ?Sized,
    {
        let key = self.choosing_key("choose an action")?;
        if !self
            .candidates
            .iter()
            .any(|candidate| candidate.action.as_ref() == Some(action))
        {
            warn!(%action, "action is not offered for the captured key");
            return Err(MappingError::ActionNotOffered(action.clone()));
        }
        Ok(self.commit(CaptureOutcome::Bound(key, action.clone()), host))
    }

    /// Remove the captured key's binding. Only offered when the key is bound.
    pub fn unbind<H>(&mut self, host: &mut H) -> Result<CaptureOutcome, MappingError>
    where
        H: HostBridge + ?Sized,
    {
        let key = self.choosing_key("unbind")?;
        if !self.candidates.first().is_some_and(Candidate::is_unbind) {
            warn!(key_code = key.get(), "unbind requested for an unbound key");
            return Err(MappingError::InvalidTransition {
                attempted: "unbind",
                state: "choosing an action for an unbound key",
            });
        }
        Ok(self.commit(CaptureOutcome::Unbound(key), host))
    }

    fn choosing_key(&self, attempted: &'static str) -> Result<KeyCode, MappingError> {
        match (&self.state, self.key_code()) {
            (CaptureState::ChoosingAction, Some(key)) => Ok(key),
            (state, _) => {
                warn!(attempted, state = state.name(), "invalid capture transition");
                Err(MappingError::InvalidTransition {
                    attempted,
                    state: state.name(),
                })
            }
        }
    }

    fn capture(&mut self, key: KeyCode) {
        let rules = &self.engine.rules;
        let bound_to = self.engine.store.get(key).map(|code| BoundAction {
            display_name: rules.actions.display_name(&code).map(str::to_owned),
            code,
        });
        let captured = CapturedKey {
            key_code: key,
            key_name: rules.keys.display_name(key).into_owned(),
            bound_to,
        };

        debug!(
            key_code = key.get(),
            key_name = %captured.key_name,
            bound = captured.is_bound(),
            "key captured"
        );

        self.candidates = self.engine.resolver().candidates(key);
        self.captured = Some(captured);
        self.state = CaptureState::ChoosingAction;
        self.engine.gate.set(CapturePhase::ChoosingAction);
    }

    fn commit<H>(&mut self, outcome: CaptureOutcome, host: &mut H) -> CaptureOutcome
    where
        H: HostBridge + ?Sized,
    {
        debug_assert!(self.holds_gate, "committing a session that released the gate");

        match &outcome {
            CaptureOutcome::Bound(key, action) => {
                self.engine.store.set(*key, action.clone());
                info!(key_code = key.get(), %action, "key binding committed");
            }
            CaptureOutcome::Unbound(key) => {
                self.engine.store.unset(*key);
                info!(key_code = key.get(), "key binding removed");
            }
            CaptureOutcome::Cancelled => {}
        }
        if outcome != CaptureOutcome::Cancelled {
            host.clear_pending_input();
        }

        self.finish(outcome.clone());
        outcome
    }

    fn finish(&mut self, outcome: CaptureOutcome) {
        if outcome == CaptureOutcome::Cancelled {
            debug!(key_code = ?self.key_code().map(KeyCode::get), "capture cancelled");
        }
        self.state = CaptureState::Terminal(outcome);
        self.release();
    }

    fn release(&mut self) {
        if self.holds_gate {
            self.engine.gate.release();
            self.holds_gate = false;
        }
    }

    pub(crate) fn belongs_to(&self, engine: &KeyboardMapping) -> bool {
        std::sync::Arc::ptr_eq(&self.engine.gate, &engine.gate)
    }
}

impl Workflow for CaptureSession {
    type State = CaptureState;

    fn start(engine: &KeyboardMapping) -> Result<Self, MappingError> {
        if !engine.gate.try_acquire() {
            warn!("capture start rejected, a session is already active");
            return Err(MappingError::AlreadyCapturing);
        }
        debug!("capture session started");

        Ok(Self {
            engine: engine.clone(),
            state: CaptureState::AwaitingKey,
            captured: None,
            candidates: Vec::new(),
            holds_gate: true,
        })
    }

    fn state(&self) -> CaptureState {
        self.state.clone()
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, CaptureState::Terminal(_))
    }

    fn cancel(&mut self) -> Result<(), MappingError> {
        if self.is_finished() {
            warn!("cancel requested on a finished capture session");
            return Err(MappingError::InvalidTransition {
                attempted: "cancel",
                state: self.state.name(),
            });
        }
        self.finish(CaptureOutcome::Cancelled);
        Ok(())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.holds_gate {
            debug!("capture session dropped before finishing");
        }
        self.release();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state)
            .field("captured", &self.captured)
            .field("candidates", &self.candidates.len())
            .finish()
    }
}
