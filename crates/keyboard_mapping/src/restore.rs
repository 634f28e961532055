//! "Restore default keys?" confirmation.

use crate::engine::KeyboardMapping;
use crate::error::MappingError;
use crate::host::HostBridge;
use crate::workflow::Workflow;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreState {
    Prompting,
    /// Defaults are live; the acknowledgement is showing.
    Confirmed,
    Declined,
}

impl RestoreState {
    fn name(self) -> &'static str {
        match self {
            Self::Prompting => "prompting",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
        }
    }
}

/// Two-step restore of the default mapping.
///
/// Needs no capture gate: restoring can run while a capture session is open
/// elsewhere, and safeguarded keys are restored like any other.
#[derive(Debug)]
pub struct RestoreFlow {
    engine: KeyboardMapping,
    state: RestoreState,
}

impl KeyboardMapping {
    pub fn start_restore(&self) -> RestoreFlow {
        RestoreFlow::prompt(self)
    }
}

impl RestoreFlow {
    fn prompt(engine: &KeyboardMapping) -> Self {
        debug!("restore defaults prompt opened");
        Self {
            engine: engine.clone(),
            state: RestoreState::Prompting,
        }
    }

    /// Replace the live mapping with the defaults.
    pub fn confirm<H>(&mut self, host: &mut H) -> Result<(), MappingError>
    where
        H: HostBridge + ?Sized,
    {
        self.expect_prompting("confirm")?;
        self.engine.store.reset_to_default();
        host.clear_pending_input();
        self.state = RestoreState::Confirmed;
        info!("default key bindings restored");
        Ok(())
    }

    pub fn decline(&mut self) -> Result<(), MappingError> {
        self.expect_prompting("decline")?;
        self.state = RestoreState::Declined;
        debug!("restore defaults declined");
        Ok(())
    }

    fn expect_prompting(&self, attempted: &'static str) -> Result<(), MappingError> {
        if self.state == RestoreState::Prompting {
            return Ok(());
        }
        warn!(attempted, state = self.state.name(), "invalid restore transition");
        Err(MappingError::InvalidTransition {
            attempted,
            state: self.state.name(),
        })
    }
}

impl Workflow for RestoreFlow {
    type State = RestoreState;

    fn start(engine: &KeyboardMapping) -> Result<Self, MappingError> {
        Ok(Self::prompt(engine))
    }

    fn state(&self) -> RestoreState {
        self.state
    }

    fn is_finished(&self) -> bool {
        self.state != RestoreState::Prompting
    }

    /// Same as [`decline`](RestoreFlow::decline).
    fn cancel(&mut self) -> Result<(), MappingError> {
        self.decline()
    }
}
