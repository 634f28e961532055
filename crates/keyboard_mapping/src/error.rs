use crate::action::ActionId;
use crate::key_code::KeyCode;
use thiserror::Error;

/// Errors returned by the capture and restore workflows.
///
/// File and configuration access report through `anyhow` instead.
#[derive(Error, Debug)]
pub enum MappingError {
    /// A capture session is already active; the new start request is rejected.
    #[error("a key capture session is already active")]
    AlreadyCapturing,

    #[error("cannot {attempted} while the workflow is {state}")]
    InvalidTransition {
        attempted: &'static str,
        state: &'static str,
    },

    #[error("candidate index {index} is out of range ({len} candidates)")]
    CandidateOutOfRange { index: usize, len: usize },

    #[error("action '{0}' is not offered for this key")]
    ActionNotOffered(ActionId),
}

/// A single repair applied to persisted mapping data on load.
///
/// Corrupt or hand-edited save data is repaired instead of rejected; each
/// repair is logged and reported back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingRepair {
    #[error("persisted mapping is not a JSON object")]
    NotAnObject,

    #[error("dropped entry with non-integer key code '{0}'")]
    InvalidKeyCode(String),

    #[error("normalized key code '{0}'")]
    NonCanonicalKeyCode(String),

    #[error("dropped duplicate entry for key code {0}")]
    DuplicateKeyCode(KeyCode),

    #[error("dropped non-string action for key code {0}")]
    InvalidAction(KeyCode),

    #[error("escape key binding was missing and has been restored")]
    MissingEscape,
}
