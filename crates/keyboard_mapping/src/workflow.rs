use crate::engine::KeyboardMapping;
use crate::error::MappingError;

/// Common surface of the short-lived menu workflows.
///
/// Both [`CaptureSession`](crate::capture::CaptureSession) and
/// [`RestoreFlow`](crate::restore::RestoreFlow) are started from the engine
/// handle, driven by user input and drop out once finished.
pub trait Workflow {
    type State: Clone + std::fmt::Debug;

    fn start(engine: &KeyboardMapping) -> Result<Self, MappingError>
    where
        Self: Sized;

    fn state(&self) -> Self::State;

    fn is_finished(&self) -> bool;

    /// Abandon the workflow without touching the mapping.
    ///
    /// Fails with [`MappingError::InvalidTransition`] once finished.
    fn cancel(&mut self) -> Result<(), MappingError>;
}
