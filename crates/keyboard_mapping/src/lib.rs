//! Runtime keyboard remapping for menu-driven games.
//!
//! The crate owns the key code -> action mapping that gameplay dispatch reads,
//! and the short workflows that change it: capturing one key and binding it
//! to an action, and restoring the factory defaults. Raw key-downs from the
//! host go through [`KeyboardMapping::on_key_down`], which suppresses native
//! default actions, fires host toggles and keeps gameplay quiet while a key is
//! being captured.
//!
//! # Example
//!
//! ```
//! use keyboard_mapping::{ActionId, KeyCode, KeyDownEvent, KeyboardMapping, RecordingHost};
//!
//! let engine = KeyboardMapping::default();
//! let mut host = RecordingHost::default();
//!
//! let mut session = engine.start_capture().unwrap();
//! let mut event = KeyDownEvent::new(65u32);
//! engine.on_key_down(&mut event, &mut host, Some(&mut session));
//!
//! session.choose_action(&ActionId::from("shift"), &mut host).unwrap();
//! assert_eq!(engine.store().get(KeyCode(65)), Some(ActionId::from("shift")));
//! ```

pub mod action;
pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod key_code;
pub mod listing;
pub mod mapping;
pub mod persistence;
pub mod resolver;
pub mod restore;
pub mod store;
pub mod workflow;

#[cfg(feature = "bevy")]
pub mod bevy;

// Re-export main types
pub use action::{ActionCatalog, ActionDescriptor, ActionId, ToggleAction, ESCAPE_ACTION};
pub use capture::{BoundAction, CaptureOutcome, CaptureSession, CaptureState, CaptureStep, CapturedKey};
pub use config::{BindingEntry, KeyNameEntry, MappingConfig};
pub use engine::{CapturePhase, KeyboardMapping, KeyboardMappingBuilder};
pub use error::{MappingError, MappingRepair};
pub use host::{HostBridge, KeyDispatch, KeyDownEvent, RecordingHost};
pub use key_code::{KeyCatalog, KeyCode};
pub use listing::{KeybindingListing, ListingEntry};
pub use mapping::KeyMapping;
pub use persistence::{
    load_into, save_if_dirty, JsonFilePersistence, MappingFile, MemoryPersistence, PersistenceBridge,
};
pub use resolver::{ActionResolver, Candidate, UNBIND_LABEL};
pub use restore::{RestoreFlow, RestoreState};
pub use store::{MappingStore, MappingVersion};
pub use workflow::Workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
