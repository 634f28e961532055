//! Action identifiers, the assignable action catalog and the host toggles.
//!
//! Actions are opaque string codes (`"ok"`, `"escape"`, `"pageup"`, ...). The
//! engine never validates them against the catalog: a mapping may bind keys to
//! codes that only gameplay dispatch knows about.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Action assigned to the escape key when a mapping lacks one.
pub const ESCAPE_ACTION: &str = "escape";

/// Identifier used to refer to a logical action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(Arc<str>);

impl ActionId {
    /// Create a new action identifier.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(Arc::<str>::from(id.into_boxed_str()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The host toggle this code designates, if any.
    pub fn toggle(&self) -> Option<ToggleAction> {
        ToggleAction::from_code(self.as_str())
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(Arc::<str>::from(value))
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        Self(Arc::<str>::from(value.into_boxed_str()))
    }
}

impl From<&ActionId> for ActionId {
    fn from(value: &ActionId) -> Self {
        value.clone()
    }
}

impl PartialEq<str> for ActionId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ActionId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ActionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(ActionId::new(value))
    }
}

/// Actions the host executes itself instead of gameplay dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToggleAction {
    /// Frame-rate counter overlay.
    FpsDisplay,
    /// Stretch/scale mode of the game canvas.
    StretchMode,
    Fullscreen,
}

impl ToggleAction {
    /// Reserved action code bound in a mapping.
    pub fn code(self) -> &'static str {
        match self {
            Self::FpsDisplay => "_fps",
            Self::StretchMode => "_stretch",
            Self::Fullscreen => "_fullscreen",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "_fps" => Some(Self::FpsDisplay),
            "_stretch" => Some(Self::StretchMode),
            "_fullscreen" => Some(Self::Fullscreen),
            _ => None,
        }
    }
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An assignable action as shown in the binding menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Internal code written into the mapping.
    pub code: ActionId,
    /// Name displayed for this action.
    pub name: String,
}

impl ActionDescriptor {
    pub fn new(code: impl Into<ActionId>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Ordered catalog of assignable actions.
///
/// Iteration order is insertion order and determines menu order. Re-inserting
/// an existing code keeps its position and replaces the display name.
#[derive(Clone, Debug, Default)]
pub struct ActionCatalog {
    actions: IndexMap<ActionId, String>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: ActionDescriptor) {
        self.actions.insert(descriptor.code, descriptor.name);
    }

    /// Display name of an action, `None` for codes outside the catalog.
    pub fn display_name(&self, code: &ActionId) -> Option<&str> {
        self.actions.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &ActionId) -> bool {
        self.actions.contains_key(code)
    }

    /// Iterate over `(code, display name)` in menu order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ActionId, &str)> {
        self.actions.iter().map(|(code, name)| (code, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl FromIterator<ActionDescriptor> for ActionCatalog {
    fn from_iter<T: IntoIterator<Item = ActionDescriptor>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}
