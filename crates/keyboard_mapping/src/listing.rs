//! The "current keybindings" screen.

use crate::action::ActionId;
use crate::engine::KeyboardMapping;
use crate::key_code::KeyCode;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingEntry {
    pub key_code: KeyCode,
    pub key_name: String,
    pub action: ActionId,
    pub action_name: String,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.key_name, self.action_name)
    }
}

/// Every bound key whose action is in the catalog, in key code order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeybindingListing {
    entries: Vec<ListingEntry>,
}

impl KeybindingListing {
    pub fn collect(engine: &KeyboardMapping) -> Self {
        let rules = &engine.rules;
        let entries = engine.store.with_mapping(|mapping| {
            mapping
                .iter()
                .filter_map(|(key, action)| {
                    let action_name = rules.actions.display_name(action)?;
                    Some(ListingEntry {
                        key_code: *key,
                        key_name: rules.keys.display_name(*key).into_owned(),
                        action: action.clone(),
                        action_name: action_name.to_owned(),
                    })
                })
                .collect()
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `[Key] Action` line per entry.
    pub fn render_text(&self) -> String {
        self.entries
            .iter()
            .map(ListingEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl KeyboardMapping {
    pub fn listing(&self) -> KeybindingListing {
        KeybindingListing::collect(self)
    }
}

impl<'a> IntoIterator for &'a KeybindingListing {
    type Item = &'a ListingEntry;
    type IntoIter = std::slice::Iter<'a, ListingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
