//! Candidate actions offered for a captured key.

use crate::action::{ActionCatalog, ActionId};
use crate::key_code::KeyCode;
use crate::store::MappingStore;

/// Label of the synthetic "remove this binding" entry.
pub const UNBIND_LABEL: &str = "(Unbind)";

/// One entry in the action menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub label: String,
    /// `None` for the unbind entry.
    pub action: Option<ActionId>,
}

impl Candidate {
    pub fn is_unbind(&self) -> bool {
        self.action.is_none()
    }
}

/// Builds the ordered candidate list for a key.
#[derive(Clone, Copy)]
pub struct ActionResolver<'a> {
    store: &'a MappingStore,
    catalog: &'a ActionCatalog,
    unbind_label: &'a str,
}

impl<'a> ActionResolver<'a> {
    pub fn new(store: &'a MappingStore, catalog: &'a ActionCatalog) -> Self {
        Self {
            store,
            catalog,
            unbind_label: UNBIND_LABEL,
        }
    }

    /// Use a localized label for the unbind entry.
    pub fn with_unbind_label(mut self, label: &'a str) -> Self {
        self.unbind_label = label;
        self
    }

    /// Unbind first (only when `key` is bound), then the catalog in menu order.
    pub fn candidates(&self, key: KeyCode) -> Vec<Candidate> {
        let bound = self.store.get(key).is_some();
        let mut candidates = Vec::with_capacity(self.catalog.len() + usize::from(bound));

        if bound {
            candidates.push(Candidate {
                label: self.unbind_label.to_owned(),
                action: None,
            });
        }
        candidates.extend(self.catalog.iter().map(|(code, name)| Candidate {
            label: name.to_owned(),
            action: Some(code.clone()),
        }));
        candidates
    }
}
