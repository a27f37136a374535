//! Per-property synchronization status.
//!
//! Every property moves through three states:
//!
//! ```text
//! Synced ──edit──▶ PendingLocalEdit ──flush──▶ PendingConfirmation
//!    ▲                                                │
//!    └────────────────── push for the item ◀──────────┘
//! ```
//!
//! Editing a property that awaits confirmation sends it back to
//! `PendingLocalEdit`; a push then leaves it there.

use simput_types::ItemId;
use std::collections::HashMap;

/// Where a property stands relative to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PropertyStatus {
    /// The cached value matches what the server confirmed.
    #[default]
    Synced,
    /// Edited locally, not sent yet.
    PendingLocalEdit,
    /// Sent, waiting for the server to push the item back.
    PendingConfirmation,
}

/// Status of every property that is not [`PropertyStatus::Synced`].
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    items: HashMap<ItemId, HashMap<String, PropertyStatus>>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of `(id, name)`.
    pub fn get(&self, id: &ItemId, name: &str) -> PropertyStatus {
        self.items
            .get(id)
            .and_then(|props| props.get(name))
            .copied()
            .unwrap_or_default()
    }

    /// A local edit happened.
    pub fn edited(&mut self, id: &ItemId, name: &str) {
        self.items
            .entry(id.clone())
            .or_default()
            .insert(name.to_string(), PropertyStatus::PendingLocalEdit);
    }

    /// The edit was sent to the server.
    pub fn sent(&mut self, id: &ItemId, name: &str) {
        self.items
            .entry(id.clone())
            .or_default()
            .insert(name.to_string(), PropertyStatus::PendingConfirmation);
    }

    /// The server pushed `id` back: every sent property is confirmed.
    pub fn confirmed(&mut self, id: &ItemId) {
        if let Some(props) = self.items.get_mut(id) {
            props.retain(|_, status| *status != PropertyStatus::PendingConfirmation);
            if props.is_empty() {
                self.items.remove(id);
            }
        }
    }

    /// Properties of `id` that are not synced, sorted by name.
    pub fn unsynced(&self, id: &ItemId) -> Vec<(String, PropertyStatus)> {
        let mut out: Vec<_> = self
            .items
            .get(id)
            .map(|props| props.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
