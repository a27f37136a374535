//! Client-side cache of server state.
//!
//! Holds the last-known item data, domains and per-type UI descriptors, and
//! for every item the properties the server is expected to hold. Comparing a
//! push against that expectation separates echoes of our own edits from
//! genuine external changes.

use serde_json::Value;
use simput_types::{DomainMap, Item, ItemId, Properties, UiDescriptor};
use std::collections::HashMap;

/// Cached items, domains and UI descriptors.
#[derive(Debug, Clone)]
pub struct ReconciliationCache {
    data: HashMap<ItemId, Item>,
    domains: HashMap<ItemId, DomainMap>,
    ui: HashMap<String, UiDescriptor>,
    expected: HashMap<ItemId, Properties>,
    ui_timestamp: u64,
}

impl Default for ReconciliationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationCache {
    /// Creates an empty cache. The UI timestamp starts at 1.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            domains: HashMap::new(),
            ui: HashMap::new(),
            expected: HashMap::new(),
            ui_timestamp: 1,
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn data(&self, id: &ItemId) -> Option<&Item> {
        self.data.get(id)
    }

    pub fn domains(&self, id: &ItemId) -> Option<&DomainMap> {
        self.domains.get(id)
    }

    pub fn ui(&self, type_name: &str) -> Option<&UiDescriptor> {
        self.ui.get(type_name)
    }

    /// Properties the server is believed to hold for `id`.
    pub fn expected(&self, id: &ItemId) -> Option<&Properties> {
        self.expected.get(id)
    }

    /// Change counter bumped on every UI descriptor arrival.
    pub fn ui_timestamp(&self) -> u64 {
        self.ui_timestamp
    }

    /// Types with a cached descriptor.
    pub fn ui_types(&self) -> impl Iterator<Item = &str> {
        self.ui.keys().map(String::as_str)
    }

    pub fn contains_data(&self, id: &ItemId) -> bool {
        self.data.contains_key(id)
    }

    // ── Local edits ──────────────────────────────────────────────

    /// Writes a local edit into the cached item. Returns `false` when the
    /// item is not cached.
    pub fn set_property(&mut self, id: &ItemId, name: &str, value: Value) -> bool {
        match self.data.get_mut(id) {
            Some(item) => {
                item.set_property(name, value);
                true
            }
            None => false,
        }
    }

    /// Records that the server is about to receive `value` for `(id, name)`.
    pub fn expect(&mut self, id: &ItemId, name: &str, value: Value) {
        self.expected
            .entry(id.clone())
            .or_default()
            .insert(name.to_string(), value);
    }

    // ── Push reconciliation ──────────────────────────────────────

    /// Applies pushed item data. Returns whether it differed from what the
    /// server was expected to hold.
    ///
    /// On a difference the cached item is replaced and the expectation moves
    /// to the pushed properties. Either way the cached `mtime` and `original`
    /// track the push.
    pub fn apply_data(&mut self, item: Item) -> bool {
        let id = item.id.clone();
        let incoming = item.properties.clone();
        let mtime = item.mtime;

        let changed =
            self.expected.get(&id) != Some(&incoming) || !self.data.contains_key(&id);
        if changed {
            self.expected.insert(id.clone(), incoming.clone());
            self.data.insert(id.clone(), item);
        }

        if let Some(cached) = self.data.get_mut(&id) {
            cached.mtime = mtime;
            cached.original = Some(incoming);
        }
        changed
    }

    /// Applies pushed domains. Returns whether they differed from the cache.
    pub fn apply_domains(&mut self, id: ItemId, domains: DomainMap) -> bool {
        if self.domains.get(&id) == Some(&domains) {
            return false;
        }
        self.domains.insert(id, domains);
        true
    }

    /// Stores a pushed UI descriptor. Always a change; returns the bumped
    /// timestamp.
    pub fn apply_ui(&mut self, type_name: String, ui: UiDescriptor) -> u64 {
        self.ui.insert(type_name, ui);
        self.ui_timestamp += 1;
        self.ui_timestamp
    }

    // ── Invalidation ─────────────────────────────────────────────

    /// Drops every cached domain.
    pub fn reset_domains(&mut self) {
        self.domains.clear();
    }

    /// Drops every cached UI descriptor, returning their types.
    pub fn clear_ui(&mut self) -> Vec<String> {
        self.ui.drain().map(|(type_name, _)| type_name).collect()
    }

    /// Drops everything except the UI timestamp, which keeps counting so
    /// templates resolved before the reset are still seen as stale.
    pub fn reset(&mut self) {
        self.data.clear();
        self.domains.clear();
        self.ui.clear();
        self.expected.clear();
    }
}
