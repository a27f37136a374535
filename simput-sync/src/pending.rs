//! Pending-request tracking.
//!
//! A key's presence means a request for it is in flight and must not be
//! issued again. Keys are only removed when the matching push arrives; there
//! is no timeout, so a request that never resolves keeps its key forever
//! (until the tracker is cleared).

use simput_types::ItemId;
use std::collections::HashSet;

/// The resource a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Data,
    Domains,
    Ui,
}

/// In-flight fetches per resource kind, plus the dirty-flush gate.
#[derive(Debug, Clone, Default)]
pub struct PendingTracker {
    data: HashSet<ItemId>,
    domains: HashSet<ItemId>,
    ui: HashSet<String>,
    dirty: HashSet<ItemId>,
}

impl PendingTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a fetch in flight. Returns `false` if one already was, in which
    /// case the caller must not issue another.
    pub fn begin(&mut self, kind: ResourceKind, key: &str) -> bool {
        match kind {
            ResourceKind::Data => self.data.insert(ItemId::from(key)),
            ResourceKind::Domains => self.domains.insert(ItemId::from(key)),
            ResourceKind::Ui => self.ui.insert(key.to_string()),
        }
    }

    /// Clears a fetch. Returns whether it was in flight.
    pub fn complete(&mut self, kind: ResourceKind, key: &str) -> bool {
        match kind {
            ResourceKind::Data => self.data.remove(key),
            ResourceKind::Domains => self.domains.remove(key),
            ResourceKind::Ui => self.ui.remove(key),
        }
    }

    /// Whether a fetch for `key` is in flight.
    pub fn is_pending(&self, kind: ResourceKind, key: &str) -> bool {
        match kind {
            ResourceKind::Data => self.data.contains(key),
            ResourceKind::Domains => self.domains.contains(key),
            ResourceKind::Ui => self.ui.contains(key),
        }
    }

    /// Number of fetches in flight for `kind`.
    pub fn pending_count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Data => self.data.len(),
            ResourceKind::Domains => self.domains.len(),
            ResourceKind::Ui => self.ui.len(),
        }
    }

    /// Marks a dirty batch for `id` as sent and awaiting its echo.
    pub fn begin_flush(&mut self, id: ItemId) {
        self.dirty.insert(id);
    }

    /// Clears the flush flag for `id`.
    pub fn complete_flush(&mut self, id: &ItemId) -> bool {
        self.dirty.remove(id)
    }

    /// Whether any dirty batch is awaiting its echo. This is a single gate
    /// across all items.
    pub fn flush_in_flight(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Whether `id` has a dirty batch awaiting its echo.
    pub fn is_flushing(&self, id: &ItemId) -> bool {
        self.dirty.contains(id)
    }

    /// Forgets every in-flight fetch of `kind`.
    pub fn clear_kind(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Data => self.data.clear(),
            ResourceKind::Domains => self.domains.clear(),
            ResourceKind::Ui => self.ui.clear(),
        }
    }

    /// Forgets every in-flight request.
    pub fn clear(&mut self) {
        self.data.clear();
        self.domains.clear();
        self.ui.clear();
        self.dirty.clear();
    }
}
