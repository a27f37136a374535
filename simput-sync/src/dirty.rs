//! Queue of local edits waiting to be sent.

use serde_json::Value;
use simput_types::{DirtyEntry, ItemId};

/// Pending local edits, one entry per `(id, name)`.
///
/// Re-marking a property drops its earlier entry and appends the new one, so
/// the queue holds the latest value of each property in most-recently-marked
/// order.
#[derive(Debug, Clone, Default)]
pub struct DirtyQueue {
    entries: Vec<DirtyEntry>,
}

impl DirtyQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `value` for `(id, name)`, replacing any earlier entry.
    pub fn mark(&mut self, id: ItemId, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.entries.retain(|e| !e.targets(&id, &name));
        self.entries.push(DirtyEntry::new(id, name, value));
    }

    /// Takes the whole queue, leaving it empty.
    pub fn take(&mut self) -> Vec<DirtyEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Whether `(id, name)` is queued.
    pub fn contains(&self, id: &ItemId, name: &str) -> bool {
        self.entries.iter().any(|e| e.targets(id, name))
    }

    /// Queued entries in send order.
    pub fn entries(&self) -> &[DirtyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
