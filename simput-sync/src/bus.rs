//! Notification bus: typed events fanned out to subscribers.
//!
//! Subscribers are notified synchronously, in connection order. A subscriber
//! may also raise dirty marks; the core hands it a [`DirtySink`] on connect
//! and takes it back on disconnect.

use crate::error::SyncResult;
use async_trait::async_trait;
use simput_types::ItemId;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

/// Which cached resource a reload should force-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadTarget {
    Data,
    Ui,
    Domain,
}

impl FromStr for ReloadTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(Self::Data),
            "ui" => Ok(Self::Ui),
            "domain" => Ok(Self::Domain),
            other => Err(format!("unknown reload target: {other}")),
        }
    }
}

impl fmt::Display for ReloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "data",
            Self::Ui => "ui",
            Self::Domain => "domain",
        })
    }
}

/// What changed in one push. Fields that did not change are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeNotice {
    /// Set when the item's data or domains changed.
    pub id: Option<ItemId>,
    /// Set when the UI descriptor for this type changed.
    pub type_name: Option<String>,
}

impl ChangeNotice {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.type_name.is_none()
    }
}

/// An event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// The subscriber was connected and should pull current state.
    Connect,
    /// The subscriber is being disconnected.
    Disconnect,
    /// Cached state changed.
    Change(ChangeNotice),
    /// Views should force-fetch the given resource.
    Reload(ReloadTarget),
    /// A UI descriptor arrived; carries the new UI timestamp.
    TemplateTs(u64),
    /// The search query settled.
    Query(String),
}

impl BusEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Disconnect => EventKind::Disconnect,
            Self::Change(_) => EventKind::Change,
            Self::Reload(_) => EventKind::Reload,
            Self::TemplateTs(_) => EventKind::TemplateTs,
            Self::Query(_) => EventKind::Query,
        }
    }
}

/// Discriminant of [`BusEvent`], used to register listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    Change,
    Reload,
    TemplateTs,
    Query,
}

/// A local edit raised by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyMark {
    One { id: ItemId, name: String },
    Many { id: ItemId, names: Vec<String> },
}

/// Receives dirty marks from connected subscribers.
#[async_trait]
pub trait DirtySink: Send + Sync {
    async fn on_dirty(&self, mark: DirtyMark) -> SyncResult<()>;
}

/// Something that observes a core's bus.
pub trait Subscriber: Send + Sync {
    /// Delivers one event.
    fn notify(&self, event: &BusEvent);

    /// Routes this subscriber's dirty marks to `sink`, or stops routing them
    /// when `None`. Read-only subscribers can ignore it.
    fn bind_dirty(&self, _sink: Option<Weak<dyn DirtySink>>) {}
}

/// Ordered set of connected subscribers.
#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

fn same(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber. Returns `false` if it was already connected.
    pub fn connect(&mut self, subscriber: Arc<dyn Subscriber>) -> bool {
        if self.is_connected(&subscriber) {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    /// Removes a subscriber. Returns `false` if it was not connected.
    pub fn disconnect(&mut self, subscriber: &Arc<dyn Subscriber>) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| !same(s, subscriber));
        self.subscribers.len() != before
    }

    pub fn is_connected(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.subscribers.iter().any(|s| same(s, subscriber))
    }

    /// Snapshot of the subscribers in connection order. Events are delivered
    /// over this snapshot after the bus lock is released, so a subscriber may
    /// connect or disconnect while handling one.
    pub fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.subscribers.clone()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
