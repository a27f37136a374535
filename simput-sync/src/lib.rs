//! Client-side synchronization core for Simput.
//!
//! Keeps a local cache of server-owned items, their validation domains and
//! per-type UI descriptors consistent with a remote authority reached over a
//! bidirectional RPC/pub-sub [`Transport`].
//!
//! # Architecture
//!
//! Reads are served from the cache and trigger fetches on miss; the answers
//! come back later as pushes. Local edits are queued and sent in batches.
//! Pushes are reconciled against what the server is expected to hold, so the
//! echo of our own edit is not reported as a change.
//!
//! ## Components
//!
//! - **Protocol**: outbound signals and inbound push/event payloads
//! - **Cache**: item data, domains, UI descriptors and expected snapshots
//! - **Dirty queue**: coalesced local edits awaiting a flush
//! - **Pending tracker**: in-flight fetches and the flush gate
//! - **Status**: per-property sync status
//! - **Bus**: typed events fanned out to subscribers
//! - **Manager**: the core tying the above together, one per session
//! - **Registry**: managers keyed by session id
//! - **Channel** and **binding**: the subscriber side used by views
//!
//! ## Edit round-trip
//!
//! 1. **Edit**: a view writes a property and marks it dirty
//! 2. **Flush**: queued edits go out as one `Update` batch
//! 3. **Echo**: the server pushes the item back
//! 4. **Reconcile**: the push matches the expected snapshot, no change is
//!    reported, the flush gate opens and the next batch goes out
//!
//! # Example
//!
//! ```
//! use simput_sync::mock::MockTransport;
//! use simput_sync::{ManagerConfig, ManagerRegistry};
//! use std::sync::Arc;
//!
//! let registry = ManagerRegistry::new();
//! let transport = Arc::new(MockTransport::new());
//! let manager = registry
//!     .get_or_create("session", ManagerConfig::default(), Some(transport))
//!     .unwrap();
//!
//! assert_eq!(manager.namespace(), "simput");
//! assert!(registry.get_or_create("other", ManagerConfig::default(), None).is_none());
//! ```

mod binding;
mod bus;
mod cache;
mod channel;
mod dirty;
mod error;
pub mod field;
mod manager;
mod pending;
pub mod protocol;
mod registry;
mod status;
pub mod transport;

pub use binding::ItemBinding;
pub use bus::{
    BusEvent, ChangeNotice, DirtyMark, DirtySink, EventKind, NotificationBus, ReloadTarget,
    Subscriber,
};
pub use cache::ReconciliationCache;
pub use channel::{ListenerId, SimputChannel};
pub use dirty::DirtyQueue;
pub use error::{SyncError, SyncResult};
pub use manager::{DataManager, ManagerConfig, DEFAULT_NAMESPACE, DEFAULT_QUERY_DEBOUNCE};
pub use pending::{PendingTracker, ResourceKind};
pub use protocol::{
    DataAction, FetchRequest, PushMessage, ServerEvent, Signal, EVENT_TOPIC, PUSH_METHOD,
    PUSH_TOPIC,
};
pub use registry::ManagerRegistry;
pub use status::{PropertyStatus, StatusTable};
pub use transport::{mock, TopicReceiver, Transport};
