//! The data manager: one synchronization core per remote session.
//!
//! Owns the cache, the pending tracker, the dirty queue and the bus, and is
//! their only writer. Core state sits behind one mutex that is never held
//! across an await or while subscribers are being notified, so a subscriber
//! only ever observes fully applied pushes and may call back into the core.

use crate::bus::{
    BusEvent, ChangeNotice, DirtyMark, DirtySink, NotificationBus, ReloadTarget, Subscriber,
};
use crate::cache::ReconciliationCache;
use crate::dirty::DirtyQueue;
use crate::error::{SyncError, SyncResult};
use crate::pending::{PendingTracker, ResourceKind};
use crate::protocol::{
    DataAction, FetchRequest, PushMessage, ServerEvent, Signal, EVENT_TOPIC, PUSH_METHOD,
    PUSH_TOPIC,
};
use crate::status::{PropertyStatus, StatusTable};
use crate::transport::{TopicReceiver, Transport};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use simput_types::{DirtyEntry, DomainMap, Item, ItemId, Properties, UiDescriptor};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "simput";

/// Quiet period before a query is pushed to listeners.
pub const DEFAULT_QUERY_DEBOUNCE: Duration = Duration::from_millis(250);

/// Configuration for a data manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Prefix of every outbound event name (`<namespace>Fetch`, ...).
    pub namespace: String,
    /// Debounce applied by channels before emitting a query.
    pub query_debounce: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            query_debounce: DEFAULT_QUERY_DEBOUNCE,
        }
    }
}

impl ManagerConfig {
    /// Default configuration under another namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct CoreState {
    cache: ReconciliationCache,
    pending: PendingTracker,
    dirty: DirtyQueue,
    status: StatusTable,
}

impl CoreState {
    /// Writes queued edits of `id` back over a freshly replaced item so the
    /// view keeps showing what the user typed.
    fn reapply_queued_edits(&mut self, id: &ItemId) {
        for entry in self.dirty.entries().iter().filter(|e| e.id == *id) {
            self.cache.set_property(id, &entry.name, entry.value.clone());
        }
    }
}

struct Topics {
    pushes: TopicReceiver,
    events: TopicReceiver,
}

/// Synchronization core for one remote session.
pub struct DataManager {
    id: String,
    config: ManagerConfig,
    transport: Arc<dyn Transport>,
    state: Mutex<CoreState>,
    bus: Mutex<NotificationBus>,
    topics: Mutex<Option<Topics>>,
    me: Weak<DataManager>,
}

impl DataManager {
    /// Creates a core bound to `transport`, subscribes to the push topics and
    /// asks the server to discard any client state it holds for us.
    ///
    /// Pushes are buffered until [`DataManager::listen`] starts consuming them.
    pub fn new(
        id: impl Into<String>,
        config: ManagerConfig,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let topics = Topics {
            pushes: transport.subscribe(PUSH_TOPIC),
            events: transport.subscribe(EVENT_TOPIC),
        };
        let manager = Arc::new_cyclic(|me| Self {
            id: id.into(),
            config,
            transport,
            state: Mutex::new(CoreState::default()),
            bus: Mutex::new(NotificationBus::new()),
            topics: Mutex::new(Some(topics)),
            me: me.clone(),
        });
        manager.dispatch(Signal::ResetCache);
        manager
    }

    /// Spawns the task consuming pushes and events. Returns `None` if it is
    /// already running or there is no runtime to run it on.
    ///
    /// The task holds only a weak reference and stops once the core is
    /// dropped or the transport closes both topics. It never waits on an
    /// update acknowledgement: the flush following a push runs as its own task.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            debug!("Manager {} has no runtime to listen on", self.id);
            return None;
        };
        let Topics {
            mut pushes,
            mut events,
        } = lock(&self.topics).take()?;
        let me = Arc::downgrade(self);
        let id = self.id.clone();

        Some(runtime.spawn(async move {
            loop {
                let (topic, payload) = tokio::select! {
                    Some(payload) = pushes.recv() => (PUSH_TOPIC, payload),
                    Some(payload) = events.recv() => (EVENT_TOPIC, payload),
                    else => break,
                };
                let Some(manager) = me.upgrade() else {
                    break;
                };
                match manager.apply_payload(topic, payload) {
                    Ok(true) => manager.spawn_flush(),
                    Ok(false) => {}
                    Err(e) => warn!("Manager {} failed to handle {}: {}", id, topic, e),
                }
            }
            debug!("Manager {} stopped listening", id);
        }))
    }

    fn state(&self) -> MutexGuard<'_, CoreState> {
        lock(&self.state)
    }

    fn bus(&self) -> MutexGuard<'_, NotificationBus> {
        lock(&self.bus)
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Registry id of this core.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// UI change counter; bumps whenever a descriptor arrives.
    pub fn ui_timestamp(&self) -> u64 {
        self.state().cache.ui_timestamp()
    }

    pub fn property_status(&self, id: &ItemId, name: &str) -> PropertyStatus {
        self.state().status.get(id, name)
    }

    /// Properties of `id` that are not synced with the server.
    pub fn unsynced_properties(&self, id: &ItemId) -> Vec<(String, PropertyStatus)> {
        self.state().status.unsynced(id)
    }

    /// Properties the server is believed to hold for `id`.
    pub fn expected_properties(&self, id: &ItemId) -> Option<Properties> {
        self.state().cache.expected(id).cloned()
    }

    /// Edits waiting for the next flush.
    pub fn queued_edits(&self) -> Vec<DirtyEntry> {
        self.state().dirty.entries().to_vec()
    }

    pub fn is_pending(&self, kind: ResourceKind, key: &str) -> bool {
        self.state().pending.is_pending(kind, key)
    }

    /// Whether a dirty batch is awaiting its echo.
    pub fn flush_in_flight(&self) -> bool {
        self.state().pending.flush_in_flight()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus().len()
    }

    // ── Cache accessors ──────────────────────────────────────────

    /// Returns the cached item. When it is missing, or `force_fetch` is set,
    /// asks the server for it unless a fetch is already in flight. The answer
    /// arrives later as a push.
    pub fn get_data(&self, id: &ItemId, force_fetch: bool) -> Option<Item> {
        let (item, fetch) = {
            let mut state = self.state();
            let item = state.cache.data(id).cloned();
            let fetch = (item.is_none() || force_fetch)
                && state.pending.begin(ResourceKind::Data, id.as_str());
            (item, fetch)
        };
        if fetch {
            debug!("Fetching data for {} (forced: {})", id, force_fetch);
            self.dispatch(Signal::Fetch(FetchRequest::Data(id.clone())));
        }
        item
    }

    /// Like [`DataManager::get_data`], for domains.
    pub fn get_domains(&self, id: &ItemId, force_fetch: bool) -> Option<DomainMap> {
        let (domains, fetch) = {
            let mut state = self.state();
            let domains = state.cache.domains(id).cloned();
            let fetch = (domains.is_none() || force_fetch)
                && state.pending.begin(ResourceKind::Domains, id.as_str());
            (domains, fetch)
        };
        if fetch {
            debug!("Fetching domains for {} (forced: {})", id, force_fetch);
            self.dispatch(Signal::Fetch(FetchRequest::Domains(id.clone())));
        }
        domains
    }

    /// Like [`DataManager::get_data`], for the UI descriptor of a type.
    pub fn get_ui(&self, type_name: &str, force_fetch: bool) -> Option<UiDescriptor> {
        let (ui, fetch) = {
            let mut state = self.state();
            let ui = state.cache.ui(type_name).cloned();
            let fetch = (ui.is_none() || force_fetch)
                && state.pending.begin(ResourceKind::Ui, type_name);
            (ui, fetch)
        };
        if fetch {
            debug!("Fetching ui for {} (forced: {})", type_name, force_fetch);
            self.dispatch(Signal::Fetch(FetchRequest::Ui(type_name.to_string())));
        }
        ui
    }

    /// Drops every cached domain, and any domain fetch in flight, so the next
    /// [`DataManager::get_domains`] always asks the server.
    ///
    /// A domain fetch already outstanding is forgotten, so that id may briefly
    /// have two domain fetches in flight.
    pub fn reset_domains(&self) {
        let mut state = self.state();
        state.cache.reset_domains();
        state.pending.clear_kind(ResourceKind::Domains);
    }

    /// Drops the whole cache and every pending flag, then tells the server so
    /// it can resend a fresh baseline. This is also the recovery path for a
    /// request that never resolved.
    pub fn reset_cache(&self) {
        {
            let mut state = self.state();
            let state = &mut *state;
            state.cache.reset();
            state.pending.clear();
            state.status.clear();
            for entry in state.dirty.entries() {
                state.status.edited(&entry.id, &entry.name);
            }
        }
        info!("Manager {} reset its cache", self.id);
        self.dispatch(Signal::ResetCache);
    }

    /// Asks the server to recompute `name` on `id` from its domains.
    pub fn refresh(&self, id: &ItemId, name: &str) {
        debug!("Refreshing {}.{}", id, name);
        self.dispatch(Signal::Refresh {
            id: id.clone(),
            name: name.to_string(),
        });
    }

    /// Asks the server to publish the item and/or the UI descriptor again.
    pub async fn request_push(
        &self,
        id: Option<&ItemId>,
        type_name: Option<&str>,
    ) -> SyncResult<Value> {
        let args = vec![
            Value::from(self.id.as_str()),
            id.map_or(Value::Null, |id| Value::from(id.as_str())),
            type_name.map_or(Value::Null, Value::from),
        ];
        self.transport.call(PUSH_METHOD, args).await
    }

    // ── Local edits ──────────────────────────────────────────────

    /// Writes a local edit into the cached item without queuing it.
    pub fn set_property(&self, id: &ItemId, name: &str, value: Value) -> SyncResult<()> {
        let mut state = self.state();
        if !state.cache.set_property(id, name, value) {
            return Err(SyncError::UnknownItem(id.clone()));
        }
        state.status.edited(id, name);
        Ok(())
    }

    /// Writes a local edit and queues it for the server.
    pub async fn edit(&self, id: &ItemId, name: &str, value: Value) -> SyncResult<()> {
        self.set_property(id, name, value)?;
        self.mark_dirty(id, name).await
    }

    /// Queues the current cached value of `(id, name)` and tries to flush.
    pub async fn mark_dirty(&self, id: &ItemId, name: &str) -> SyncResult<()> {
        self.mark_dirty_many(id, &[name]).await
    }

    /// Queues the current cached values of several properties of `id`.
    pub async fn mark_dirty_many<S: AsRef<str>>(
        &self,
        id: &ItemId,
        names: &[S],
    ) -> SyncResult<()> {
        {
            let mut state = self.state();
            let state = &mut *state;
            let item = state
                .cache
                .data(id)
                .ok_or_else(|| SyncError::UnknownItem(id.clone()))?;
            let values: Vec<(&str, Value)> = names
                .iter()
                .map(|n| {
                    let name = n.as_ref();
                    (name, item.property(name).cloned().unwrap_or(Value::Null))
                })
                .collect();
            for (name, value) in values {
                state.dirty.mark(id.clone(), name, value);
                state.status.edited(id, name);
            }
            debug!("Queued {} dirty properties for {}", names.len(), id);
        }
        self.flush().await
    }

    /// Sends the queued edits as one batch, unless the queue is empty or a
    /// batch is still awaiting its echo. Keeps draining edits that arrive
    /// while a batch is in flight.
    ///
    /// A rejected batch leaves its items marked in flight; only
    /// [`DataManager::reset_cache`] reopens the gate.
    pub async fn flush(&self) -> SyncResult<()> {
        loop {
            let batch = {
                let mut state = self.state();
                let state = &mut *state;
                if state.dirty.is_empty() || state.pending.flush_in_flight() {
                    return Ok(());
                }
                let batch = state.dirty.take();
                for entry in &batch {
                    state.cache.expect(&entry.id, &entry.name, entry.value.clone());
                    state.pending.begin_flush(entry.id.clone());
                    state.status.sent(&entry.id, &entry.name);
                }
                batch
            };
            debug!("Flushing {} dirty entries", batch.len());
            self.send(&Signal::Update(batch)).await?;
        }
    }

    // ── Inbound ──────────────────────────────────────────────────

    /// Routes a raw topic payload, flushing after a push.
    pub async fn handle_payload(&self, topic: &str, payload: Value) -> SyncResult<()> {
        if self.apply_payload(topic, payload)? {
            self.flush().await?;
        }
        Ok(())
    }

    /// Routes a raw topic payload. Returns whether a push was applied.
    fn apply_payload(&self, topic: &str, payload: Value) -> SyncResult<bool> {
        match topic {
            PUSH_TOPIC => {
                self.apply_push(PushMessage::from_payload(payload)?);
                Ok(true)
            }
            EVENT_TOPIC => {
                self.handle_event(ServerEvent::from_payload(payload)?);
                Ok(false)
            }
            other => {
                debug!("Ignoring payload on topic {}", other);
                Ok(false)
            }
        }
    }

    /// Reconciles one push, notifies subscribers, then tries to flush.
    pub async fn handle_push(&self, message: PushMessage) -> SyncResult<()> {
        self.apply_push(message);
        self.flush().await
    }

    fn apply_push(&self, message: PushMessage) {
        let (notice, template_ts) = {
            let mut state = self.state();
            let state = &mut *state;
            let mut notice = ChangeNotice::default();
            let mut template_ts = None;

            if let Some(data) = message.data {
                match parse_item(message.id.as_ref(), data) {
                    Ok(item) => {
                        let id = item.id.clone();
                        state.pending.complete(ResourceKind::Data, id.as_str());
                        state.pending.complete_flush(&id);
                        state.status.confirmed(&id);
                        if state.cache.apply_data(item) {
                            state.reapply_queued_edits(&id);
                            notice.id = Some(id);
                        }
                    }
                    Err(e) => warn!("Skipping malformed data push: {}", e),
                }
            }

            if let Some(domains) = message.domains {
                match (&message.id, DomainMap::from_value(domains)) {
                    (Some(id), Ok(domains)) => {
                        state.pending.complete(ResourceKind::Domains, id.as_str());
                        if state.cache.apply_domains(id.clone(), domains) {
                            notice.id = Some(id.clone());
                        }
                    }
                    (None, _) => warn!("Skipping domains push without an id"),
                    (_, Err(e)) => warn!("Skipping malformed domains push: {}", e),
                }
            }

            if let Some(ui) = message.ui {
                match message.type_name {
                    Some(type_name) => {
                        state.pending.complete(ResourceKind::Ui, &type_name);
                        template_ts =
                            Some(state.cache.apply_ui(type_name.clone(), UiDescriptor::new(ui)));
                        notice.type_name = Some(type_name);
                    }
                    None => warn!("Skipping ui push without a type"),
                }
            }

            (notice, template_ts)
        };

        self.notify(BusEvent::Change(notice));
        if let Some(ts) = template_ts {
            self.notify(BusEvent::TemplateTs(ts));
        }
    }

    /// Applies an invalidation event from the server.
    pub fn handle_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::UiChange => {
                let mut types = {
                    let mut state = self.state();
                    state.cache.reset_domains();
                    state.cache.clear_ui()
                };
                types.sort();
                info!("UI definitions changed, refetching {} templates", types.len());
                for type_name in types {
                    self.get_ui(&type_name, false);
                }
            }
            ServerEvent::DataChange {
                ids,
                action: DataAction::Changed,
            } => {
                for id in ids {
                    let cached = self.state().cache.contains_data(&id);
                    if cached {
                        self.get_data(&id, true);
                    }
                }
            }
            ServerEvent::DataChange { action, .. } => {
                debug!("Ignoring data-change with action {:?}", action);
            }
            ServerEvent::Unknown => debug!("Ignoring unknown server event"),
        }
    }

    // ── Bus ──────────────────────────────────────────────────────

    /// Connects a subscriber. It immediately receives `Connect` and its dirty
    /// marks start flowing into this core. Connecting twice is a no-op.
    pub fn connect_bus(&self, subscriber: Arc<dyn Subscriber>) {
        if !self.bus().connect(subscriber.clone()) {
            return;
        }
        debug!("Manager {} connected a subscriber", self.id);
        subscriber.notify(&BusEvent::Connect);
        let sink: Weak<dyn DirtySink> = self.me.clone();
        subscriber.bind_dirty(Some(sink));
    }

    /// Disconnects a subscriber after sending it `Disconnect`. Unknown
    /// subscribers are ignored.
    pub fn disconnect_bus(&self, subscriber: &Arc<dyn Subscriber>) {
        if !self.bus().is_connected(subscriber) {
            return;
        }
        subscriber.notify(&BusEvent::Disconnect);
        subscriber.bind_dirty(None);
        self.bus().disconnect(subscriber);
        debug!("Manager {} disconnected a subscriber", self.id);
    }

    /// Delivers `event` to every connected subscriber, in connection order.
    pub fn notify(&self, event: BusEvent) {
        let subscribers = self.bus().subscribers();
        for subscriber in subscribers {
            subscriber.notify(&event);
        }
    }

    /// Asks every view to force-fetch `target`.
    pub fn reload(&self, target: ReloadTarget) {
        self.notify(BusEvent::Reload(target));
    }

    // ── Outbound ─────────────────────────────────────────────────

    fn send(&self, signal: &Signal) -> BoxFuture<'static, SyncResult<()>> {
        let event = signal.event_name(&self.config.namespace);
        match signal.args() {
            Ok(args) => self.transport.trigger(&event, args, signal.kwargs()),
            Err(e) => Box::pin(async move { Err(e) }),
        }
    }

    /// Runs [`DataManager::flush`] on the current runtime without waiting
    /// for it. A rejected batch is logged and keeps the gate closed.
    fn spawn_flush(&self) {
        let Some(manager) = self.me.upgrade() else {
            return;
        };
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = manager.flush().await {
                        warn!("Manager {} failed to flush: {}", manager.id, e);
                    }
                });
            }
            Err(_) => debug!("No runtime to flush manager {} on", self.id),
        }
    }

    /// Sends a signal without waiting for its acknowledgement. Failures are
    /// logged; pending flags set for the signal stay set.
    fn dispatch(&self, signal: Signal) {
        let event = signal.event_name(&self.config.namespace);
        let ack = self.send(&signal);
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = ack.await {
                        warn!("Signal {} failed: {}", event, e);
                    }
                });
            }
            Err(_) => debug!("No runtime to await acknowledgement of {}", event),
        }
    }
}

#[async_trait]
impl DirtySink for DataManager {
    async fn on_dirty(&self, mark: DirtyMark) -> SyncResult<()> {
        match mark {
            DirtyMark::One { id, name } => self.mark_dirty(&id, &name).await,
            DirtyMark::Many { id, names } => self.mark_dirty_many(&id, &names).await,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parses pushed item data, keyed by the push id when present.
fn parse_item(push_id: Option<&ItemId>, mut data: Value) -> SyncResult<Item> {
    if let (Some(id), Value::Object(map)) = (push_id, &mut data) {
        map.entry("id")
            .or_insert_with(|| Value::from(id.as_str()));
    }
    let mut item = Item::from_value(data)?;
    if let Some(id) = push_id {
        item.id = id.clone();
    }
    Ok(item)
}
