//! Subscriber-side event channel.
//!
//! A [`SimputChannel`] is what views connect to a core's bus. It fans bus
//! events out to typed listeners, forwards dirty marks back to the core and
//! debounces the search query.

use crate::bus::{BusEvent, DirtyMark, DirtySink, EventKind, Subscriber};
use crate::error::SyncResult;
use crate::manager::DEFAULT_QUERY_DEBOUNCE;
use simput_types::ItemId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle returned by [`SimputChannel::on`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct ChannelState {
    listeners: Vec<Listener>,
    next_id: u64,
    sink: Option<Weak<dyn DirtySink>>,
    query: String,
    pending_query: Option<JoinHandle<()>>,
}

/// Event emitter sitting between a core and its views.
pub struct SimputChannel {
    state: Mutex<ChannelState>,
    debounce: Duration,
    me: Weak<SimputChannel>,
}

impl SimputChannel {
    /// Creates a channel with the default query debounce.
    pub fn new() -> Arc<Self> {
        Self::with_debounce(DEFAULT_QUERY_DEBOUNCE)
    }

    pub fn with_debounce(debounce: Duration) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            state: Mutex::new(ChannelState::default()),
            debounce,
            me: me.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, kind: EventKind, once: bool, handler: Handler) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state.listeners.push(Listener {
            id,
            kind,
            once,
            handler,
        });
        id
    }

    /// Calls `handler` for every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add(kind, false, Arc::new(handler))
    }

    /// Calls `handler` for the next event of `kind` only.
    pub fn once<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add(kind, true, Arc::new(handler))
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut state = self.state();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.id != id);
        state.listeners.len() != before
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.state()
            .listeners
            .iter()
            .filter(|l| l.kind == kind)
            .count()
    }

    /// Calls the listeners of `event`'s kind in registration order. Listeners
    /// run without the channel locked and may register or remove listeners.
    pub fn emit(&self, event: &BusEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let mut state = self.state();
            let handlers = state
                .listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| Arc::clone(&l.handler))
                .collect();
            state.listeners.retain(|l| !(l.once && l.kind == kind));
            handlers
        };
        for handler in handlers {
            handler(event);
        }
    }

    // ── Dirty marks ──────────────────────────────────────────────

    /// Whether a core is receiving this channel's dirty marks.
    pub fn is_bound(&self) -> bool {
        self.sink().is_some()
    }

    fn sink(&self) -> Option<Arc<dyn DirtySink>> {
        self.state().sink.as_ref().and_then(Weak::upgrade)
    }

    async fn forward(&self, mark: DirtyMark) -> SyncResult<()> {
        match self.sink() {
            Some(sink) => sink.on_dirty(mark).await,
            None => {
                debug!("Dropping dirty mark on an unbound channel: {:?}", mark);
                Ok(())
            }
        }
    }

    /// Reports a local edit of one property to the bound core.
    pub async fn mark_dirty(&self, id: &ItemId, name: &str) -> SyncResult<()> {
        self.forward(DirtyMark::One {
            id: id.clone(),
            name: name.to_string(),
        })
        .await
    }

    /// Reports local edits of several properties of one item.
    pub async fn mark_dirty_many<S: AsRef<str>>(
        &self,
        id: &ItemId,
        names: &[S],
    ) -> SyncResult<()> {
        self.forward(DirtyMark::Many {
            id: id.clone(),
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
        })
        .await
    }

    // ── Query ────────────────────────────────────────────────────

    /// Current query text, as typed.
    pub fn query(&self) -> String {
        self.state().query.clone()
    }

    /// Updates the query text without notifying anyone.
    pub fn set_query(&self, text: impl Into<String>) {
        self.state().query = text.into();
    }

    /// Emits `Query` with the lowercased query once no other push arrives
    /// for the debounce period. Emits immediately outside a runtime.
    pub fn push_query(&self) {
        let Ok(runtime) = Handle::try_current() else {
            self.emit_query();
            return;
        };
        let me = self.me.clone();
        let debounce = self.debounce;
        let task = runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(channel) = me.upgrade() {
                channel.emit_query();
            }
        });
        if let Some(previous) = self.state().pending_query.replace(task) {
            previous.abort();
        }
    }

    fn emit_query(&self) {
        let query = self.state().query.to_lowercase();
        self.emit(&BusEvent::Query(query));
    }
}

impl Subscriber for SimputChannel {
    fn notify(&self, event: &BusEvent) {
        self.emit(event);
    }

    fn bind_dirty(&self, sink: Option<Weak<dyn DirtySink>>) {
        self.state().sink = sink;
    }
}

impl Drop for SimputChannel {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = state.pending_query.take() {
            task.abort();
        }
    }
}
