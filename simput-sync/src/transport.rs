//! Transport layer abstraction.
//!
//! The core never owns a socket. It talks to the remote authority through
//! [`Transport`], which offers request/response calls, fire-and-forget
//! signals and topic subscriptions over one persistent connection.

use crate::error::SyncResult;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Stream of payloads published on one topic.
pub type TopicReceiver = mpsc::UnboundedReceiver<Value>;

/// A persistent connection to the remote authority.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Calls a remote method and waits for its result.
    async fn call(&self, method: &str, args: Vec<Value>) -> SyncResult<Value>;

    /// Sends a signal.
    ///
    /// The signal is handed to the connection before this returns. The
    /// returned future resolves once the remote acknowledged it; dropping
    /// the future does not retract the signal.
    fn trigger(
        &self,
        event: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> BoxFuture<'static, SyncResult<()>>;

    /// Subscribes to a topic. Payloads are delivered in publish order until
    /// the transport shuts down.
    fn subscribe(&self, topic: &str) -> TopicReceiver;
}

/// An in-memory transport for testing.
pub mod mock {
    use super::*;
    use crate::error::SyncError;
    use crate::protocol::{FetchRequest, Signal};
    use simput_types::DirtyEntry;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::Semaphore;

    /// A signal as it was handed to the transport.
    #[derive(Debug, Clone, PartialEq)]
    pub struct TriggerRecord {
        pub event: String,
        pub args: Vec<Value>,
        pub kwargs: Option<Map<String, Value>>,
    }

    /// A remote call as it was issued.
    #[derive(Debug, Clone, PartialEq)]
    pub struct CallRecord {
        pub method: String,
        pub args: Vec<Value>,
    }

    #[derive(Default)]
    struct MockState {
        triggers: Vec<TriggerRecord>,
        calls: Vec<CallRecord>,
        subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Value>>>,
        call_responses: HashMap<String, Value>,
        failing: HashSet<String>,
        held: HashSet<String>,
    }

    /// Records every signal and call, and lets tests publish pushes.
    ///
    /// Acknowledgements for held events (see [`MockTransport::hold`]) only
    /// resolve after [`MockTransport::release`], which is how tests keep a
    /// flush in flight.
    #[derive(Clone)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
        gate: Arc<Semaphore>,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransport {
        /// Creates a new mock transport.
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState::default())),
                gate: Arc::new(Semaphore::new(0)),
            }
        }

        fn state(&self) -> MutexGuard<'_, MockState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Holds acknowledgements for `event` until released.
        pub fn hold(&self, event: impl Into<String>) {
            self.state().held.insert(event.into());
        }

        /// Releases `count` held acknowledgements.
        pub fn release(&self, count: usize) {
            self.gate.add_permits(count);
        }

        /// Makes every later `event` signal or `method` call fail.
        pub fn fail(&self, name: impl Into<String>) {
            self.state().failing.insert(name.into());
        }

        /// Sets the value returned by `method`.
        pub fn respond(&self, method: impl Into<String>, value: Value) {
            self.state().call_responses.insert(method.into(), value);
        }

        /// Publishes a payload to every live subscriber of `topic`.
        /// Returns how many subscribers received it.
        pub fn publish(&self, topic: &str, payload: Value) -> usize {
            let mut state = self.state();
            let Some(subscribers) = state.subscribers.get_mut(topic) else {
                return 0;
            };
            subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
            subscribers.len()
        }

        /// Number of live subscribers on `topic`.
        pub fn subscriber_count(&self, topic: &str) -> usize {
            self.state()
                .subscribers
                .get(topic)
                .map_or(0, |subs| subs.iter().filter(|tx| !tx.is_closed()).count())
        }

        /// Every signal handed to the transport so far.
        pub fn triggers(&self) -> Vec<TriggerRecord> {
            self.state().triggers.clone()
        }

        /// Every remote call issued so far.
        pub fn calls(&self) -> Vec<CallRecord> {
            self.state().calls.clone()
        }

        /// Signals of `namespace`, decoded.
        pub fn signals(&self, namespace: &str) -> Vec<Signal> {
            self.state()
                .triggers
                .iter()
                .filter_map(|t| Signal::parse(namespace, &t.event, &t.args, t.kwargs.as_ref()))
                .collect()
        }

        /// Fetch requests of `namespace`, in issue order.
        pub fn fetches(&self, namespace: &str) -> Vec<FetchRequest> {
            self.signals(namespace)
                .into_iter()
                .filter_map(|s| match s {
                    Signal::Fetch(request) => Some(request),
                    _ => None,
                })
                .collect()
        }

        /// Update batches of `namespace`, in issue order.
        pub fn updates(&self, namespace: &str) -> Vec<Vec<DirtyEntry>> {
            self.signals(namespace)
                .into_iter()
                .filter_map(|s| match s {
                    Signal::Update(batch) => Some(batch),
                    _ => None,
                })
                .collect()
        }

        /// Forgets recorded signals and calls.
        pub fn clear(&self) {
            let mut state = self.state();
            state.triggers.clear();
            state.calls.clear();
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn call(&self, method: &str, args: Vec<Value>) -> SyncResult<Value> {
            let mut state = self.state();
            state.calls.push(CallRecord {
                method: method.to_string(),
                args,
            });
            if state.failing.contains(method) {
                return Err(SyncError::Transport(format!("{method} rejected")));
            }
            Ok(state
                .call_responses
                .get(method)
                .cloned()
                .unwrap_or(Value::Null))
        }

        fn trigger(
            &self,
            event: &str,
            args: Vec<Value>,
            kwargs: Option<Map<String, Value>>,
        ) -> BoxFuture<'static, SyncResult<()>> {
            let mut state = self.state();
            state.triggers.push(TriggerRecord {
                event: event.to_string(),
                args,
                kwargs,
            });
            let held = state.held.contains(event);
            let failure = state
                .failing
                .contains(event)
                .then(|| SyncError::Transport(format!("{event} rejected")));
            drop(state);

            let gate = self.gate.clone();
            Box::pin(async move {
                if held {
                    gate.acquire()
                        .await
                        .map_err(|_| SyncError::ChannelClosed)?
                        .forget();
                }
                match failure {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            })
        }

        fn subscribe(&self, topic: &str) -> TopicReceiver {
            let (tx, rx) = mpsc::unbounded_channel();
            self.state()
                .subscribers
                .entry(topic.to_string())
                .or_default()
                .push(tx);
            rx
        }
    }
}
