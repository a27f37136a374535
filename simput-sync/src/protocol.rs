//! Wire protocol between the client core and the remote authority.
//!
//! Outbound traffic is a small set of namespaced signals:
//! - `<ns>Fetch` with kwargs `{id}`, `{domains: id}` or `{type}`
//! - `<ns>Update` with one positional arg, the array of dirty entries
//! - `<ns>ResetCache` with no args
//! - `<ns>Refresh` with args `[id, name]`
//!
//! Inbound traffic arrives on two topics: [`PUSH_TOPIC`] carries data,
//! domains and UI descriptors, [`EVENT_TOPIC`] carries invalidation events.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use simput_types::{DirtyEntry, ItemId};

/// Topic carrying data/domains/ui pushes.
pub const PUSH_TOPIC: &str = "simput.push";

/// Topic carrying `ui-change` and `data-change` events.
pub const EVENT_TOPIC: &str = "simput.event";

/// RPC asking the server to republish an item and/or a UI descriptor.
pub const PUSH_METHOD: &str = "simput.push";

/// What a fetch asks the server to push back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRequest {
    Data(ItemId),
    Domains(ItemId),
    Ui(String),
}

impl FetchRequest {
    fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        match self {
            Self::Data(id) => kwargs.insert("id".into(), Value::from(id.as_str())),
            Self::Domains(id) => kwargs.insert("domains".into(), Value::from(id.as_str())),
            Self::Ui(type_name) => kwargs.insert("type".into(), Value::from(type_name.as_str())),
        };
        kwargs
    }

    fn from_kwargs(kwargs: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| kwargs.get(key).and_then(Value::as_str);
        if let Some(id) = text("id") {
            return Some(Self::Data(ItemId::from(id)));
        }
        if let Some(id) = text("domains") {
            return Some(Self::Domains(ItemId::from(id)));
        }
        text("type").map(|t| Self::Ui(t.to_string()))
    }
}

/// An outbound signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Fetch(FetchRequest),
    Update(Vec<DirtyEntry>),
    ResetCache,
    Refresh { id: ItemId, name: String },
}

impl Signal {
    /// The namespaced event name this signal is triggered under.
    pub fn event_name(&self, namespace: &str) -> String {
        let suffix = match self {
            Self::Fetch(_) => "Fetch",
            Self::Update(_) => "Update",
            Self::ResetCache => "ResetCache",
            Self::Refresh { .. } => "Refresh",
        };
        format!("{namespace}{suffix}")
    }

    /// Positional arguments.
    pub fn args(&self) -> SyncResult<Vec<Value>> {
        Ok(match self {
            Self::Fetch(_) | Self::ResetCache => Vec::new(),
            Self::Update(entries) => vec![serde_json::to_value(entries)?],
            Self::Refresh { id, name } => {
                vec![Value::from(id.as_str()), Value::from(name.as_str())]
            }
        })
    }

    /// Keyword arguments, only used by fetches.
    pub fn kwargs(&self) -> Option<Map<String, Value>> {
        match self {
            Self::Fetch(request) => Some(request.kwargs()),
            _ => None,
        }
    }

    /// Rebuilds a signal from its wire form. Returns `None` for events that
    /// do not belong to `namespace` or carry unexpected arguments.
    pub fn parse(
        namespace: &str,
        event: &str,
        args: &[Value],
        kwargs: Option<&Map<String, Value>>,
    ) -> Option<Self> {
        match event.strip_prefix(namespace)? {
            "Fetch" => kwargs.and_then(FetchRequest::from_kwargs).map(Self::Fetch),
            "Update" => {
                let entries = serde_json::from_value(args.first()?.clone()).ok()?;
                Some(Self::Update(entries))
            }
            "ResetCache" => Some(Self::ResetCache),
            "Refresh" => Some(Self::Refresh {
                id: serde_json::from_value(args.first()?.clone()).ok()?,
                name: args.get(1)?.as_str()?.to_string(),
            }),
            _ => None,
        }
    }
}

/// A push on [`PUSH_TOPIC`]. Any subset of the payload fields may be present.
///
/// `data`, `domains` and `ui` stay raw until the core interprets them, so a
/// malformed field is skipped without discarding its siblings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<Value>,
}

impl PushMessage {
    /// Parses a topic payload. Accepts the bare object or the
    /// `[object]` argument list some transports deliver.
    pub fn from_payload(payload: Value) -> SyncResult<Self> {
        Ok(serde_json::from_value(unwrap_args(payload)?)?)
    }

    /// A data push for `id`.
    pub fn data(id: impl Into<ItemId>, data: Value) -> Self {
        Self {
            id: Some(id.into()),
            data: Some(data),
            ..Self::default()
        }
    }

    /// A domains push for `id`.
    pub fn domains(id: impl Into<ItemId>, domains: Value) -> Self {
        Self {
            id: Some(id.into()),
            domains: Some(domains),
            ..Self::default()
        }
    }

    /// A UI descriptor push for `type_name`.
    pub fn ui(type_name: impl Into<String>, ui: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ui: Some(ui),
            ..Self::default()
        }
    }
}

/// An event on [`EVENT_TOPIC`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum ServerEvent {
    /// UI definitions changed; every cached template is stale.
    #[serde(rename = "ui-change")]
    UiChange,

    /// Server-side data changed for the listed items.
    #[serde(rename = "data-change")]
    DataChange {
        #[serde(default)]
        ids: Vec<ItemId>,
        #[serde(default)]
        action: DataAction,
    },

    /// Any topic this client does not handle.
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Parses a topic payload, like [`PushMessage::from_payload`].
    pub fn from_payload(payload: Value) -> SyncResult<Self> {
        Ok(serde_json::from_value(unwrap_args(payload)?)?)
    }
}

/// What happened to the items of a `data-change` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataAction {
    Changed,
    #[default]
    #[serde(other)]
    Other,
}

fn unwrap_args(payload: Value) -> SyncResult<Value> {
    match payload {
        Value::Array(mut args) => {
            if args.len() != 1 {
                return Err(SyncError::MalformedPayload(format!(
                    "expected a single argument, got {}",
                    args.len()
                )));
            }
            Ok(args.remove(0))
        }
        other => Ok(other),
    }
}
