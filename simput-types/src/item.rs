//! Item types: the server-owned property sets the client edits.

use crate::ItemId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property name to JSON value.
pub type Properties = Map<String, Value>;

/// A server-owned object with editable properties.
///
/// `original` is not sent by the server; the client fills it with the
/// last-known-good server properties so views can tell which fields were
/// edited locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned id.
    pub id: ItemId,
    /// Type tag selecting the UI descriptor.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-side tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Server modification time.
    #[serde(default)]
    pub mtime: u64,
    /// Ids of the items this one owns.
    #[serde(default)]
    pub own: Vec<ItemId>,
    /// Current property values.
    #[serde(default)]
    pub properties: Properties,
    /// Snapshot of the last server-confirmed properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Properties>,
    /// Fields this client does not interpret, preserved as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Creates an empty item of the given type.
    pub fn new(id: impl Into<ItemId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: Some(type_name.into()),
            name: None,
            tags: Vec::new(),
            mtime: 0,
            own: Vec::new(),
            properties: Properties::new(),
            original: None,
            extra: Map::new(),
        }
    }

    /// Adds a property value.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Parses an item from a JSON payload.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns a property value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a property value, returning the previous one.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    /// Whether a property differs from the last server-confirmed snapshot.
    /// Items without a snapshot report no modification.
    pub fn is_modified(&self, name: &str) -> bool {
        match &self.original {
            Some(original) => original.get(name) != self.properties.get(name),
            None => false,
        }
    }

    /// Names of all properties that differ from the snapshot.
    pub fn modified_properties(&self) -> Vec<&str> {
        self.properties
            .keys()
            .filter(|name| self.is_modified(name))
            .map(String::as_str)
            .collect()
    }
}

/// A queued local edit: the value a property had when it was marked dirty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub id: ItemId,
    pub name: String,
    pub value: Value,
}

impl DirtyEntry {
    /// Creates a new dirty entry.
    pub fn new(id: ItemId, name: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            name: name.into(),
            value,
        }
    }

    /// Whether this entry targets the same property as `(id, name)`.
    pub fn targets(&self, id: &ItemId, name: &str) -> bool {
        self.id == *id && self.name == name
    }
}
