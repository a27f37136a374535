//! UI descriptors: one resolved template per item type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Template/schema shared by all items of one type.
///
/// The client never interprets the layout; it only caches and hands it to
/// whatever renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiDescriptor(Value);

impl UiDescriptor {
    /// Wraps a raw descriptor payload.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// The descriptor as markup, when the server resolved it to a string.
    pub fn template(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// The raw payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
