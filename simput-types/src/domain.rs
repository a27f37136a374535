//! Validation domains computed by the server for each property.
//!
//! A domain payload maps property names to a record of named domains plus a
//! property-level `hints` list:
//!
//! ```json
//! {
//!   "Scalar": {
//!     "Range": { "valid": true, "available": [0.5, 123.5] },
//!     "decorator": { "available": { "show": true, "enable": false, "query": true } },
//!     "hints": [{ "level": 0, "message": "Outside of range (0.5, 123.5)" }]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-item domain payload, keyed by property name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainMap(Map<String, Value>);

impl DomainMap {
    /// Wraps a raw property map.
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parses a domain payload.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Domains attached to one property.
    pub fn property(&self, name: &str) -> Option<PropertyDomains<'_>> {
        self.0
            .get(name)
            .and_then(Value::as_object)
            .map(|entries| PropertyDomains { entries })
    }

    /// Decorator for a property, all-true when the server sent none.
    pub fn decorator(&self, name: &str) -> Decorator {
        self.property(name)
            .map(|p| p.decorator())
            .unwrap_or_default()
    }

    /// Hints for a property, empty when the server sent none.
    pub fn hints(&self, name: &str) -> Vec<Hint> {
        self.property(name).map(|p| p.hints()).unwrap_or_default()
    }

    /// Property names with domain information.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Borrowed view of the domains attached to a single property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDomains<'a> {
    entries: &'a Map<String, Value>,
}

impl<'a> PropertyDomains<'a> {
    /// A named domain record (e.g. `Range`, `LabelList`).
    pub fn domain(&self, name: &str) -> Option<DomainState> {
        self.entries
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Visibility/enablement flags from the `decorator` domain.
    pub fn decorator(&self) -> Decorator {
        self.entries
            .get("decorator")
            .and_then(|d| d.get("available"))
            .and_then(|a| serde_json::from_value(a.clone()).ok())
            .unwrap_or_default()
    }

    /// Property-level hints. Malformed entries are skipped.
    pub fn hints(&self) -> Vec<Hint> {
        self.entries
            .get("hints")
            .and_then(Value::as_array)
            .map(|hints| {
                hints
                    .iter()
                    .filter_map(|h| serde_json::from_value(h.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Widget option from the `UI` record (e.g. `layout`, `sizeControl`).
    pub fn ui_option(&self, key: &str) -> Option<&'a Value> {
        self.entries.get("UI").and_then(|ui| ui.get(key))
    }
}

/// State of one named domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainState {
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub available: Value,
}

/// Visibility flags controlling how a field is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorator {
    #[serde(default = "default_true")]
    pub show: bool,
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_true")]
    pub query: bool,
}

impl Default for Decorator {
    fn default() -> Self {
        Self {
            show: true,
            enable: true,
            query: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A validation hint attached to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub level: HintLevel,
    #[serde(default)]
    pub message: String,
}

/// Hint severity. The server sends `0`, `1` or `2`; anything else is `Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum HintLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl From<i64> for HintLevel {
    fn from(level: i64) -> Self {
        match level {
            0 => Self::Info,
            1 => Self::Warning,
            2 => Self::Error,
            _ => Self::Success,
        }
    }
}

impl From<HintLevel> for i64 {
    fn from(level: HintLevel) -> Self {
        match level {
            HintLevel::Info => 0,
            HintLevel::Warning => 1,
            HintLevel::Error => 2,
            HintLevel::Success => -1,
        }
    }
}
