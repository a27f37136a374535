//! Core type definitions for the Simput client.
//!
//! This crate defines the value types shared by the synchronization core and
//! the view bindings:
//! - Item identifiers and items (editable property sets)
//! - Validation domains with their decorators and hints
//! - UI descriptors (per-type templates)
//! - Dirty entries (queued local edits)
//!
//! Nothing here talks to the network; see `simput-sync` for that.

mod domain;
mod ids;
mod item;
mod ui;

pub use domain::{Decorator, DomainMap, DomainState, Hint, HintLevel, PropertyDomains};
pub use ids::ItemId;
pub use item::{DirtyEntry, Item, Properties};
pub use ui::UiDescriptor;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),
}
