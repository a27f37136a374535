//! Error types for the sync layer.

use simput_types::ItemId;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The transport rejected a call or signal.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A payload could not be interpreted.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An edit referenced an item that is not cached.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}

impl From<simput_types::Error> for SyncError {
    fn from(err: simput_types::Error) -> Self {
        match err {
            simput_types::Error::Serialization(e) => Self::Serialization(e),
            other => Self::MalformedPayload(other.to_string()),
        }
    }
}
