//! Error types for the sync module.

use thiserror::Error;

use dagmerge_core::CoreError;
use dagmerge_store::StoreError;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The first byte of a message or persisted state was not the expected
    /// type marker.
    #[error("unexpected message type byte: {0:#04x}")]
    BadMessageType(u8),

    /// Malformed or truncated wire data.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),

    /// The backend failed; propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
