//! Error types for the store module.

use thiserror::Error;

use dagmerge_core::{ChangeHash, CoreError};

/// Errors that can occur during backend operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A change could not be applied because a dependency is absent.
    #[error("missing dependency: {0}")]
    MissingDependency(ChangeHash),

    /// Stored data failed to decode.
    #[error("corrupt change data: {0}")]
    Corrupt(String),

    /// Error from the core codec.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
