//! Error types for the dagmerge core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding protocol data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("hash vector is not strictly ascending")]
    UnsortedHashes,

    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("bad change magic")]
    BadMagic,

    #[error("malformed change: {0}")]
    MalformedChange(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
