//! # dagmerge core
//!
//! Pure primitives for the dagmerge sync protocol: change hashes, change
//! blobs, and the byte-level wire codec.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`ChangeHash`] - Content-addressed identifier of a change (SHA-256, 32 bytes)
//! - [`Change`] - An opaque change blob plus the metadata the sync layer may see
//! - [`Encoder`] / [`Decoder`] - Little-endian wire codec primitives
//!
//! ## Wire conventions
//!
//! All integers on the wire are unsigned 32-bit little-endian. Hash vectors
//! are length-prefixed and strictly ascending by hex rendering (which equals
//! byte order). See the [`codec`] module.

pub mod change;
pub mod codec;
pub mod error;
pub mod hash;

pub use change::{change_checksum, decode_change_meta, Change, ChangeBuilder, ChangeMeta};
pub use codec::{Decoder, Encoder};
pub use error::{CoreError, Result};
pub use hash::ChangeHash;

/// Length of a change hash in bytes.
pub const HASH_LEN: usize = 32;
