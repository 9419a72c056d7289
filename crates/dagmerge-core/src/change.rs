//! Change: the atomic unit of the document DAG.
//!
//! A change is an opaque binary blob produced by the document layer. The
//! sync protocol inspects only three things about it: its content hash, its
//! explicit dependency hashes, and a 32-bit checksum at byte offset 4-7 used
//! for cheap deduplication. Everything else in the blob belongs to the
//! document layer.
//!
//! Blob container format:
//!
//! ```text
//! bytes 0..4   magic "dag1"
//! bytes 4..8   checksum: first 4 bytes of SHA-256 over the body (u32 LE)
//! body:
//!   hash-vector  deps       (sorted ascending)
//!   prefixed     payload    (u32 LE length, then bytes)
//! ```
//!
//! The change hash is SHA-256 over the entire blob.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::{Decoder, Encoder};
use crate::error::{CoreError, Result};
use crate::hash::ChangeHash;
use crate::HASH_LEN;

/// Magic bytes identifying a change blob.
pub const CHANGE_MAGIC: [u8; 4] = *b"dag1";

/// Byte offset of the checksum within a change blob.
pub const CHECKSUM_OFFSET: usize = 4;

/// The metadata the sync layer is allowed to see about a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMeta {
    /// Content hash of the blob.
    pub hash: ChangeHash,
    /// Hashes of the changes this change depends on.
    pub deps: Vec<ChangeHash>,
    /// The 32-bit checksum at bytes 4-7.
    pub checksum: u32,
}

/// A change blob together with its decoded metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    bytes: Bytes,
    hash: ChangeHash,
    deps: Vec<ChangeHash>,
    checksum: u32,
}

impl Change {
    /// Parse a change blob, validating the container.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        let meta = decode_change_meta(&bytes)?;
        Ok(Self {
            bytes,
            hash: meta.hash,
            deps: meta.deps,
            checksum: meta.checksum,
        })
    }

    /// The content hash of this change.
    pub fn hash(&self) -> ChangeHash {
        self.hash
    }

    /// The dependency hashes of this change.
    pub fn deps(&self) -> &[ChangeHash] {
        &self.deps
    }

    /// The deduplication checksum at bytes 4-7.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// The raw blob bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The raw blob, cheaply clonable.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// The document-layer payload carried by this change.
    pub fn payload(&self) -> &[u8] {
        // Container was validated in from_bytes, so offsets are in range.
        let deps_end = 8 + 4 + self.deps.len() * HASH_LEN;
        let len =
            u32::from_le_bytes(self.bytes[deps_end..deps_end + 4].try_into().expect("u32")) as usize;
        &self.bytes[deps_end + 4..deps_end + 4 + len]
    }
}

/// Decode the sync-visible metadata from a change blob.
pub fn decode_change_meta(bytes: &[u8]) -> Result<ChangeMeta> {
    let mut decoder = Decoder::new(bytes);

    let magic = decoder.read_exact(4)?;
    if magic != CHANGE_MAGIC {
        return Err(CoreError::BadMagic);
    }
    let checksum = decoder.read_u32_le()?;

    let body = &bytes[8..];
    let expected = checksum_over(body);
    if checksum != expected {
        return Err(CoreError::MalformedChange(format!(
            "checksum mismatch: header {checksum:#010x}, body {expected:#010x}"
        )));
    }

    let deps = decoder.read_hashes()?;
    decoder.read_prefixed_bytes()?;

    let hash = ChangeHash(Sha256::digest(bytes).into());
    Ok(ChangeMeta {
        hash,
        deps,
        checksum,
    })
}

/// Read the 32-bit deduplication checksum at bytes 4-7 of a blob.
pub fn change_checksum(bytes: &[u8]) -> Result<u32> {
    if bytes.len() < 8 {
        return Err(CoreError::UnexpectedEof {
            needed: 8,
            remaining: bytes.len(),
        });
    }
    Ok(u32::from_le_bytes(bytes[4..8].try_into().expect("u32")))
}

fn checksum_over(body: &[u8]) -> u32 {
    let digest = Sha256::digest(body);
    u32::from_le_bytes(digest[..4].try_into().expect("u32"))
}

/// Builder for creating change blobs.
pub struct ChangeBuilder {
    deps: Vec<ChangeHash>,
    payload: Bytes,
}

impl ChangeBuilder {
    /// Start building a change.
    pub fn new() -> Self {
        Self {
            deps: Vec::new(),
            payload: Bytes::new(),
        }
    }

    /// Add a dependency.
    pub fn dep(mut self, hash: ChangeHash) -> Self {
        self.deps.push(hash);
        self
    }

    /// Set all dependencies at once.
    pub fn deps(mut self, deps: Vec<ChangeHash>) -> Self {
        self.deps = deps;
        self
    }

    /// Set the payload.
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Encode the blob and compute its checksum and hash.
    pub fn build(mut self) -> Result<Change> {
        self.deps.sort();
        self.deps.dedup();

        let mut body = Encoder::new();
        body.push_hashes(&self.deps)?;
        body.push_prefixed_bytes(&self.payload);
        let body = body.into_bytes();

        let mut blob = Encoder::new();
        blob.push_bytes(&CHANGE_MAGIC);
        blob.push_u32_le(checksum_over(&body));
        blob.push_bytes(&body);

        Change::from_bytes(blob.into_bytes().into())
    }
}

impl Default for ChangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
