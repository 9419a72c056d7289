//! Byte-level wire codec primitives.
//!
//! Everything on the wire is sequential with no padding: unsigned 32-bit
//! little-endian integers, length-prefixed byte strings, and length-prefixed
//! hash vectors. Hash vectors must be strictly ascending when encoded;
//! decoding returns whatever order was on the wire.

use crate::error::{CoreError, Result};
use crate::hash::ChangeHash;
use crate::HASH_LEN;

/// Appends wire-format primitives to a growing buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the encoder, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append a single byte.
    pub fn push_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a little-endian u32.
    pub fn push_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append raw bytes with no prefix.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a u32-LE length prefix followed by the bytes.
    pub fn push_prefixed_bytes(&mut self, bytes: &[u8]) {
        self.push_u32_le(bytes.len() as u32);
        self.push_bytes(bytes);
    }

    /// Append a length-prefixed hash vector.
    ///
    /// The input must be strictly ascending; equal adjacent hashes or any
    /// out-of-order pair is an invariant violation.
    pub fn push_hashes(&mut self, hashes: &[ChangeHash]) -> Result<()> {
        for pair in hashes.windows(2) {
            if pair[0] >= pair[1] {
                return Err(CoreError::UnsortedHashes);
            }
        }
        self.push_u32_le(hashes.len() as u32);
        for hash in hashes {
            self.push_bytes(hash.as_bytes());
        }
        Ok(())
    }
}

/// Reads wire-format primitives from a byte slice, tracking an offset.
///
/// Trailing bytes after the caller has read everything it understands are
/// simply left unread.
#[derive(Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over the given bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Read exactly `len` bytes.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(CoreError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    /// Read a u32-LE length prefix followed by that many bytes.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32_le()? as usize;
        self.read_exact(len)
    }

    /// Read a length-prefixed hash vector, preserving wire order.
    pub fn read_hashes(&mut self) -> Result<Vec<ChangeHash>> {
        let count = self.read_u32_le()? as usize;
        // Cap the pre-allocation so a bogus count can't balloon memory.
        let mut hashes = Vec::with_capacity(count.min(self.remaining() / HASH_LEN + 1));
        for _ in 0..count {
            let bytes = self.read_exact(HASH_LEN)?;
            hashes.push(ChangeHash::try_from(bytes)?);
        }
        Ok(hashes)
    }
}
