//! Sync protocol message types and their wire codec.
//!
//! Wire layout (sequential, no padding):
//!
//! ```text
//! byte 0x42
//! hash-vector  heads
//! hash-vector  need
//! uint32       have count
//!   repeated:
//!     hash-vector  last_sync
//!     prefixed     bloom bytes
//! uint32       change count
//!   repeated:
//!     prefixed     change blob
//! ```
//!
//! Trailing bytes after the final change are ignored so future revisions can
//! append fields. A first byte other than 0x42 is a fatal parse failure.

use bytes::Bytes;

use dagmerge_core::{Change, ChangeHash, Decoder, Encoder};

use crate::bloom::BloomFilter;
use crate::error::{Result, SyncError};

/// First byte of an encoded sync message, for identification.
pub const SYNC_MESSAGE_TYPE: u8 = 0x42;

/// A claim about what the sender already holds: everything reachable from
/// `last_sync`, plus whatever the Bloom filter matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Have {
    /// Heads of the last known sync point (sorted).
    pub last_sync: Vec<ChangeHash>,
    /// Filter over the sender's changes past `last_sync`.
    pub bloom: BloomFilter,
}

/// One round of the sync conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMessage {
    /// The sender's current heads (sorted).
    pub heads: Vec<ChangeHash>,
    /// Hashes the sender explicitly requests (sorted).
    pub need: Vec<ChangeHash>,
    /// Zero or more summaries of what the sender already holds.
    pub have: Vec<Have>,
    /// Change blobs being transmitted.
    pub changes: Vec<Change>,
}

impl SyncMessage {
    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.push_u8(SYNC_MESSAGE_TYPE);
        enc.push_hashes(&self.heads)?;
        enc.push_hashes(&self.need)?;

        enc.push_u32_le(self.have.len() as u32);
        for have in &self.have {
            enc.push_hashes(&have.last_sync)?;
            enc.push_prefixed_bytes(&have.bloom.to_bytes());
        }

        enc.push_u32_le(self.changes.len() as u32);
        for change in &self.changes {
            enc.push_prefixed_bytes(change.as_bytes());
        }
        Ok(enc.into_bytes())
    }

    /// Decode from wire bytes, ignoring any trailing data.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);

        let message_type = dec.read_u8()?;
        if message_type != SYNC_MESSAGE_TYPE {
            return Err(SyncError::BadMessageType(message_type));
        }

        let heads = dec.read_hashes()?;
        let need = dec.read_hashes()?;

        let have_count = dec.read_u32_le()?;
        let mut have = Vec::with_capacity(have_count.min(1024) as usize);
        for _ in 0..have_count {
            let last_sync = dec.read_hashes()?;
            let bloom = BloomFilter::from_bytes(dec.read_prefixed_bytes()?)?;
            have.push(Have { last_sync, bloom });
        }

        let change_count = dec.read_u32_le()?;
        let mut changes = Vec::with_capacity(change_count.min(1024) as usize);
        for _ in 0..change_count {
            let blob = dec.read_prefixed_bytes()?;
            changes.push(Change::from_bytes(Bytes::copy_from_slice(blob))?);
        }

        Ok(Self {
            heads,
            need,
            have,
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagmerge_core::{ChangeBuilder, CoreError};

    fn h(byte: u8) -> ChangeHash {
        ChangeHash::from_bytes([byte; 32])
    }

    #[test]
    fn test_empty_message_roundtrip() {
        let message = SyncMessage::default();
        let bytes = message.encode().unwrap();
        // type byte + four empty u32 counts
        assert_eq!(bytes.len(), 1 + 4 + 4 + 4 + 4);
        assert_eq!(SyncMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_full_message_roundtrip() {
        let change = ChangeBuilder::new()
            .payload(b"payload".to_vec())
            .build()
            .unwrap();
        let message = SyncMessage {
            heads: vec![h(0x01), h(0x02)],
            need: vec![h(0x03)],
            have: vec![
                Have::default(),
                Have {
                    last_sync: vec![h(0x04)],
                    bloom: BloomFilter::from_hashes(&[h(0x05)]),
                },
            ],
            changes: vec![change],
        };

        let bytes = message.encode().unwrap();
        let decoded = SyncMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_wrong_type_byte_fatal() {
        let mut bytes = SyncMessage::default().encode().unwrap();
        bytes[0] = 0x41;
        assert!(matches!(
            SyncMessage::decode(&bytes),
            Err(SyncError::BadMessageType(0x41))
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let message = SyncMessage {
            heads: vec![h(0x07)],
            ..Default::default()
        };
        let mut bytes = message.encode().unwrap();
        bytes.extend_from_slice(b"future extension");
        assert_eq!(SyncMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_truncation_fatal() {
        let message = SyncMessage {
            heads: vec![h(0x07)],
            ..Default::default()
        };
        let bytes = message.encode().unwrap();
        assert!(matches!(
            SyncMessage::decode(&bytes[..bytes.len() - 2]),
            Err(SyncError::Codec(CoreError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_unsorted_heads_rejected_on_encode() {
        let message = SyncMessage {
            heads: vec![h(0x02), h(0x01)],
            ..Default::default()
        };
        assert!(matches!(
            message.encode(),
            Err(SyncError::Codec(CoreError::UnsortedHashes))
        ));
    }
}
