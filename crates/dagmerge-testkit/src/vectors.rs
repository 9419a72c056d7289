//! Golden wire vectors for cross-implementation verification.
//!
//! Every implementation of the protocol must produce these exact bytes.
//! Hashes in the vectors are fixed byte patterns, so the expected encodings
//! are written out by hand rather than computed.

use dagmerge_core::ChangeHash;
use dagmerge_sync::{BloomFilter, Have, SyncMessage, SyncState};

/// A single golden wire vector.
#[derive(Debug, Clone)]
pub struct WireVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Bytes produced by the implementation.
    pub encoded: Vec<u8>,
    /// Bytes the wire format mandates.
    pub expected: Vec<u8>,
}

/// Get all golden wire vectors.
pub fn all_vectors() -> Vec<WireVector> {
    vec![
        empty_message(),
        heads_only_message(),
        reset_message(),
        empty_state(),
        two_head_state(),
        single_entry_bloom(),
    ]
}

fn h(byte: u8) -> ChangeHash {
    ChangeHash::from_bytes([byte; 32])
}

fn empty_message() -> WireVector {
    let message = SyncMessage::default();
    let mut expected = vec![0x42];
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // heads
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // need
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // have count
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // change count
    WireVector {
        name: "empty sync message",
        encoded: message.encode().unwrap(),
        expected,
    }
}

fn heads_only_message() -> WireVector {
    let message = SyncMessage {
        heads: vec![h(0x11)],
        ..Default::default()
    };
    let mut expected = vec![0x42];
    expected.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // heads count
    expected.extend_from_slice(&[0x11; 32]);
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // need
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // have count
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // change count
    WireVector {
        name: "heads-only sync message",
        encoded: message.encode().unwrap(),
        expected,
    }
}

fn reset_message() -> WireVector {
    let message = SyncMessage {
        have: vec![Have::default()],
        ..Default::default()
    };
    let mut expected = vec![0x42];
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // heads
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // need
    expected.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // have count
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // last_sync
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // empty bloom
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // change count
    WireVector {
        name: "reset sync message",
        encoded: message.encode().unwrap(),
        expected,
    }
}

fn empty_state() -> WireVector {
    let state = SyncState::default();
    WireVector {
        name: "empty sync state",
        encoded: state.encode().unwrap(),
        expected: vec![0x43, 0x00, 0x00, 0x00, 0x00],
    }
}

fn two_head_state() -> WireVector {
    let state = SyncState {
        shared_heads: vec![h(0x11), h(0x22)],
        ..Default::default()
    };
    let mut expected = vec![0x43];
    expected.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
    expected.extend_from_slice(&[0x11; 32]);
    expected.extend_from_slice(&[0x22; 32]);
    WireVector {
        name: "two-head sync state",
        encoded: state.encode().unwrap(),
        expected,
    }
}

fn single_entry_bloom() -> WireVector {
    // Probe words x=1, y=2, z=3 over a 16-bit array give probe indices
    // 1, 3, 8, 0, 11, 9, 10.
    let mut bytes = [0u8; 32];
    bytes[0] = 1;
    bytes[4] = 2;
    bytes[8] = 3;
    let filter = BloomFilter::from_hashes(&[ChangeHash::from_bytes(bytes)]);

    WireVector {
        name: "single-entry bloom filter",
        encoded: filter.to_bytes(),
        expected: vec![
            0x01, 0x00, 0x00, 0x00, // num_entries
            0x0a, 0x00, 0x00, 0x00, // num_bits_per_entry
            0x07, 0x00, 0x00, 0x00, // num_probes
            0x0b, 0x0f, // bit array
        ],
    }
}
