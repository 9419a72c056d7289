//! # dagmerge sync
//!
//! Peer-to-peer reconciliation protocol for a content-addressed change DAG,
//! after the Byzantine Eventual Consistency construction of Kleppmann &
//! Howard.
//!
//! ## Overview
//!
//! Two peers that may have diverged exchange messages until each holds the
//! other's changes. A message carries the sender's heads, the hashes it
//! explicitly needs, Bloom-filter summaries of what it already has, and any
//! change blobs it decided to transmit.
//!
//! ## Key Properties
//!
//! - **Pure transitions**: both entry points map `(state, backend, bytes)`
//!   to their successors with no internal concurrency or I/O
//! - **No false negatives**: a change absent from a peer's Bloom summary is
//!   definitely missing and will be sent
//! - **Self-healing**: Bloom false positives surface as missing dependencies
//!   and are requested by hash on the next round; unknown sync points
//!   trigger a reset message and a full resync
//! - **Bandwidth-efficient**: transmitted sets are dependency-closed and
//!   deduplicated against what was already sent
//!
//! ## Usage
//!
//! ```
//! use dagmerge_store::MemoryBackend;
//! use dagmerge_sync::{generate_sync_message, receive_sync_message, SyncState};
//!
//! let alice = MemoryBackend::new();
//! let mut bob = MemoryBackend::new();
//! let (mut alice_state, mut bob_state) = (SyncState::new(), SyncState::new());
//!
//! // One round: Alice speaks, Bob listens.
//! let (next, message) = generate_sync_message(alice_state, &alice).unwrap();
//! alice_state = next;
//! if let Some(bytes) = message {
//!     let (next, _patch) = receive_sync_message(bob_state, &mut bob, &bytes).unwrap();
//!     bob_state = next;
//! }
//! # let _ = (alice_state, bob_state);
//! ```
//!
//! Repeat, alternating directions, until both sides generate `None`.
//!
//! ## Message Flow
//!
//! ```text
//! Peer A                                Peer B
//!   |-- heads + have(bloom) ------------->|
//!   |<------------- heads + have(bloom) --|
//!   |-- changes B lacks ----------------->|
//!   |<----------------- changes A lacks --|
//!   |-- need (false-positive stragglers) >|
//!   |<------------------- those changes --|
//! ```

pub mod bloom;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod selector;
pub mod state;

pub use bloom::{BloomFilter, DEFAULT_BITS_PER_ENTRY, DEFAULT_NUM_PROBES};
pub use error::{Result, SyncError};
pub use messages::{Have, SyncMessage, SYNC_MESSAGE_TYPE};
pub use protocol::{
    advance_heads, generate_sync_message, generate_sync_message_with, receive_sync_message,
    SyncConfig,
};
pub use selector::{deduplicate_changes, get_changes_to_send};
pub use state::{SyncState, SYNC_STATE_TYPE};
