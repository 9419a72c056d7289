//! Test fixtures and helpers.
//!
//! Common setup code for sync protocol tests.

use dagmerge_core::{Change, ChangeBuilder, ChangeHash};
use dagmerge_store::{Backend, MemoryBackend, Patch};
use dagmerge_sync::{generate_sync_message, receive_sync_message, SyncState};

/// A peer under test: a backend plus the sync state for one remote peer.
#[derive(Debug, Default)]
pub struct TestPeer {
    pub backend: MemoryBackend,
    pub state: SyncState,
}

impl TestPeer {
    /// Create a peer with an empty document and fresh sync state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a new change on top of the current heads, as a document edit
    /// would, and return it.
    pub fn commit(&mut self, payload: &[u8]) -> Change {
        let heads = self.backend.get_heads().unwrap();
        let change = ChangeBuilder::new()
            .deps(heads)
            .payload(payload.to_vec())
            .build()
            .unwrap();
        self.backend.apply_changes(vec![change.clone()]).unwrap();
        change
    }

    /// Current document heads.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.backend.get_heads().unwrap()
    }

    /// Run the generate half of the state machine.
    pub fn generate(&mut self) -> Option<Vec<u8>> {
        let state = std::mem::take(&mut self.state);
        let (state, message) = generate_sync_message(state, &self.backend).unwrap();
        self.state = state;
        message
    }

    /// Run the receive half of the state machine.
    pub fn receive(&mut self, bytes: &[u8]) -> Option<Patch> {
        let state = std::mem::take(&mut self.state);
        let (state, patch) = receive_sync_message(state, &mut self.backend, bytes).unwrap();
        self.state = state;
        patch
    }
}

/// Exchange messages between two peers until neither has anything to say.
///
/// Each iteration both peers generate, then each delivers to the other,
/// the same shape a full-duplex host would drive. Returns the number of
/// messages that crossed the wire.
///
/// Panics if quiescence is not reached within `max_iterations`.
pub fn run_until_quiescent(a: &mut TestPeer, b: &mut TestPeer, max_iterations: usize) -> usize {
    let mut messages = 0;
    for _ in 0..max_iterations {
        let a_to_b = a.generate();
        let b_to_a = b.generate();
        if a_to_b.is_none() && b_to_a.is_none() {
            return messages;
        }
        if let Some(bytes) = a_to_b {
            messages += 1;
            b.receive(&bytes);
        }
        if let Some(bytes) = b_to_a {
            messages += 1;
            a.receive(&bytes);
        }
    }
    panic!("peers did not quiesce within {max_iterations} iterations");
}
