//! Per-peer sync state and its persisted form.
//!
//! A peer keeps one [`SyncState`] per remote peer. Only `shared_heads`
//! survives a restart; everything else is conversation-local and comes back
//! as empty defaults when the state is reloaded.

use dagmerge_core::{Change, ChangeHash, Decoder, Encoder};

use crate::error::{Result, SyncError};
use crate::messages::Have;

/// First byte of an encoded sync state, for identification.
pub const SYNC_STATE_TYPE: u8 = 0x43;

/// State of the sync conversation with one remote peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Heads we are confident both peers hold. Monotone across successful
    /// exchanges; the only field that persists.
    pub shared_heads: Vec<ChangeHash>,

    /// Heads reported in our most recent outgoing message, used to suppress
    /// redundant sends.
    pub last_sent_heads: Vec<ChangeHash>,

    /// Last heads the peer told us.
    pub their_heads: Option<Vec<ChangeHash>>,

    /// Last explicit needs the peer told us.
    pub their_need: Option<Vec<ChangeHash>>,

    /// The peer's most recent Have entries, consumed on our next send.
    pub their_have: Option<Vec<Have>>,

    /// Hashes we are still missing to apply queued changes.
    pub our_need: Vec<ChangeHash>,

    /// Received changes not yet applicable due to missing dependencies.
    pub unapplied_changes: Vec<Change>,

    /// Changes already transmitted to this peer, kept for deduplication.
    pub sent_changes: Vec<Change>,
}

impl SyncState {
    /// Fresh state for a newly encountered peer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the persistent part of the state.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.push_u8(SYNC_STATE_TYPE);
        enc.push_hashes(&self.shared_heads)?;
        Ok(enc.into_bytes())
    }

    /// Decode a persisted state: `shared_heads` is restored, every ephemeral
    /// field is reset to its empty default. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);

        let record_type = dec.read_u8()?;
        if record_type != SYNC_STATE_TYPE {
            return Err(SyncError::BadMessageType(record_type));
        }

        let shared_heads = dec.read_hashes()?;
        Ok(Self {
            shared_heads,
            ..Default::default()
        })
    }
}
