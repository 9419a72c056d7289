//! Sync state machine.
//!
//! Two entry points drive the whole protocol: [`generate_sync_message`]
//! produces the next outgoing message (or nothing, once converged), and
//! [`receive_sync_message`] folds an incoming message into the local state,
//! applying changes through the backend when their dependencies are
//! satisfied.
//!
//! Both are pure transitions: they take the [`SyncState`] by value and
//! return the successor state. Neither suspends, spawns, or does I/O beyond
//! the backend calls. Convergence is reached by repetition, not by any
//! single round.

use dagmerge_core::ChangeHash;
use dagmerge_store::{Backend, Patch};

use crate::bloom::{BloomFilter, DEFAULT_BITS_PER_ENTRY, DEFAULT_NUM_PROBES};
use crate::error::Result;
use crate::messages::{Have, SyncMessage};
use crate::selector::{deduplicate_changes, get_changes_to_send};
use crate::state::SyncState;

/// Tunable parameters for message generation.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bloom-filter bits per inserted hash.
    pub bloom_bits_per_entry: u32,
    /// Bloom-filter probes per hash.
    pub bloom_num_probes: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bloom_bits_per_entry: DEFAULT_BITS_PER_ENTRY,
            bloom_num_probes: DEFAULT_NUM_PROBES,
        }
    }
}

/// Produce the next outgoing message for this peer, or `None` when both
/// sides have converged and there is nothing worth saying.
pub fn generate_sync_message<B: Backend>(
    sync_state: SyncState,
    backend: &B,
) -> Result<(SyncState, Option<Vec<u8>>)> {
    generate_sync_message_with(sync_state, backend, &SyncConfig::default())
}

/// [`generate_sync_message`] with explicit configuration.
pub fn generate_sync_message_with<B: Backend>(
    mut sync_state: SyncState,
    backend: &B,
    config: &SyncConfig,
) -> Result<(SyncState, Option<Vec<u8>>)> {
    let our_heads = backend.get_heads()?;

    // Summarize what we hold only when we are not chasing missing deps;
    // while we are, a Bloom summary would just invite retransmission.
    let our_need_satisfiable = sync_state.our_need.iter().all(|hash| {
        sync_state
            .their_heads
            .as_deref()
            .is_some_and(|heads| heads.contains(hash))
    });
    let have = if our_need_satisfiable {
        vec![make_bloom_have(backend, &sync_state.shared_heads, config)?]
    } else {
        Vec::new()
    };

    // The peer claims a sync point we know nothing about (lost our state,
    // or talking to the wrong document). Ask them to start from scratch.
    if let Some(their_have) = &sync_state.their_have {
        for entry in their_have {
            for hash in &entry.last_sync {
                if backend.get_change_by_hash(hash)?.is_none() {
                    tracing::warn!(unknown = %hash, "peer references unknown sync history, requesting reset");
                    let reset = SyncMessage {
                        heads: our_heads,
                        need: Vec::new(),
                        have: vec![Have::default()],
                        changes: Vec::new(),
                    };
                    let bytes = reset.encode()?;
                    return Ok((sync_state, Some(bytes)));
                }
            }
        }
    }

    let mut changes_to_send = match (&sync_state.their_have, &sync_state.their_need) {
        (Some(their_have), Some(their_need)) => {
            get_changes_to_send(backend, their_have, their_need)?
        }
        _ => Vec::new(),
    };

    // Nothing new on either side and nothing requested: stay quiet.
    let heads_unchanged = sync_state.last_sent_heads == our_heads;
    let heads_equal = sync_state.their_heads.as_deref() == Some(our_heads.as_slice());
    if heads_unchanged && heads_equal && changes_to_send.is_empty() && sync_state.our_need.is_empty()
    {
        return Ok((sync_state, None));
    }

    if !changes_to_send.is_empty() && !sync_state.sent_changes.is_empty() {
        changes_to_send = deduplicate_changes(&sync_state.sent_changes, changes_to_send);
    }

    let message = SyncMessage {
        heads: our_heads.clone(),
        need: sync_state.our_need.clone(),
        have,
        changes: changes_to_send,
    };
    let bytes = message.encode()?;
    tracing::debug!(
        heads = message.heads.len(),
        need = message.need.len(),
        changes = message.changes.len(),
        "generated sync message"
    );

    sync_state.last_sent_heads = our_heads;
    sync_state.sent_changes.extend(message.changes);
    Ok((sync_state, Some(bytes)))
}

/// Fold an incoming message into the sync state, applying its changes
/// through the backend once their dependencies are satisfied.
///
/// Returns the backend's patch when changes were applied this round.
pub fn receive_sync_message<B: Backend>(
    mut sync_state: SyncState,
    backend: &mut B,
    bytes: &[u8],
) -> Result<(SyncState, Option<Patch>)> {
    let message = SyncMessage::decode(bytes)?;
    let before_heads = backend.get_heads()?;
    let SyncMessage {
        heads,
        need,
        have,
        changes,
    } = message;

    let mut patch = None;
    if !changes.is_empty() {
        sync_state.unapplied_changes.extend(changes);
        sync_state.our_need = backend.get_missing_deps(&sync_state.unapplied_changes, &heads)?;

        // Apply once the only "missing" hashes are the advertised heads
        // themselves; anything else means an unresolved intermediate gap.
        if sync_state.our_need.iter().all(|hash| heads.contains(hash)) {
            let unapplied = std::mem::take(&mut sync_state.unapplied_changes);
            let applied = backend.apply_changes(unapplied)?;
            let new_heads = backend.get_heads()?;
            sync_state.shared_heads =
                advance_heads(&before_heads, &new_heads, &sync_state.shared_heads);
            tracing::debug!(applied = applied.applied.len(), "applied received changes");
            patch = Some(applied);
        }
    } else if heads == before_heads {
        // The peer told us nothing new and sees what we see; suppress an
        // empty reply on our next generate.
        sync_state.last_sent_heads = heads.clone();
    }

    // Shared-head update by coverage: if the peer is not ahead of us, its
    // heads are exactly the shared frontier. Otherwise keep the known subset
    // merged with what we already had; later rounds clean this up.
    let mut all_known = true;
    let mut known_heads = Vec::with_capacity(heads.len());
    for head in &heads {
        if backend.get_change_by_hash(head)?.is_some() {
            known_heads.push(*head);
        } else {
            all_known = false;
        }
    }
    if all_known {
        sync_state.shared_heads = heads.clone();
    } else {
        let mut merged = known_heads;
        merged.extend(sync_state.shared_heads.iter().copied());
        merged.sort();
        merged.dedup();
        sync_state.shared_heads = merged;
    }

    sync_state.their_heads = Some(heads);
    sync_state.their_need = Some(need);
    sync_state.their_have = Some(have);
    Ok((sync_state, patch))
}

/// Advance the shared heads after applying changes the peer sent us.
///
/// Heads that appeared as a result of the apply are shared by construction;
/// old shared heads still present among our heads remain shared.
pub fn advance_heads(
    my_old_heads: &[ChangeHash],
    my_new_heads: &[ChangeHash],
    our_old_shared_heads: &[ChangeHash],
) -> Vec<ChangeHash> {
    let new_heads = my_new_heads
        .iter()
        .filter(|head| !my_old_heads.contains(head))
        .copied();
    let common_heads = our_old_shared_heads
        .iter()
        .filter(|head| my_new_heads.contains(head))
        .copied();

    let mut advanced: Vec<ChangeHash> = new_heads.chain(common_heads).collect();
    advanced.sort();
    advanced.dedup();
    advanced
}

fn make_bloom_have<B: Backend>(
    backend: &B,
    shared_heads: &[ChangeHash],
    config: &SyncConfig,
) -> Result<Have> {
    let hashes: Vec<ChangeHash> = backend
        .get_missing_changes(shared_heads)?
        .iter()
        .map(|change| change.hash())
        .collect();
    Ok(Have {
        last_sync: shared_heads.to_vec(),
        bloom: BloomFilter::with_params(config.bloom_bits_per_entry, config.bloom_num_probes, &hashes),
    })
}
