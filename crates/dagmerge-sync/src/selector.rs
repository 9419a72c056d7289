//! Change selection: decide which changes to transmit to a peer.
//!
//! The goal is to send a dependency-closed superset of what the peer lacks.
//! Bloom-filter false negatives cannot occur, so a negative probe means the
//! peer definitely misses that change; false positives are compensated by
//! closing the set under dependents here and by the peer requesting the
//! stragglers by hash on the next round.

use std::collections::{BTreeSet, HashMap, HashSet};

use dagmerge_core::{Change, ChangeHash};
use dagmerge_store::Backend;

use crate::error::Result;
use crate::messages::Have;

/// Compute the ordered list of changes to transmit, given the peer's `have`
/// summaries and explicit `need` hashes.
pub fn get_changes_to_send<B: Backend>(
    backend: &B,
    have: &[Have],
    need: &[ChangeHash],
) -> Result<Vec<Change>> {
    // With no summaries there is nothing to reconcile against: answer the
    // explicit requests and nothing more.
    if have.is_empty() {
        let mut out = Vec::with_capacity(need.len());
        for hash in need {
            if let Some(change) = backend.get_change_by_hash(hash)? {
                out.push(change);
            }
        }
        return Ok(out);
    }

    let mut last_sync = BTreeSet::new();
    for entry in have {
        last_sync.extend(entry.last_sync.iter().copied());
    }
    let frontier: Vec<ChangeHash> = last_sync.into_iter().collect();

    // Everything past the peer's sync point, dependencies before dependents.
    let changes = backend.get_missing_changes(&frontier)?;

    let mut change_hashes = HashSet::with_capacity(changes.len());
    let mut dependents: HashMap<ChangeHash, Vec<ChangeHash>> = HashMap::new();
    let mut hashes_to_send = HashSet::new();
    for change in &changes {
        change_hashes.insert(change.hash());
        for dep in change.deps() {
            dependents.entry(*dep).or_default().push(change.hash());
        }
        if have.iter().all(|h| !h.bloom.contains_hash(&change.hash())) {
            hashes_to_send.insert(change.hash());
        }
    }

    // Close under dependents: anything built on top of a change the peer
    // lacks is unusable to them without it.
    let mut stack: Vec<ChangeHash> = hashes_to_send.iter().copied().collect();
    while let Some(hash) = stack.pop() {
        if let Some(children) = dependents.get(&hash) {
            for child in children {
                if hashes_to_send.insert(*child) {
                    stack.push(*child);
                }
            }
        }
    }

    // Explicit requests outside the post-frontier set are served directly.
    let mut out = Vec::new();
    for hash in need {
        hashes_to_send.insert(*hash);
        if !change_hashes.contains(hash) {
            if let Some(change) = backend.get_change_by_hash(hash)? {
                out.push(change);
            }
        }
    }

    // Emit in the store's topological order.
    for change in changes {
        if hashes_to_send.contains(&change.hash()) {
            out.push(change);
        }
    }
    Ok(out)
}

/// Drop candidates that were already transmitted to this peer.
///
/// Indexed by the 32-bit checksum at bytes 4-7 of each blob; full bytes are
/// compared only on checksum collisions, keeping this linear in practice.
pub fn deduplicate_changes(previously_sent: &[Change], candidates: Vec<Change>) -> Vec<Change> {
    let mut by_checksum: HashMap<u32, Vec<usize>> = HashMap::new();
    for (index, change) in previously_sent.iter().enumerate() {
        by_checksum.entry(change.checksum()).or_default().push(index);
    }

    candidates
        .into_iter()
        .filter(|candidate| match by_checksum.get(&candidate.checksum()) {
            Some(positions) => !positions
                .iter()
                .any(|&i| previously_sent[i].as_bytes() == candidate.as_bytes()),
            None => true,
        })
        .collect()
}
