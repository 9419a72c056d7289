//! Proptest generators for property-based testing.

use proptest::prelude::*;

use dagmerge_core::{Change, ChangeBuilder, ChangeHash};

/// Generate a random ChangeHash.
pub fn change_hash() -> impl Strategy<Value = ChangeHash> {
    any::<[u8; 32]>().prop_map(ChangeHash::from_bytes)
}

/// Generate a sorted, deduplicated hash vector of at most `max` entries.
pub fn sorted_hashes(max: usize) -> impl Strategy<Value = Vec<ChangeHash>> {
    prop::collection::btree_set(change_hash(), 0..=max)
        .prop_map(|set| set.into_iter().collect())
}

/// Generate payload bytes of at most `max_len` bytes.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a linear chain of changes, each depending on the previous.
pub fn change_chain(max_len: usize) -> impl Strategy<Value = Vec<Change>> {
    prop::collection::vec(payload(64), 1..=max_len).prop_map(|payloads| {
        let mut chain: Vec<Change> = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let mut builder = ChangeBuilder::new().payload(payload);
            if let Some(prev) = chain.last() {
                builder = builder.dep(prev.hash());
            }
            chain.push(builder.build().unwrap());
        }
        chain
    })
}

/// A single random hash, outside of proptest.
pub fn random_hash() -> ChangeHash {
    ChangeHash::from_bytes(rand::random())
}
