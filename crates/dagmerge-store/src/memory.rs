//! In-memory implementation of the Backend trait.
//!
//! Primarily for tests and as the reference semantics for the trait. All
//! data is lost when the backend is dropped.

use std::collections::{BTreeSet, HashMap, HashSet};

use dagmerge_core::{Change, ChangeHash};

use crate::error::{Result, StoreError};
use crate::traits::{Backend, Patch};

/// In-memory change-DAG store.
///
/// Keeps an insertion-ordered log of applied changes. Because applies
/// enforce dependencies-first, the log is a valid topological order and is
/// what [`Backend::get_missing_changes`] iterates.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Changes indexed by content hash.
    changes: HashMap<ChangeHash, Change>,

    /// Application order; a topological order of the DAG.
    log: Vec<ChangeHash>,

    /// Maintained head set: hashes no known change depends on.
    heads: BTreeSet<ChangeHash>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of changes stored.
    pub fn num_changes(&self) -> usize {
        self.changes.len()
    }

    /// Whether a change with this hash is stored.
    pub fn contains(&self, hash: &ChangeHash) -> bool {
        self.changes.contains_key(hash)
    }

    /// Hashes reachable from the frontier: the frontier changes themselves
    /// plus all transitive dependencies. Unknown hashes are skipped.
    fn reachable_from(&self, frontier: &[ChangeHash]) -> HashSet<ChangeHash> {
        let mut seen = HashSet::new();
        let mut stack: Vec<ChangeHash> = frontier
            .iter()
            .copied()
            .filter(|h| self.changes.contains_key(h))
            .collect();
        while let Some(hash) = stack.pop() {
            if !seen.insert(hash) {
                continue;
            }
            if let Some(change) = self.changes.get(&hash) {
                for dep in change.deps() {
                    if !seen.contains(dep) {
                        stack.push(*dep);
                    }
                }
            }
        }
        seen
    }

    fn insert(&mut self, change: Change) {
        let hash = change.hash();
        self.heads.insert(hash);
        for dep in change.deps() {
            self.heads.remove(dep);
        }
        self.log.push(hash);
        self.changes.insert(hash, change);
    }
}

impl Backend for MemoryBackend {
    fn get_heads(&self) -> Result<Vec<ChangeHash>> {
        Ok(self.heads.iter().copied().collect())
    }

    fn get_change_by_hash(&self, hash: &ChangeHash) -> Result<Option<Change>> {
        Ok(self.changes.get(hash).cloned())
    }

    fn get_missing_changes(&self, frontier: &[ChangeHash]) -> Result<Vec<Change>> {
        let reachable = self.reachable_from(frontier);
        Ok(self
            .log
            .iter()
            .filter(|hash| !reachable.contains(*hash))
            .map(|hash| self.changes[hash].clone())
            .collect())
    }

    fn get_missing_deps(
        &self,
        changes: &[Change],
        heads: &[ChangeHash],
    ) -> Result<Vec<ChangeHash>> {
        let provided: HashSet<ChangeHash> = changes.iter().map(|c| c.hash()).collect();
        let mut missing = BTreeSet::new();
        for change in changes {
            for dep in change.deps() {
                if !provided.contains(dep) && !self.changes.contains_key(dep) {
                    missing.insert(*dep);
                }
            }
        }
        for head in heads {
            if !provided.contains(head) && !self.changes.contains_key(head) {
                missing.insert(*head);
            }
        }
        Ok(missing.into_iter().collect())
    }

    fn apply_changes(&mut self, changes: Vec<Change>) -> Result<Patch> {
        let before_heads = self.get_heads()?;
        let mut applied = Vec::new();

        // The batch may be internally unordered; keep sweeping until no
        // change becomes applicable.
        let mut queue = changes;
        loop {
            let mut deferred = Vec::new();
            let mut progressed = false;
            for change in queue {
                if self.changes.contains_key(&change.hash()) {
                    continue; // duplicate
                }
                if change.deps().iter().all(|d| self.changes.contains_key(d)) {
                    applied.push(change.hash());
                    self.insert(change);
                    progressed = true;
                } else {
                    deferred.push(change);
                }
            }
            if deferred.is_empty() {
                break;
            }
            if !progressed {
                let missing = deferred[0]
                    .deps()
                    .iter()
                    .find(|d| !self.changes.contains_key(d))
                    .copied()
                    .expect("deferred change has a missing dep");
                return Err(StoreError::MissingDependency(missing));
            }
            queue = deferred;
        }

        Ok(Patch {
            applied,
            before_heads,
            after_heads: self.get_heads()?,
        })
    }
}
