//! Backend trait: the abstract interface the sync protocol requires of the
//! document store.
//!
//! The document store owns the change DAG and the document semantics. The
//! sync layer only reads the DAG's shape and feeds it batches of changes.
//!
//! # Design Notes
//!
//! - **Idempotent applies**: Applying the same change twice is a no-op, not
//!   an error.
//! - **DAG order**: A change's dependencies must be applied before it; a
//!   batch may arrive in any internal order as long as it is self-contained.
//! - **Topological reads**: [`Backend::get_missing_changes`] returns changes
//!   with dependencies before dependents, so a receiver can apply them in
//!   the order given.

use serde::{Deserialize, Serialize};

use dagmerge_core::{Change, ChangeHash};

use crate::error::Result;

/// Description of the effect of applying a batch of changes.
///
/// The sync protocol threads patches through to the host unchanged; only the
/// document layer interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Hashes newly applied, in application order.
    pub applied: Vec<ChangeHash>,
    /// The heads before the batch was applied (sorted).
    pub before_heads: Vec<ChangeHash>,
    /// The heads after the batch was applied (sorted).
    pub after_heads: Vec<ChangeHash>,
}

impl Patch {
    /// Whether the batch changed anything at all.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// The interface the sync protocol requires of the document store.
pub trait Backend {
    /// Current heads: hashes of changes that no other known change depends
    /// on. Returned sorted ascending.
    fn get_heads(&self) -> Result<Vec<ChangeHash>>;

    /// Look up a change by its content hash.
    fn get_change_by_hash(&self, hash: &ChangeHash) -> Result<Option<Change>>;

    /// All changes not reachable from the given frontier, in a topological
    /// order (dependencies before dependents). Frontier hashes the store
    /// does not know contribute nothing to reachability.
    fn get_missing_changes(&self, frontier: &[ChangeHash]) -> Result<Vec<Change>>;

    /// Hashes referenced as dependencies of `changes` (or named in `heads`)
    /// that the store lacks even after considering `changes` themselves.
    /// Returned sorted ascending.
    fn get_missing_deps(&self, changes: &[Change], heads: &[ChangeHash])
        -> Result<Vec<ChangeHash>>;

    /// Apply a batch of changes.
    ///
    /// Duplicates are skipped. The batch may be internally unordered; the
    /// store resolves it as long as every dependency is either already
    /// stored or part of the batch. A genuinely absent dependency fails the
    /// whole call with [`crate::StoreError::MissingDependency`].
    fn apply_changes(&mut self, changes: Vec<Change>) -> Result<Patch>;
}
