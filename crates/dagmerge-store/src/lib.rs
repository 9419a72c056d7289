//! # dagmerge store
//!
//! The [`Backend`] trait (the interface the sync protocol requires of the
//! underlying document store) plus [`MemoryBackend`], an in-memory
//! change-DAG store that serves as the reference implementation and the test
//! double.
//!
//! The sync protocol never interprets document contents. It asks the backend
//! for heads, for changes not reachable from a frontier, for dependencies it
//! is missing, and to apply batches of changes.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use traits::{Backend, Patch};
