//! # dagmerge testkit
//!
//! Testing utilities for the dagmerge sync protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: [`TestPeer`] wraps a backend and a sync state so tests
//!   can commit changes and exchange messages in a couple of lines
//! - **Generators**: proptest strategies for hashes, sorted hash vectors,
//!   and change chains
//! - **Golden vectors**: wire encodings with hand-computed expected bytes
//!   for cross-implementation verification
//!
//! ## Two peers in three lines
//!
//! ```
//! use dagmerge_testkit::fixtures::{run_until_quiescent, TestPeer};
//!
//! let mut alice = TestPeer::new();
//! let mut bob = TestPeer::new();
//! alice.commit(b"hello");
//! run_until_quiescent(&mut alice, &mut bob, 10);
//! assert_eq!(alice.heads(), bob.heads());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{run_until_quiescent, TestPeer};
pub use generators::{change_chain, change_hash, payload, random_hash, sorted_hashes};
pub use vectors::{all_vectors, WireVector};
