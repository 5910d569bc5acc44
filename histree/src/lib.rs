#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used, clippy::expect_used)]
#![deny(missing_docs)]

//! Local mirror of an append-only history tree
//!
//! A ledger accumulates pair commitments (the hash of a hidden value and a salt) into a binary
//! Keccak-256 hash tree, and emits an [`AppendEvent`] for each one. This library rebuilds the
//! exact same tree from those events alone, and extracts [`InclusionProof`]s from it, so a voter
//! can later reveal their value and prove it was committed under the ledger's current root
//!
//! ```rust
//! # use histree::{hash::value_digest, HistoryTree, ledger::{Ledger, MemoryLedger}};
//! let mut ledger = MemoryLedger::new();
//! let mut tree = HistoryTree::new();
//!
//! tree.insert(&mut ledger, "yes", 1234u64).unwrap();
//! tree.insert(&mut ledger, "no", 5678u64).unwrap();
//! tree.sync(&ledger).unwrap();
//!
//! assert_eq!(tree.root(), ledger.root().unwrap());
//!
//! let proof = tree.prove_value(tree.root(), "yes").unwrap();
//! assert_eq!(proof.leaf(), value_digest("yes"));
//! assert!(proof.verify());
//! ```
//!
//! Growth is incremental: the [`EdgeStack`] keeps one open subtree root per set bit of the
//! ledger's running count, so each append only hashes `O(log n)` nodes. Every node ever produced
//! is kept in the [`NodeTable`], which is what proofs are walked from
//!
//! [`Digest`] implements [`Arbitrary`], for use with [`proptest`], gated behind the `proptest`
//! feature flag.
//!
//! [`EdgeStack`]: edges::EdgeStack
//! [`NodeTable`]: table::NodeTable
//! [`Digest`]: hash::Digest
//! [`Arbitrary`]: proptest::prelude::Arbitrary

mod macros;

pub mod edges;
pub mod hash;
pub mod ledger;
pub mod table;

mod commitment;
mod error;
mod proof;
mod replay;
mod shared;
mod tree;

pub use commitment::{Commitment, CommitmentMismatch};
pub use error::{Error, Result};
pub use proof::{verify_inclusion, DecodeError, EncodeError, InclusionProof, ProofStep};
pub use replay::{events_after, AppendEvent, ELEMENTS_PER_APPEND};
pub use shared::SharedHistory;
pub use tree::HistoryTree;

#[cfg(test)]
mod testing;
