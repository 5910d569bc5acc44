//! Inclusion proofs: extraction from a [`HistoryTree`], and verification

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    hash::{hash_merge, hash_single, value_digest, Digest},
    table::NodeRecord,
    HistoryTree,
};

mod codec;
pub use codec::{DecodeError, EncodeError};


/// A single hop from a node to its parent
///
/// Each variant says how the parent was computed from the node being proven (`cur`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofStep {
    /// The sibling was on the left: `parent = hash_merge(sibling, cur)`
    Left(Digest),
    /// The sibling was on the right: `parent = hash_merge(cur, sibling)`
    Right(Digest),
    /// The node was promoted on its own: `parent = hash_single(cur)`
    Promote,
}

impl ProofStep {
    /// Compute the parent of `cur` through this step
    #[inline]
    #[must_use]
    pub fn apply(self, cur: Digest) -> Digest {
        match self {
            Self::Left(sibling) => hash_merge(sibling, cur),
            Self::Right(sibling) => hash_merge(cur, sibling),
            Self::Promote => hash_single(cur),
        }
    }

    /// The sibling hash carried by this step, if any
    #[inline]
    #[must_use]
    pub fn sibling(self) -> Option<Digest> {
        match self {
            Self::Left(sibling) | Self::Right(sibling) => Some(sibling),
            Self::Promote => None,
        }
    }
}

/// Proof that `leaf` was accumulated into the tree with root `root`
///
/// ```rust
/// # use histree::{hash::value_digest, history};
/// let (tree, _ledger) = history! {
///     "a" => 4u64,
///     "c" => 7u64,
///     "e" => 9u64,
/// };
///
/// let proof = tree.prove_value(tree.root(), "c").unwrap();
///
/// assert_eq!(proof.leaf(), value_digest("c"));
/// assert!(proof.verify());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    root: Digest,
    leaf: Digest,
    steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Assemble a proof from its parts, e.g. one received from elsewhere
    #[must_use]
    pub fn new(root: Digest, leaf: Digest, steps: Vec<ProofStep>) -> Self {
        Self { root, leaf, steps }
    }

    /// The root this proof leads to
    #[inline]
    #[must_use]
    pub fn root(&self) -> Digest {
        self.root
    }

    /// The leaf this proof starts from
    #[inline]
    #[must_use]
    pub fn leaf(&self) -> Digest {
        self.leaf
    }

    /// Every hop from the leaf up to the root, lowest first
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    /// The sibling hashes, from the leaf's sibling to the one just below the root
    ///
    /// Promotions have no sibling, so they contribute nothing to this list
    #[must_use]
    pub fn siblings(&self) -> Vec<Digest> {
        self.steps.iter().filter_map(|step| step.sibling()).collect()
    }

    /// Recombine the leaf with every step, and check the result is the root
    #[must_use]
    pub fn verify(&self) -> bool {
        verify_inclusion(self.root, self.leaf, &self.steps)
    }
}

/// Returns `true` if applying `steps` to `leaf` in order yields `root`
#[must_use]
pub fn verify_inclusion(root: Digest, leaf: Digest, steps: &[ProofStep]) -> bool {
    steps.iter().fold(leaf, |cur, step| step.apply(cur)) == root
}

impl HistoryTree {
    /// Prove that `leaf` is included under `root`
    ///
    /// `leaf` must be a committed value or pair commitment, and `root` must be the current root:
    /// nodes are re-linked as the tree grows, so walks towards an earlier root end at the current
    /// one instead
    ///
    /// # Errors
    ///
    ///  - [`Error::UnknownRoot`] if `root` has no record
    ///  - [`Error::UnknownLeaf`] if `leaf` has no record
    ///  - [`Error::NotALeaf`] if `leaf` is a salt or an internal node
    ///  - [`Error::ProofNotFound`] if the walk from `leaf` never reaches `root`
    #[tracing::instrument(skip(self))]
    pub fn prove_inclusion(&self, root: Digest, leaf: Digest) -> Result<InclusionProof> {
        let table = self.table();

        if !table.contains(&root) {
            return Err(Error::UnknownRoot(root));
        }

        let record = table.get(&leaf).ok_or(Error::UnknownLeaf(leaf))?;
        if !record.is_commit_leaf() {
            return Err(Error::NotALeaf(leaf));
        }

        let not_found = || Error::ProofNotFound { leaf, root };
        let mut steps = Vec::new();
        let mut cur = leaf;

        while cur != root {
            // every hop moves up a level, so a longer walk is a cycle
            if steps.len() >= table.len() {
                return Err(not_found());
            }

            let parent = table
                .get(&cur)
                .and_then(NodeRecord::parent)
                .ok_or_else(not_found)?;
            let children = table
                .get(&parent)
                .map(NodeRecord::children)
                .ok_or_else(not_found)?;

            let step = match *children {
                [only] if only == cur => ProofStep::Promote,
                [left, right] if right == cur => ProofStep::Left(left),
                [left, right] if left == cur => ProofStep::Right(right),
                _ => return Err(not_found()),
            };

            steps.push(step);
            cur = parent;
        }

        tracing::debug!(steps = steps.len(), "found inclusion proof");

        Ok(InclusionProof { root, leaf, steps })
    }

    /// Prove that a revealed `value` is included under `root`
    ///
    /// # Errors
    ///
    /// See [`HistoryTree::prove_inclusion`]
    pub fn prove_value(&self, root: Digest, value: impl AsRef<[u8]>) -> Result<InclusionProof> {
        self.prove_inclusion(root, value_digest(value))
    }
}
