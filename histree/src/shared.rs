use std::{borrow::Borrow, sync::Arc};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
    commitment::Commitment,
    error::Result,
    hash::{Digest, Hashable},
    ledger::{Ledger, SyncError},
    proof::InclusionProof,
    replay::{events_after, AppendEvent},
    HistoryTree,
};

/// A [`HistoryTree`] that can be shared between threads
///
/// Writers (replays, commits) take the lock for the whole operation, so readers never see a
/// partially applied batch of events. Any number of proofs can be extracted at once
#[derive(Debug, Clone, Default)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryTree>>,
}

impl From<HistoryTree> for SharedHistory {
    fn from(tree: HistoryTree) -> Self {
        Self::new(tree)
    }
}

impl SharedHistory {
    /// Share `tree`
    #[must_use]
    pub fn new(tree: HistoryTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// The current root
    #[must_use]
    pub fn root(&self) -> Digest {
        self.inner.read().root()
    }

    /// The running count of the last applied event
    #[must_use]
    pub fn running_count(&self) -> u64 {
        self.inner.read().running_count()
    }

    /// Lock the tree for reading
    ///
    /// Writers are blocked until the guard is dropped
    pub fn read(&self) -> RwLockReadGuard<'_, HistoryTree> {
        self.inner.read()
    }

    /// A copy of the tree as it is now
    #[must_use]
    pub fn snapshot(&self) -> HistoryTree {
        self.inner.read().clone()
    }

    /// Record a commitment locally, see [`HistoryTree::commit`]
    ///
    /// # Errors
    ///
    /// See [`HistoryTree::commit`]
    pub fn commit(&self, value: impl AsRef<[u8]>, salt: impl Hashable) -> Result<Commitment> {
        self.inner.write().commit(value, salt)
    }

    /// Apply a batch of events, see [`HistoryTree::replay`]
    ///
    /// # Errors
    ///
    /// See [`HistoryTree::replay`]
    pub fn apply<I>(&self, events: I) -> Result<Digest>
    where
        I: IntoIterator,
        I::Item: Borrow<AppendEvent>,
    {
        self.inner.write().replay(events)
    }

    /// Fetch new events from `ledger` and apply them
    ///
    /// The lock is not held while fetching. Events another writer applied in the meantime are
    /// skipped
    ///
    /// # Errors
    ///
    /// See [`HistoryTree::sync`]
    pub fn sync<L: Ledger>(&self, ledger: &L) -> Result<Digest, SyncError<L::Error>> {
        let from = self.running_count();
        let events = ledger.events_since(from).map_err(SyncError::Ledger)?;

        let mut tree = self.inner.write();
        let pending = events_after(&events, tree.running_count());
        Ok(tree.replay(pending)?)
    }

    /// Prove inclusion against the current state, see [`HistoryTree::prove_inclusion`]
    ///
    /// # Errors
    ///
    /// See [`HistoryTree::prove_inclusion`]
    pub fn prove_inclusion(&self, root: Digest, leaf: Digest) -> Result<InclusionProof> {
        self.inner.read().prove_inclusion(root, leaf)
    }
}
