//! The ledger a [`HistoryTree`] mirrors
//!
//! The ledger holds the authoritative root. A [`HistoryTree`] only ever learns about it through
//! the append events it emits, so [`HistoryTree::sync`] is the only way the two are kept in step

use crate::{
    commitment::Commitment,
    error::Error,
    hash::{hash_merge, hash_single, Digest, Hashable},
    replay::{events_after, AppendEvent, ELEMENTS_PER_APPEND},
    HistoryTree,
};

/// A ledger that accepts pair commitments and emits [`AppendEvent`]s
///
/// Implementations are expected to do their own retrying: a failed call is reported to the caller
/// as-is
pub trait Ledger {
    /// The error returned when talking to the ledger fails
    type Error: std::error::Error + 'static;

    /// Submit a pair commitment of an already-hashed value and salt
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger rejects the submission
    fn insert(&mut self, value: Digest, salt: Digest) -> Result<(), Self::Error>;

    /// The ledger's current root
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be reached
    fn root(&self) -> Result<Digest, Self::Error>;

    /// Every append event with a running count greater than `running_count`, in emission order
    ///
    /// `0` fetches the full history
    ///
    /// # Errors
    ///
    /// Returns an error if the event log cannot be fetched
    fn events_since(&self, running_count: u64) -> Result<Vec<AppendEvent>, Self::Error>;
}

/// An error encountered while keeping a [`HistoryTree`] in step with a [`Ledger`]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError<E>
where
    E: std::error::Error + 'static,
{
    /// The ledger call failed
    #[error("ledger error: {0}")]
    Ledger(#[source] E),

    /// The ledger's events could not be applied
    #[error(transparent)]
    History(#[from] Error),
}

impl HistoryTree {
    /// Submit a commitment to `ledger`, then record it locally
    ///
    /// The commitment only becomes part of the tree once the ledger's append event for it has
    /// been replayed, see [`HistoryTree::sync`]
    ///
    /// # Errors
    ///
    /// Returns an error if the commitment clashes with a local node, or the ledger rejects it. In
    /// either case nothing is recorded
    #[tracing::instrument(skip_all)]
    pub fn insert<L: Ledger>(
        &mut self,
        ledger: &mut L,
        value: impl AsRef<[u8]>,
        salt: impl Hashable,
    ) -> Result<Commitment, SyncError<L::Error>> {
        let commitment = Commitment::new(value, salt);
        self.check_commitment(commitment)?;

        ledger
            .insert(commitment.value(), commitment.salt())
            .map_err(SyncError::Ledger)?;

        self.record_commitment(commitment)?;
        tracing::debug!(digest = %commitment.digest(), "submitted commitment");

        Ok(commitment)
    }

    /// Fetch and replay the events emitted since the last applied one, returning the new root
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be fetched or applied. Events before the one that
    /// failed stay applied
    #[tracing::instrument(skip_all, fields(from = self.running_count()))]
    pub fn sync<L: Ledger>(&mut self, ledger: &L) -> Result<Digest, SyncError<L::Error>> {
        let events = ledger
            .events_since(self.running_count())
            .map_err(SyncError::Ledger)?;

        Ok(self.replay(&events)?)
    }

    /// Rebuild the tree from the ledger's full history, returning the new root
    ///
    /// Locally recorded commitments are carried over. The tree is only replaced once the whole
    /// history has been applied
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be fetched or applied, in which case `self` is
    /// unchanged
    #[tracing::instrument(skip_all)]
    pub fn resync<L: Ledger>(&mut self, ledger: &L) -> Result<Digest, SyncError<L::Error>> {
        let events = ledger.events_since(0).map_err(SyncError::Ledger)?;

        let mut fresh = self.reseeded()?;
        let root = fresh.replay(&events)?;
        *self = fresh;

        Ok(root)
    }
}

/// An error returned by [`MemoryLedger`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryLedgerError {
    /// The pair commitment has already been appended
    #[error("{0} has already been committed")]
    AlreadyCommitted(Digest),
}

/// A [`Ledger`] held in memory
///
/// Its root is computed directly from the list of commitments, without an edge stack, which makes
/// it a useful reference to check a [`HistoryTree`] against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    commitments: Vec<Digest>,
    events: Vec<AppendEvent>,
}

impl MemoryLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The pair commitments appended so far, in order
    #[inline]
    #[must_use]
    pub fn commitments(&self) -> &[Digest] {
        &self.commitments
    }

    /// Every event emitted so far
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[AppendEvent] {
        &self.events
    }

    /// Append a pair commitment directly, returning the event emitted for it
    ///
    /// # Errors
    ///
    /// Returns [`MemoryLedgerError::AlreadyCommitted`] if `digest` was appended before
    pub fn append(&mut self, digest: Digest) -> Result<AppendEvent, MemoryLedgerError> {
        if self.commitments.contains(&digest) {
            return Err(MemoryLedgerError::AlreadyCommitted(digest));
        }

        self.commitments.push(digest);

        let running_count = self.events.last().map_or(0, |event| event.running_count);
        let event = AppendEvent::new(digest, running_count + ELEMENTS_PER_APPEND);
        self.events.push(event);

        Ok(event)
    }
}

impl Ledger for MemoryLedger {
    type Error = MemoryLedgerError;

    fn insert(&mut self, value: Digest, salt: Digest) -> Result<(), Self::Error> {
        self.append(hash_merge(value, salt)).map(|_| ())
    }

    fn root(&self) -> Result<Digest, Self::Error> {
        Ok(canonical_root(&self.commitments))
    }

    fn events_since(&self, running_count: u64) -> Result<Vec<AppendEvent>, Self::Error> {
        Ok(events_after(&self.events, running_count).to_vec())
    }
}

/// The root of the history tree over `commitments`, computed from scratch
///
/// The tree is a perfect binary tree just tall enough for every commitment. Each complete
/// half is paired, earlier half on the left, and an incomplete right half with nothing to its
/// right is promoted up to the level it would have been paired at
///
/// ```rust
/// # use histree::{hash::{hash_merge, hash_single, Digest}, ledger::canonical_root};
/// let [a, b, c] = [b"a", b"b", b"c"].map(|s| Digest::calculate(s));
///
/// assert_eq!(canonical_root(&[]), Digest::ZERO);
/// assert_eq!(canonical_root(&[a]), a);
/// assert_eq!(canonical_root(&[a, b, c]), hash_merge(hash_merge(a, b), hash_single(c)));
/// ```
#[must_use]
pub fn canonical_root(commitments: &[Digest]) -> Digest {
    if commitments.is_empty() {
        return Digest::ZERO;
    }

    let height = commitments.len().next_power_of_two().trailing_zeros() + 1;
    block_root(commitments, height)
}

/// The root of a block of height `height`, holding up to `2^(height - 1)` commitments
fn block_root(commitments: &[Digest], height: u32) -> Digest {
    if height == 1 {
        return commitments[0];
    }

    let half = 1 << (height - 2);
    if commitments.len() <= half {
        hash_single(block_root(commitments, height - 1))
    } else {
        let (left, right) = commitments.split_at(half);
        hash_merge(block_root(left, height - 1), block_root(right, height - 1))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{commitment, events_for};

    #[test]
    fn memory_ledger_counts_in_twos() {
        let mut ledger = MemoryLedger::new();
        for i in 0..4 {
            ledger.append(commitment(i).digest()).unwrap();
        }

        let counts: Vec<_> = ledger.events().iter().map(|e| e.running_count).collect();
        assert_eq!(counts, vec![2, 4, 6, 8]);
        assert_eq!(ledger.events(), &events_for(4)[..]);
    }

    #[test]
    fn memory_ledger_rejects_repeats() {
        let mut ledger = MemoryLedger::new();
        let digest = commitment(0).digest();

        ledger.append(digest).unwrap();
        assert_eq!(
            ledger.append(digest),
            Err(MemoryLedgerError::AlreadyCommitted(digest))
        );
        assert_eq!(ledger.commitments().len(), 1);
    }

    #[test]
    fn events_since_returns_the_tail() {
        let mut ledger = MemoryLedger::new();
        for i in 0..3 {
            ledger.append(commitment(i).digest()).unwrap();
        }

        assert_eq!(ledger.events_since(0).unwrap().len(), 3);
        assert_eq!(ledger.events_since(4).unwrap(), vec![ledger.events()[2]]);
        assert!(ledger.events_since(6).unwrap().is_empty());
    }

    #[test]
    fn canonical_root_promotes_short_right_blocks() {
        let h: Vec<_> = (0..5).map(|i| commitment(i).digest()).collect();
        let c01 = hash_merge(h[0], h[1]);
        let c23 = hash_merge(h[2], h[3]);

        assert_eq!(canonical_root(&h[..2]), c01);
        assert_eq!(canonical_root(&h[..4]), hash_merge(c01, c23));
        assert_eq!(
            canonical_root(&h[..5]),
            hash_merge(hash_merge(c01, c23), hash_single(hash_single(h[4])))
        );
    }

    #[test]
    fn insert_then_sync() {
        let mut ledger = MemoryLedger::new();
        let mut tree = HistoryTree::new();

        let a = tree.insert(&mut ledger, "a", 4u64).unwrap();
        assert_eq!(tree.root(), Digest::ZERO);

        let root = tree.sync(&ledger).unwrap();
        assert_eq!(root, a.digest());
        assert_eq!(root, ledger.root().unwrap());

        tree.insert(&mut ledger, "c", 7u64).unwrap();
        tree.sync(&ledger).unwrap();
        assert_eq!(tree.root(), ledger.root().unwrap());
        assert_eq!(tree.running_count(), 4);
    }

    #[test]
    fn insert_reports_ledger_rejection() {
        let mut ledger = MemoryLedger::new();
        let mut tree = HistoryTree::new();

        let a = tree.insert(&mut ledger, "a", 4u64).unwrap();
        let error = tree.insert(&mut ledger, "a", 4u64).unwrap_err();

        assert_eq!(
            error,
            SyncError::Ledger(MemoryLedgerError::AlreadyCommitted(a.digest()))
        );
    }

    #[test]
    fn rejected_insert_keeps_existing_proofs() {
        #[derive(Debug, Default)]
        struct Flaky {
            inner: MemoryLedger,
            fail: bool,
        }

        impl Ledger for Flaky {
            type Error = MemoryLedgerError;

            fn insert(&mut self, value: Digest, salt: Digest) -> Result<(), Self::Error> {
                if self.fail {
                    return Err(MemoryLedgerError::AlreadyCommitted(hash_merge(value, salt)));
                }
                self.inner.insert(value, salt)
            }

            fn root(&self) -> Result<Digest, Self::Error> {
                self.inner.root()
            }

            fn events_since(&self, running_count: u64) -> Result<Vec<AppendEvent>, Self::Error> {
                self.inner.events_since(running_count)
            }
        }

        let mut ledger = Flaky::default();
        let mut tree = HistoryTree::new();

        tree.insert(&mut ledger, "yes", 1u64).unwrap();
        tree.insert(&mut ledger, "no", 2u64).unwrap();
        let root = tree.sync(&ledger).unwrap();
        let before = tree.clone();

        ledger.fail = true;
        let error = tree.insert(&mut ledger, "yes", 3u64).unwrap_err();

        assert!(matches!(error, SyncError::Ledger(_)));
        assert_eq!(tree, before);
        assert_eq!(tree.local_commitments().len(), 2);
        assert!(tree.prove_value(root, "yes").unwrap().verify());
    }

    #[test]
    fn clashing_insert_is_never_submitted() {
        let mut ledger = MemoryLedger::new();
        let mut tree = HistoryTree::new();

        let a = tree.insert(&mut ledger, "a", 4u64).unwrap();

        // a full word is hashed unpadded, so this value digest is the salt digest of `a`
        let mut word = [0u8; 32];
        word[31] = 4;
        let error = tree.insert(&mut ledger, word, 5u64).unwrap_err();

        assert!(matches!(error, SyncError::History(Error::DuplicateCommit(_))));
        assert_eq!(ledger.commitments(), &[a.digest()]);
    }

    #[test]
    fn sync_with_nothing_new_is_a_no_op() {
        let (mut tree, ledger) = crate::history! { "a" => 1u64, "b" => 2u64 };
        let before = tree.clone();

        tree.sync(&ledger).unwrap();
        assert_eq!(tree, before);
    }

    #[test]
    fn resync_rebuilds_and_keeps_local_commitments() {
        let (mut tree, mut ledger) = crate::history! {
            "a" => 1u64,
            "b" => 2u64,
            "c" => 3u64,
        };

        // another voter commits through the ledger directly
        ledger.insert(commitment(9).value(), commitment(9).salt()).unwrap();

        let root = tree.resync(&ledger).unwrap();
        assert_eq!(root, ledger.root().unwrap());
        assert_eq!(tree.local_commitments().len(), 3);
        assert!(tree.prove_value(root, "b").unwrap().verify());
    }

    #[test]
    fn failed_resync_leaves_tree_untouched() {
        #[derive(Debug)]
        struct Broken(Vec<AppendEvent>);

        impl Ledger for Broken {
            type Error = MemoryLedgerError;

            fn insert(&mut self, _: Digest, _: Digest) -> Result<(), Self::Error> {
                Ok(())
            }

            fn root(&self) -> Result<Digest, Self::Error> {
                Ok(Digest::ZERO)
            }

            fn events_since(&self, _: u64) -> Result<Vec<AppendEvent>, Self::Error> {
                Ok(self.0.clone())
            }
        }

        let (mut tree, ledger) = crate::history! { "a" => 1u64, "b" => 2u64 };
        let before = tree.clone();

        // a log with its second event missing
        let mut events = ledger.events().to_vec();
        events.remove(1);
        events.push(AppendEvent::new(commitment(5).digest(), 6));

        let error = tree.resync(&Broken(events)).unwrap_err();
        assert_eq!(
            error,
            SyncError::History(Error::OutOfOrderEvent {
                expected: 4,
                found: 6
            })
        );
        assert_eq!(tree, before);
    }
}
