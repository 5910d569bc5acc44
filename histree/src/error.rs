use crate::hash::Digest;

/// Result type for operations on a [`HistoryTree`]
///
/// [`HistoryTree`]: crate::HistoryTree
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error encountered while replaying append events or extracting proofs
///
/// None of these are retried internally. An error raised during replay aborts the replay, leaving
/// the tree at the last event that was applied in full
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested root has no record, usually because the tree has not been synced up to it
    #[error("root {0} does not exist or the tree is not fully synced")]
    UnknownRoot(Digest),

    /// The requested leaf has no record
    #[error("no node recorded for {0}")]
    UnknownLeaf(Digest),

    /// The requested leaf exists, but is not a committed value or pair commitment
    #[error("node {0} is not a committed leaf")]
    NotALeaf(Digest),

    /// The walk from the leaf ran out of parents before reaching the root
    #[error("no path from {leaf} to root {root}")]
    ProofNotFound {
        /// The leaf the walk started from
        leaf: Digest,
        /// The root the walk was aiming for
        root: Digest,
    },

    /// An append event's running count did not follow on from the last applied event
    #[error("out of order append event: expected running count {expected}, found {found}")]
    OutOfOrderEvent {
        /// The running count the next event must carry
        expected: u64,
        /// The running count the event actually carried
        found: u64,
    },

    /// A pair commitment collided with a node of a different shape, or was appended twice
    #[error("{0} already exists with a different shape")]
    DuplicateCommit(Digest),
}
