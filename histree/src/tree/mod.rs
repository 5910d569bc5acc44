use crate::{
    commitment::Commitment,
    edges::EdgeStack,
    error::{Error, Result},
    hash::{hash_merge, hash_single, Digest, Hashable},
    replay::{AppendEvent, ELEMENTS_PER_APPEND},
    table::{NodeKind, NodeRecord, NodeTable},
};


/// A local mirror of the ledger's append-only history tree
///
/// The tree is grown one pair commitment at a time with [`HistoryTree::append`], using the running
/// count the ledger reported for that append. Between appends it holds:
///  - the [`NodeTable`] of every node produced so far, used to extract inclusion proofs
///  - the [`EdgeStack`] of subtree roots still waiting for a sibling
///  - the current root
///
/// ```rust
/// # use histree::{hash::hash_merge, AppendEvent, Commitment, HistoryTree};
/// let a = Commitment::new("a", 4u64);
/// let c = Commitment::new("c", 7u64);
///
/// let mut tree = HistoryTree::new();
/// tree.append(&AppendEvent::new(a.digest(), 2)).unwrap();
/// tree.append(&AppendEvent::new(c.digest(), 4)).unwrap();
///
/// assert_eq!(tree.root(), hash_merge(a.digest(), c.digest()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTree {
    table: NodeTable,
    edges: EdgeStack,
    root: Digest,
    running_count: u64,
    local: Vec<Commitment>,
}

impl Default for HistoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryTree {
    /// Create an empty tree, with root [`Digest::ZERO`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: NodeTable::new(),
            edges: EdgeStack::new(),
            root: Digest::ZERO,
            running_count: 0,
            local: Vec::new(),
        }
    }

    /// The root after the last applied append event
    #[inline]
    #[must_use]
    pub fn root(&self) -> Digest {
        self.root
    }

    /// The running count reported by the last applied append event, `0` for an empty tree
    #[inline]
    #[must_use]
    pub fn running_count(&self) -> u64 {
        self.running_count
    }

    /// The number of pair commitments accumulated so far
    #[inline]
    #[must_use]
    pub fn commitment_count(&self) -> u64 {
        self.running_count / ELEMENTS_PER_APPEND
    }

    /// Returns `true` if and only if nothing has been appended yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.running_count == 0
    }

    /// The table of every node produced so far
    #[inline]
    #[must_use]
    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    /// The open edges
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &EdgeStack {
        &self.edges
    }

    /// The commitments recorded locally with [`HistoryTree::commit`], in the order they were made
    #[inline]
    #[must_use]
    pub fn local_commitments(&self) -> &[Commitment] {
        &self.local
    }

    /// Record a commitment to `value` with `salt`
    ///
    /// This only touches local state: the value digest becomes a leaf that proofs can start from.
    /// To also submit it, see [`HistoryTree::insert`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommit`] if any of the commitment's digests already exist as a
    /// different kind of node
    ///
    /// [`HistoryTree::insert`]: crate::HistoryTree::insert
    pub fn commit(&mut self, value: impl AsRef<[u8]>, salt: impl Hashable) -> Result<Commitment> {
        let commitment = Commitment::new(value, salt);
        self.record_commitment(commitment)?;
        Ok(commitment)
    }

    /// Record a commitment built elsewhere, see [`HistoryTree::commit`]
    ///
    /// Recording the same commitment twice is a no-op. Either every node is recorded, or (on
    /// error) none are
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommit`] if any of the commitment's digests already exist as a
    /// different kind of node
    pub fn record_commitment(&mut self, commitment: Commitment) -> Result<()> {
        let nodes = self.check_commitment(commitment)?;

        let digest = commitment.digest();
        let value = commitment.value();
        let salt = commitment.salt();

        for (node, record) in nodes {
            self.table.put(node, record)?;
        }

        self.table.link(value, digest, Some(salt));
        self.table.link(salt, digest, Some(value));

        if !self.local.contains(&commitment) {
            self.local.push(commitment);
        }

        Ok(())
    }

    /// Check `commitment` could be recorded, returning the nodes it would add
    pub(crate) fn check_commitment(
        &self,
        commitment: Commitment,
    ) -> Result<[(Digest, NodeRecord); 3]> {
        let digest = commitment.digest();
        let value = commitment.value();
        let salt = commitment.salt();

        if value == salt {
            return Err(Error::DuplicateCommit(digest));
        }

        let nodes = [
            (digest, NodeRecord::commitment(value, salt)),
            (value, NodeRecord::leaf(NodeKind::Value)),
            (salt, NodeRecord::leaf(NodeKind::Salt)),
        ];

        for (node, record) in &nodes {
            self.table
                .check(node, record)
                .map_err(|_| Error::DuplicateCommit(digest))?;
        }

        Ok(nodes)
    }

    /// Accumulate one pair commitment, returning the new root
    ///
    /// `event.running_count` must be exactly [`ELEMENTS_PER_APPEND`] more than the last applied
    /// count. The climb starts at level 1 and visits every level the edge stack had before this
    /// append: an empty level promotes the climbing node, an occupied level pairs it with the
    /// waiting edge (the edge on the left). The node reached when the carry chain of
    /// `running_count` ends becomes the new edge
    ///
    /// If this returns an error, the tree is unchanged
    ///
    /// # Errors
    ///
    ///  - [`Error::OutOfOrderEvent`] if the running count does not follow on from the last event
    ///  - [`Error::DuplicateCommit`] if the digest has already been appended, or already exists
    ///    as a node that is not a pair commitment
    pub fn append(&mut self, event: &AppendEvent) -> Result<Digest> {
        let expected = self.running_count.saturating_add(ELEMENTS_PER_APPEND);
        if event.running_count != expected {
            return Err(Error::OutOfOrderEvent {
                expected,
                found: event.running_count,
            });
        }

        let leaf = event.pair_commitment_digest;
        if let Some(existing) = self.table.get(&leaf) {
            if existing.kind() != NodeKind::Commitment || existing.appended_at().is_some() {
                return Err(Error::DuplicateCommit(leaf));
            }
        }

        let count = event.running_count;
        self.table.put(leaf, NodeRecord::leaf(NodeKind::Commitment))?;
        self.table.mark_appended(&leaf, count);

        let next_edge_level = count.trailing_zeros() as usize;
        let mut cur = leaf;
        let mut new_edge = leaf;

        for level in 1..self.edges.levels() {
            cur = match self.edges.get(level) {
                None => self.promote(cur),
                Some(edge) => self.pair(edge, cur),
            };

            if level + 1 == next_edge_level {
                new_edge = cur;
            }
        }

        self.update_edges(new_edge, count);
        self.root = cur;
        self.running_count = count;

        Ok(cur)
    }

    fn promote(&mut self, child: Digest) -> Digest {
        let parent = hash_single(child);
        self.table.insert_computed(parent, NodeRecord::promoted(child));
        self.table.link(child, parent, None);
        parent
    }

    fn pair(&mut self, left: Digest, right: Digest) -> Digest {
        let parent = hash_merge(left, right);
        self.table.insert_computed(parent, NodeRecord::paired(left, right));
        self.table.link(left, parent, Some(right));
        self.table.link(right, parent, Some(left));
        parent
    }

    /// Move the edge stack from the binary representation of `count - 2` to that of `count`
    fn update_edges(&mut self, new_edge: Digest, count: u64) {
        let before = count - ELEMENTS_PER_APPEND;

        let mut top = self.edges.levels();
        if count.is_power_of_two() {
            top += 1;
        }

        for level in 1..top {
            let was_set = bit(before, level);
            let is_set = bit(count, level);

            if level >= self.edges.levels() {
                self.edges.push(new_edge);
            } else if is_set && !was_set {
                self.edges.set(level, Some(new_edge));
            } else if was_set && !is_set {
                self.edges.set(level, None);
            }
        }

        debug_assert!(
            self.edges.matches_count(count),
            "edge stack out of step with running count {count}"
        );
    }

    /// An empty tree holding only the locally recorded commitments of this one
    pub(crate) fn reseeded(&self) -> Result<Self> {
        let mut tree = Self::new();
        for commitment in &self.local {
            tree.record_commitment(*commitment)?;
        }
        Ok(tree)
    }
}

fn bit(count: u64, level: usize) -> bool {
    level < 64 && count & (1 << level) != 0
}
