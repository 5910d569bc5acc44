//! The node table: every digest the tree has ever produced, keyed by itself
//!
//! Nodes refer to each other by digest rather than by pointer. Records are never removed and their
//! kind and children never change once known; only the `parent`/`sibling` links move, as open
//! edges get re-paired while the accumulator grows.

use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    hash::Digest,
};

/// What a node in the [`NodeTable`] stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// The digest of a (padded) revealed value
    Value,
    /// The digest of a salt
    Salt,
    /// A pair commitment, `hash_merge(value, salt)` - the unit appended to the accumulator
    Commitment,
    /// `hash_single(child)`, a node lifted one level because it had no sibling
    Promoted,
    /// `hash_merge(left, right)` of two accumulator nodes
    Paired,
}

/// A single entry in the [`NodeTable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    kind: NodeKind,
    children: Vec<Digest>,
    parent: Option<Digest>,
    sibling: Option<Digest>,
    appended_at: Option<u64>,
}

impl NodeRecord {
    fn new(kind: NodeKind, children: Vec<Digest>) -> Self {
        Self {
            kind,
            children,
            parent: None,
            sibling: None,
            appended_at: None,
        }
    }

    /// A childless record, for values, salts and commitments only known from the event log
    #[must_use]
    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// A pair commitment whose value and salt digests are known locally
    #[must_use]
    pub fn commitment(value: Digest, salt: Digest) -> Self {
        Self::new(NodeKind::Commitment, vec![value, salt])
    }

    /// A self-promoted node wrapping `child`
    #[must_use]
    pub fn promoted(child: Digest) -> Self {
        Self::new(NodeKind::Promoted, vec![child])
    }

    /// A paired node with `left` inserted before `right`
    #[must_use]
    pub fn paired(left: Digest, right: Digest) -> Self {
        Self::new(NodeKind::Paired, vec![left, right])
    }

    /// What this node stands for
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The children of this node, in insertion order
    ///
    /// Empty for values, salts and commitments not committed locally, one child for promoted
    /// nodes, two otherwise
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Digest] {
        &self.children
    }

    /// The node this one was most recently combined into, `None` for the current root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Digest> {
        self.parent
    }

    /// The other child under [`NodeRecord::parent`], `None` when the parent is a promotion
    #[inline]
    #[must_use]
    pub fn sibling(&self) -> Option<Digest> {
        self.sibling
    }

    /// For commitments, the running count of the append event that accumulated it
    #[inline]
    #[must_use]
    pub fn appended_at(&self) -> Option<u64> {
        self.appended_at
    }

    /// Whether an inclusion proof may start from this node
    ///
    /// Revealed values and pair commitments are leaves, everything else is structure
    #[inline]
    #[must_use]
    pub fn is_commit_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Value | NodeKind::Commitment)
    }

    fn same_shape(&self, other: &NodeRecord) -> bool {
        self.kind == other.kind
            && (self.children.is_empty()
                || other.children.is_empty()
                || self.children == other.children)
    }
}

/// Content-addressed store of every node in the tree
///
/// Little more than a map. It is ordered so that two tables built from the same events compare
/// and iterate identically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeTable {
    nodes: BTreeMap<Digest, NodeRecord>,
}

impl NodeTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for `digest`
    #[inline]
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&NodeRecord> {
        self.nodes.get(digest)
    }

    /// Returns `true` if and only if `digest` has a record
    #[inline]
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.nodes.contains_key(digest)
    }

    /// The number of records in the table
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if and only if the table has no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every record, ordered by digest
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &NodeRecord)> {
        self.nodes.iter()
    }

    /// Check that `record` could be stored under `digest` without changing an existing record's
    /// kind or children
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommit`] if `digest` already has a record of a different shape
    pub fn check(&self, digest: &Digest, record: &NodeRecord) -> Result<()> {
        match self.nodes.get(digest) {
            Some(existing) if !existing.same_shape(record) => Err(Error::DuplicateCommit(*digest)),
            _ => Ok(()),
        }
    }

    /// Store `record` under `digest`
    ///
    /// If a record already exists, it is kept, gaining the children of `record` if it had none,
    /// and any links `record` carries
    ///
    /// ```rust
    /// # use histree::{hash::Digest, table::{NodeKind, NodeRecord, NodeTable}};
    /// let mut table = NodeTable::new();
    /// let digest = Digest::calculate(b"commitment");
    ///
    /// table.put(digest, NodeRecord::leaf(NodeKind::Commitment)).unwrap();
    /// assert!(table.put(digest, NodeRecord::leaf(NodeKind::Salt)).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCommit`] if `digest` already has a record of a different shape,
    /// in which case the table is unchanged
    pub fn put(&mut self, digest: Digest, record: NodeRecord) -> Result<()> {
        self.check(&digest, &record)?;

        match self.nodes.get_mut(&digest) {
            None => {
                self.nodes.insert(digest, record);
            }
            Some(existing) => {
                if existing.children.is_empty() {
                    existing.children = record.children;
                }
                existing.parent = record.parent.or(existing.parent);
                existing.sibling = record.sibling.or(existing.sibling);
                existing.appended_at = record.appended_at.or(existing.appended_at);
            }
        }

        Ok(())
    }

    /// Store a node computed by the accumulator, keeping any record already under `digest`
    ///
    /// Computed digests are hashes of their children, so an existing record has the same shape
    pub(crate) fn insert_computed(&mut self, digest: Digest, record: NodeRecord) {
        self.nodes.entry(digest).or_insert(record);
    }

    /// Point `child` at `parent`, replacing any earlier link
    pub(crate) fn link(&mut self, child: Digest, parent: Digest, sibling: Option<Digest>) {
        debug_assert!(self.nodes.contains_key(&child), "linking unknown node {child}");

        if let Some(record) = self.nodes.get_mut(&child) {
            record.parent = Some(parent);
            record.sibling = sibling;
        }
    }

    pub(crate) fn mark_appended(&mut self, digest: &Digest, running_count: u64) {
        if let Some(record) = self.nodes.get_mut(digest) {
            record.appended_at = Some(running_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn digest(s: &str) -> Digest {
        Digest::calculate(s.as_bytes())
    }

    #[test]
    fn put_then_get() {
        let mut table = NodeTable::new();
        assert!(table.is_empty());

        table
            .put(digest("c"), NodeRecord::commitment(digest("v"), digest("s")))
            .unwrap();

        let record = table.get(&digest("c")).unwrap();
        assert_eq!(record.kind(), NodeKind::Commitment);
        assert_eq!(record.children(), &[digest("v"), digest("s")]);
        assert_eq!(record.parent(), None);
        assert!(record.is_commit_leaf());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn put_fills_in_missing_children() {
        let mut table = NodeTable::new();
        table
            .put(digest("c"), NodeRecord::leaf(NodeKind::Commitment))
            .unwrap();
        table
            .put(digest("c"), NodeRecord::commitment(digest("v"), digest("s")))
            .unwrap();

        assert_eq!(
            table.get(&digest("c")).unwrap().children(),
            &[digest("v"), digest("s")]
        );

        // a later childless put does not erase them
        table
            .put(digest("c"), NodeRecord::leaf(NodeKind::Commitment))
            .unwrap();
        assert_eq!(table.get(&digest("c")).unwrap().children().len(), 2);
    }

    #[test]
    fn put_rejects_different_shape() {
        let mut table = NodeTable::new();
        table
            .put(digest("c"), NodeRecord::commitment(digest("v"), digest("s")))
            .unwrap();

        let before = table.clone();

        assert_eq!(
            table.put(digest("c"), NodeRecord::commitment(digest("v"), digest("t"))),
            Err(Error::DuplicateCommit(digest("c")))
        );
        assert_eq!(
            table.put(digest("c"), NodeRecord::promoted(digest("v"))),
            Err(Error::DuplicateCommit(digest("c")))
        );
        assert_eq!(table, before);
    }

    #[test]
    fn link_replaces_earlier_parent() {
        let mut table = NodeTable::new();
        table
            .put(digest("edge"), NodeRecord::leaf(NodeKind::Commitment))
            .unwrap();

        table.link(digest("edge"), digest("p1"), None);
        assert_eq!(table.get(&digest("edge")).unwrap().parent(), Some(digest("p1")));

        table.link(digest("edge"), digest("p2"), Some(digest("right")));
        let record = table.get(&digest("edge")).unwrap();
        assert_eq!(record.parent(), Some(digest("p2")));
        assert_eq!(record.sibling(), Some(digest("right")));
    }

    #[test]
    fn insert_computed_keeps_existing_links() {
        let mut table = NodeTable::new();
        table.insert_computed(digest("p"), NodeRecord::promoted(digest("x")));
        table.link(digest("p"), digest("root"), Some(digest("y")));

        table.insert_computed(digest("p"), NodeRecord::promoted(digest("x")));
        assert_eq!(table.get(&digest("p")).unwrap().parent(), Some(digest("root")));
    }

    #[test]
    fn only_values_and_commitments_are_leaves() {
        assert!(NodeRecord::leaf(NodeKind::Value).is_commit_leaf());
        assert!(NodeRecord::leaf(NodeKind::Commitment).is_commit_leaf());
        assert!(!NodeRecord::leaf(NodeKind::Salt).is_commit_leaf());
        assert!(!NodeRecord::promoted(digest("x")).is_commit_leaf());
        assert!(!NodeRecord::paired(digest("x"), digest("y")).is_commit_leaf());
    }
}
