//! Per-level storage of the open edges
//!
//! Slot `i` holds the root of a completed block of `2^i` elements that has not been merged into a
//! larger block yet. After `n` elements have been accumulated, slot `i` is occupied exactly when
//! bit `i` of `n` is set. Level 0 exists but is never occupied, since every append adds two
//! elements.

use crate::hash::Digest;

/// Occupancy array of the accumulator's open edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeStack {
    slots: Vec<Option<Digest>>,
}

impl Default for EdgeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeStack {
    /// Create an edge stack for an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self { slots: vec![None] }
    }

    /// The number of levels currently tracked, including empty ones
    #[inline]
    #[must_use]
    pub fn levels(&self) -> usize {
        self.slots.len()
    }

    /// The edge waiting at `level`, if any
    #[inline]
    #[must_use]
    pub fn get(&self, level: usize) -> Option<Digest> {
        self.slots.get(level).copied().flatten()
    }

    /// Set or clear the edge at `level`, growing the stack if needed
    pub fn set(&mut self, level: usize, edge: Option<Digest>) {
        if level >= self.slots.len() {
            self.slots.resize(level + 1, None);
        }
        self.slots[level] = edge;
    }

    /// Add a new top level holding `edge`
    pub fn push(&mut self, edge: Digest) {
        self.slots.push(Some(edge));
    }

    /// The indices of the non-empty levels, lowest first
    pub fn occupied_levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(level, slot)| slot.map(|_| level))
    }

    /// Iterate over `(level, edge)` for every occupied level, lowest first
    pub fn iter(&self) -> impl Iterator<Item = (usize, Digest)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(level, slot)| slot.map(|edge| (level, edge)))
    }

    /// Whether the occupied levels are exactly the set bits of `count`
    #[must_use]
    pub fn matches_count(&self, count: u64) -> bool {
        let occupied = self
            .occupied_levels()
            .fold(0u64, |acc, level| acc | (1 << level));

        occupied == count
    }
}
