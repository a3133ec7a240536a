// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Bounded Hop Set

//! Fixed-width set of relative hop indices.
//!
//! The lookahead strategy marks, per vertex, which hop positions within the
//! current tick visited it. Sets from different workers are merged with a
//! union, so two chips passing the same vertex at the same hop index in the
//! same tick are counted once. Firing estimates built from hop sets are
//! therefore biased low on graphs where many chips converge on one vertex.

use serde::{Deserialize, Serialize};

use crate::params::MAX_LOOKAHEAD;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopSet(u64);

impl HopSet {
    pub const WIDTH: usize = MAX_LOOKAHEAD;

    pub const fn empty() -> Self {
        HopSet(0)
    }

    /// Mark hop `k`. Indices at or beyond [`HopSet::WIDTH`] are ignored.
    #[inline]
    pub fn insert(&mut self, k: usize) {
        if k < Self::WIDTH {
            self.0 |= 1u64 << k;
        }
    }

    #[inline]
    pub fn contains(&self, k: usize) -> bool {
        k < Self::WIDTH && self.0 & (1u64 << k) != 0
    }

    #[inline]
    pub fn union_with(&mut self, other: HopSet) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Return the current contents and leave the set empty.
    #[inline]
    pub fn take(&mut self) -> HopSet {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut s = HopSet::empty();
        s.insert(3);
        s.insert(3);
        s.insert(63);
        assert_eq!(s.len(), 2);
        assert!(s.contains(3) && s.contains(63));
        assert!(!s.contains(4));
    }

    #[test]
    fn out_of_width_indices_are_ignored() {
        let mut s = HopSet::empty();
        s.insert(64);
        s.insert(1000);
        assert!(s.is_empty());
    }

    #[test]
    fn union_collapses_shared_hops() {
        // Two workers saw the vertex at hop 2; the merge counts it once.
        let mut a = HopSet::empty();
        a.insert(0);
        a.insert(2);
        let mut b = HopSet::empty();
        b.insert(2);
        b.insert(5);
        a.union_with(b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn take_clears() {
        let mut s = HopSet::empty();
        s.insert(1);
        let t = s.take();
        assert_eq!(t.len(), 1);
        assert!(s.is_empty());
    }
}
