//! Merkle digests over layer records
//!
//! Thin wrapper around `rs_merkle` turning an ordered list of record hashes
//! into a single [`ContentHash`]. Layers feed their records in index order,
//! so two layers with identical records produce identical digests no matter
//! how they were built.

use crate::hash::ContentHash;
use rs_merkle::{Hasher, MerkleTree};

/// Blake3 hasher adapter for rs_merkle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    type Hash = [u8; 32];

    #[inline]
    fn hash(data: &[u8]) -> Self::Hash {
        *blake3::hash(data).as_bytes()
    }
}

/// Accumulates record hashes and folds them into a Merkle root
#[derive(Debug, Clone, Default)]
pub struct DigestTree {
    leaves: Vec<[u8; 32]>,
}

impl DigestTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` leaves
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            leaves: Vec::with_capacity(capacity),
        }
    }

    /// Append a leaf
    #[inline]
    pub fn push(&mut self, leaf: ContentHash) {
        self.leaves.push(*leaf.as_bytes());
    }

    /// Number of leaves
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Check if tree is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Root hash of the tree
    ///
    /// The leaf count is mixed into the result so that an empty tree and a
    /// tree whose single leaf happens to be all zeros differ.
    #[must_use]
    pub fn root(&self) -> ContentHash {
        let root = MerkleTree::<Blake3Hasher>::from_leaves(&self.leaves)
            .root()
            .unwrap_or([0u8; 32]);
        let mut framed = Vec::with_capacity(40);
        framed.extend_from_slice(&(self.leaves.len() as u64).to_le_bytes());
        framed.extend_from_slice(&root);
        ContentHash::compute(&framed)
    }
}

impl FromIterator<ContentHash> for DigestTree {
    fn from_iter<I: IntoIterator<Item = ContentHash>>(iter: I) -> Self {
        Self {
            leaves: iter.into_iter().map(|h| *h.as_bytes()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> ContentHash {
        ContentHash::compute(&[n])
    }

    #[test]
    fn empty_tree_has_stable_root() {
        assert_eq!(DigestTree::new().root(), DigestTree::new().root());
        assert!(DigestTree::new().is_empty());
    }

    #[test]
    fn root_depends_on_order() {
        let ab: DigestTree = [leaf(1), leaf(2)].into_iter().collect();
        let ba: DigestTree = [leaf(2), leaf(1)].into_iter().collect();
        assert_ne!(ab.root(), ba.root());
    }

    #[test]
    fn root_changes_when_leaf_changes() {
        let mut a = DigestTree::with_capacity(3);
        let mut b = DigestTree::with_capacity(3);
        for n in 0..3 {
            a.push(leaf(n));
            b.push(leaf(if n == 2 { 9 } else { n }));
        }
        assert_eq!(a.len(), 3);
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn empty_differs_from_zero_leaf() {
        let mut zero = DigestTree::new();
        zero.push(ContentHash::default());
        assert_ne!(zero.root(), DigestTree::new().root());
    }
}
