//! Merkle proof data model.
//!
//! The construction/verification algorithms live in `statelock-crypto`;
//! this crate only defines the proof carried in fraud evidence and
//! settlement bundles.

use serde::{Deserialize, Serialize};

use crate::StateHash;

/// A compact Merkle inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Hash of the leaf being proven.
    pub leaf_hash: StateHash,
    /// Index of the leaf within the (padded) leaf set.
    pub leaf_index: usize,
    /// Sibling hashes from leaf level up to (excluding) the root.
    pub siblings: Vec<StateHash>,
    /// The root this proof claims membership in.
    pub root: StateHash,
}

impl MerkleProof {
    /// Depth of the proof path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}
