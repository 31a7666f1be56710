//! Merkle tree construction and compact inclusion proofs.
//!
//! Construction rules (must match independently implemented verifiers):
//! - each raw leaf is hashed as `SHA-256(leaf_prefix || leaf)`;
//! - the hashed leaf level is padded to the next power of two with the
//!   fixed padding leaf `SHA-256(pad_preimage)`;
//! - parents are `SHA-256(left || right)` pairwise until one root remains;
//! - an empty leaf set commits to the padding leaf itself.

use statelock_types::{MerkleProof, Result, StateHash, StatelockError, constants};

use crate::hash::{sha256, sha256_pair};

/// Hash one raw leaf with domain separation.
#[must_use]
pub fn hash_leaf(leaf: &[u8]) -> StateHash {
    let mut preimage = Vec::with_capacity(constants::MERKLE_LEAF_PREFIX.len() + leaf.len());
    preimage.extend_from_slice(constants::MERKLE_LEAF_PREFIX);
    preimage.extend_from_slice(leaf);
    sha256(&preimage)
}

/// The fixed padding leaf used to fill the tree to a power of two.
#[must_use]
pub fn padding_leaf() -> StateHash {
    sha256(constants::MERKLE_PAD_LEAF)
}

fn padded_level(leaves: &[Vec<u8>]) -> Vec<StateHash> {
    let mut level: Vec<StateHash> = leaves.iter().map(|leaf| hash_leaf(leaf)).collect();
    if level.is_empty() {
        level.push(padding_leaf());
    }
    let target = level.len().next_power_of_two();
    level.resize(target, padding_leaf());
    level
}

/// Compute the Merkle root over a set of raw leaves.
#[must_use]
pub fn merkle_root(leaves: &[Vec<u8>]) -> StateHash {
    let mut level = padded_level(leaves);
    while level.len() > 1 {
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }
    level[0]
}

/// Build a compact inclusion proof for the leaf at `index`.
///
/// # Errors
/// Returns [`StatelockError::MerkleIndexOutOfRange`] if `index` does not
/// address a real (non-padding) leaf.
pub fn generate_merkle_proof(leaves: &[Vec<u8>], index: usize) -> Result<MerkleProof> {
    if index >= leaves.len() {
        return Err(StatelockError::MerkleIndexOutOfRange {
            index,
            leaf_count: leaves.len(),
        });
    }

    let mut level = padded_level(leaves);
    let leaf_hash = level[index];
    let mut siblings = Vec::new();
    let mut position = index;

    while level.len() > 1 {
        let sibling_index = position ^ 1;
        siblings.push(level[sibling_index]);
        level = level
            .chunks_exact(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
        position /= 2;
    }

    Ok(MerkleProof {
        leaf_hash,
        leaf_index: index,
        siblings,
        root: level[0],
    })
}

/// Verify a compact inclusion proof by folding the path back to the root.
#[must_use]
pub fn verify_merkle_proof(proof: &MerkleProof) -> bool {
    let mut current = proof.leaf_hash;
    let mut position = proof.leaf_index;

    for sibling in &proof.siblings {
        current = if position % 2 == 0 {
            sha256_pair(&current, sibling)
        } else {
            sha256_pair(sibling, &current)
        };
        position /= 2;
    }

    current == proof.root
}
