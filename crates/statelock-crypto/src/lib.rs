//! # statelock-crypto
//!
//! Cryptographic primitives for the StateLock protocol. Pure functions and
//! value types only — no state, no I/O beyond randomness consumption
//! during key generation.
//!
//! - **Hashing**: SHA-256 digests ([`sha256`], [`sha256_pair`])
//! - **Keys**: ed25519 key pairs with derived addresses ([`Keypair`])
//! - **Signatures**: signing and verification ([`sign`], [`verify`])
//! - **Merkle trees**: root construction and compact inclusion proofs
//!   ([`merkle_root`], [`generate_merkle_proof`], [`verify_merkle_proof`])
//!
//! Everything here is a real scheme: a fixed-length blob that was not
//! produced by the holder of the signing key never verifies.

pub mod hash;
pub mod keys;
pub mod merkle;
pub mod sig;

pub use hash::{sha256, sha256_pair};
pub use keys::{Keypair, derive_address};
pub use merkle::{generate_merkle_proof, merkle_root, verify_merkle_proof};
pub use sig::{sign, verify, verify_with_key};
