//! Ed25519 signing and verification.
//!
//! Verification is total: malformed signatures or keys return `false`
//! rather than erroring, so verifier pipelines can treat "does not verify"
//! uniformly.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use statelock_types::{PartyId, constants};

/// Sign a message with the given key, returning the 64-byte signature.
#[must_use]
pub fn sign(message: &[u8], key: &SigningKey) -> Vec<u8> {
    key.sign(message).to_bytes().to_vec()
}

/// Verify a signature against a party's public key.
///
/// Returns `false` for malformed signatures, malformed keys, or a
/// non-verifying signature.
#[must_use]
pub fn verify(message: &[u8], signature: &[u8], party: &PartyId) -> bool {
    let Ok(verifying) = VerifyingKey::from_bytes(party.as_bytes()) else {
        return false;
    };
    verify_with_key(message, signature, &verifying)
}

/// Verify a signature against an already-parsed verifying key.
#[must_use]
pub fn verify_with_key(message: &[u8], signature: &[u8], key: &VerifyingKey) -> bool {
    if signature.len() != constants::SIGNATURE_LEN {
        return false;
    }
    let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&bytes);
    key.verify(message, &signature).is_ok()
}
