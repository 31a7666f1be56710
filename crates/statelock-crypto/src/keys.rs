//! Ed25519 key pairs and address derivation.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use statelock_types::{Address, PartyId, constants};

use crate::hash::sha256;

/// An ed25519 key pair plus the derived party address.
///
/// The signing key is kept private to this struct; callers sign through
/// [`Keypair::sign`] and identify themselves by [`Keypair::party_id`].
pub struct Keypair {
    signing: SigningKey,
    /// The public half.
    pub verifying: VerifyingKey,
    /// Address derived from the public key (and optional identity string).
    pub address: Address,
}

impl Keypair {
    /// Generate a fresh key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::build(SigningKey::generate(&mut OsRng), None)
    }

    /// Generate a fresh key pair whose address also commits to an
    /// identity string.
    #[must_use]
    pub fn generate_with_identity(identity: &str) -> Self {
        Self::build(SigningKey::generate(&mut OsRng), Some(identity))
    }

    /// Deterministic key pair from a 32-byte seed. Intended for tests and
    /// reproducible fixtures.
    #[must_use]
    pub fn from_seed(seed: [u8; 32], identity: Option<&str>) -> Self {
        Self::build(SigningKey::from_bytes(&seed), identity)
    }

    fn build(signing: SigningKey, identity: Option<&str>) -> Self {
        let verifying = signing.verifying_key();
        let address = derive_address(&verifying, identity);
        Self {
            signing,
            verifying,
            address,
        }
    }

    /// Sign a message, returning the 64-byte ed25519 signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing.sign(message).to_bytes().to_vec()
    }

    /// This key pair's protocol identity (the raw public key).
    #[must_use]
    pub fn party_id(&self) -> PartyId {
        PartyId(self.verifying.to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the signing key.
        f.debug_struct("Keypair")
            .field("party_id", &self.party_id())
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive a party address: the first 20 bytes of
/// `SHA-256(public_key [|| identity])`.
#[must_use]
pub fn derive_address(verifying: &VerifyingKey, identity: Option<&str>) -> Address {
    let mut preimage = Vec::with_capacity(64);
    preimage.extend_from_slice(&verifying.to_bytes());
    if let Some(identity) = identity {
        preimage.extend_from_slice(identity.as_bytes());
    }
    let digest = sha256(&preimage);
    let mut address = [0u8; constants::ADDRESS_LEN];
    address.copy_from_slice(&digest[..constants::ADDRESS_LEN]);
    Address(address)
}
