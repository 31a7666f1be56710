//! # SessionState — one link in the off-chain state chain
//!
//! Each state commits to its predecessor's hash and carries the full
//! append-only action history. A state is *committed* only once both the
//! owner and the counterparty have signed its hash.
//!
//! ## Hash Invariant
//!
//! ```text
//! state_hash = SHA-256(prefix || session_id || nonce || canonical(balances)
//!                      || previous_state_hash | "genesis" || canonical(action_log))
//! ```
//!
//! The preimage field order is fixed: independently implemented verifiers
//! must reproduce the same hash from the same fields. Asset keys are sorted
//! (see [`Balances`]) and the action log is length-prefixed and ordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Action, Balances, SessionId, canonical_action_log, constants};

/// A SHA-256 state commitment.
pub type StateHash = [u8; 32];

/// The dual-signature slots for one state.
///
/// Both must be present (and individually valid) before the state is
/// considered committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSignatures {
    /// Owner's ed25519 signature over `state_hash`.
    pub owner: Option<Vec<u8>>,
    /// Counterparty's ed25519 signature over `state_hash`.
    pub counterparty: Option<Vec<u8>>,
}

impl StateSignatures {
    /// Whether both parties have signed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.owner.is_some() && self.counterparty.is_some()
    }
}

/// One immutable link in a session's off-chain state chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// The session this state belongs to.
    pub session_id: SessionId,
    /// Strictly increasing sequence number. Genesis is 0.
    pub nonce: u64,
    /// Balances after applying every action in the log.
    pub balances: Balances,
    /// Hash of the predecessor state. `None` only at nonce 0.
    pub previous_state_hash: Option<StateHash>,
    /// This state's own commitment hash.
    pub state_hash: StateHash,
    /// Full ordered history of applied actions. Append-only.
    pub action_log: Vec<Action>,
    /// Dual signatures over `state_hash`.
    pub signatures: StateSignatures,
    /// When this state was produced.
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// Canonical hash preimage over the given state fields.
    #[must_use]
    pub fn hash_payload(
        session_id: SessionId,
        nonce: u64,
        balances: &Balances,
        previous_state_hash: Option<&StateHash>,
        action_log: &[Action],
    ) -> Vec<u8> {
        let mut payload = Vec::with_capacity(256);
        payload.extend_from_slice(constants::STATE_HASH_PREFIX);
        payload.extend_from_slice(session_id.0.as_bytes());
        payload.extend_from_slice(&nonce.to_le_bytes());
        payload.extend_from_slice(&balances.canonical_bytes());
        match previous_state_hash {
            Some(hash) => payload.extend_from_slice(hash),
            None => payload.extend_from_slice(constants::GENESIS_MARKER),
        }
        payload.extend_from_slice(&canonical_action_log(action_log));
        payload
    }

    /// Compute the state hash over the given fields.
    #[must_use]
    pub fn compute_state_hash(
        session_id: SessionId,
        nonce: u64,
        balances: &Balances,
        previous_state_hash: Option<&StateHash>,
        action_log: &[Action],
    ) -> StateHash {
        let payload =
            Self::hash_payload(session_id, nonce, balances, previous_state_hash, action_log);
        let digest = Sha256::digest(&payload);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }

    /// Re-derive this state's hash from its own fields.
    #[must_use]
    pub fn recompute_hash(&self) -> StateHash {
        Self::compute_state_hash(
            self.session_id,
            self.nonce,
            &self.balances,
            self.previous_state_hash.as_ref(),
            &self.action_log,
        )
    }

    /// Whether the stored hash matches the recomputed one — the first
    /// tamper check every verifier runs.
    #[must_use]
    pub fn hash_matches(&self) -> bool {
        self.recompute_hash() == self.state_hash
    }

    /// Whether this is the genesis state.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.nonce == 0
    }

    /// Attach the owner's signature, consuming and returning the state.
    #[must_use]
    pub fn with_owner_signature(mut self, signature: Vec<u8>) -> Self {
        self.signatures.owner = Some(signature);
        self
    }

    /// The payload the owner signs to authorize settlement of this state:
    /// `prefix || session_id || state_hash`.
    #[must_use]
    pub fn settlement_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(80);
        payload.extend_from_slice(constants::SETTLEMENT_PREFIX);
        payload.extend_from_slice(self.session_id.0.as_bytes());
        payload.extend_from_slice(&self.state_hash);
        payload
    }
}
