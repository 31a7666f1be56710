//! Settlement proof — the bundle submitted once, at session end.
//!
//! A `SettlementProof` lets the verifier accept or reject the entire
//! session's outcome atomically: it carries the full state history, the
//! final state, a Merkle commitment over the action log, and the owner's
//! settlement signature binding the session id to the final state hash.

use serde::{Deserialize, Serialize};

use crate::{Balances, SessionId, SessionState, StateHash};

/// The complete settlement bundle for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementProof {
    /// The session being settled.
    pub session_id: SessionId,
    /// Full `SessionState` history, genesis first.
    pub state_history: Vec<SessionState>,
    /// The final state (must equal the last history entry).
    pub final_state: SessionState,
    /// Merkle root over the canonical action-log leaves.
    pub action_root: StateHash,
    /// Declared number of actions (must match the final log length).
    pub total_actions: usize,
    /// Final per-asset balances (copied from the final state).
    pub final_balances: Balances,
    /// Owner's ed25519 signature over the settlement payload
    /// (`prefix || session_id || final_state_hash`).
    pub settlement_signature: Vec<u8>,
}

impl SettlementProof {
    /// The final state hash this proof commits to.
    #[must_use]
    pub fn final_state_hash(&self) -> StateHash {
        self.final_state.state_hash
    }

    /// The payload the settlement signature must verify against.
    #[must_use]
    pub fn settlement_payload(&self) -> Vec<u8> {
        self.final_state.settlement_payload()
    }

    /// Number of states in the history.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.state_history.len()
    }
}

/// The outcome of an accepted settlement: what the backing ledger should
/// release back to the owner and what was consumed during the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    /// The settled session.
    pub session_id: SessionId,
    /// Per-asset amounts returned to the owner (the final balances).
    pub returned: Balances,
    /// Per-asset amounts consumed during the session (locked − final).
    pub consumed: Balances,
}

impl SettlementOutcome {
    /// Derive the outcome from locked capital and final balances.
    ///
    /// Only assets present in the locked set appear in `consumed`; the
    /// verifier has already rejected finals for unlocked assets.
    #[must_use]
    pub fn derive(session_id: SessionId, locked: &Balances, final_balances: &Balances) -> Self {
        let mut consumed = Balances::new();
        for (asset, locked_amount) in locked.iter() {
            consumed.set(asset.clone(), *locked_amount - final_balances.get(asset));
        }
        Self {
            session_id,
            returned: final_balances.clone(),
            consumed,
        }
    }
}
