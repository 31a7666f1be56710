//! # SessionRecord — the committed, authoritative session record
//!
//! A `SessionRecord` is created once when capital is locked, and mutated
//! only by a successful settlement.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ lock  ┌────────┐  verified proof  ┌─────────┐
//!   │ CREATED ├──────▶│ ACTIVE ├─────────────────▶│ SETTLED │
//!   └─────────┘       └───┬────┘                  └─────────┘
//!                         │ fraud proof      ▲
//!                         ▼                  │ adjudicated
//!                     ┌──────────┐           │
//!                     │ DISPUTED ├───────────┘
//!                     └──────────┘
//! ```
//!
//! ## Safety Properties
//!
//! - **Single settlement**: ACTIVE → SETTLED happens at most once.
//! - **Irreversible**: SETTLED is terminal; the record is immutable afterwards.
//! - **Atomic commit**: status, settlement time, final hash, and proof change
//!   together or not at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Balances, PartyId, Result, SessionId, SettlementProof, StateHash, StatelockError};

/// The lifecycle state of a session.
///
/// Transitions are **monotonic** except for the DISPUTED excursion:
/// - `Created → Active` (capital locked, genesis state signed)
/// - `Active → Settled` (settlement proof accepted)
/// - `Active → Disputed` (fraud proof submitted during the challenge window)
/// - `Disputed → Active` (challenge rejected)
/// - `Disputed → Settled` (challenge resolved, settlement finalized)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Record exists but the off-chain chain has not started.
    Created,
    /// Off-chain state chain is growing. The only state from which
    /// settlement may proceed.
    Active,
    /// A bonded fraud proof is pending adjudication.
    Disputed,
    /// Settlement accepted. **Irreversible.**
    Settled,
}

impl SessionStatus {
    /// Can this session transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Active)
                | (Self::Active, Self::Settled | Self::Disputed)
                | (Self::Disputed, Self::Active | Self::Settled)
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Disputed => write!(f, "DISPUTED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// The committed record for one session. Owned by the verifier; the engine
/// never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Globally unique session identifier.
    pub session_id: SessionId,
    /// The owner's ed25519 public key.
    pub owner: PartyId,
    /// The owner's derived address.
    pub owner_address: Address,
    /// Capital locked at session creation, per asset. Never mutated.
    pub locked_assets: Balances,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// When the capital-locking event was recorded.
    pub created_at: DateTime<Utc>,
    /// When settlement was accepted. `None` until SETTLED.
    pub settled_at: Option<DateTime<Utc>>,
    /// The final state hash commitment. `None` until SETTLED.
    pub final_state_hash: Option<StateHash>,
    /// The accepted settlement proof. `None` until SETTLED
    /// (and `None` after an emergency settlement, which has no full proof).
    pub settlement_proof: Option<SettlementProof>,
}

impl SessionRecord {
    /// Create a record from a capital-locking event. Status starts CREATED.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        owner: PartyId,
        owner_address: Address,
        locked_assets: Balances,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            owner,
            owner_address,
            locked_assets,
            status: SessionStatus::Created,
            created_at,
            settled_at: None,
            final_state_hash: None,
            settlement_proof: None,
        }
    }

    /// Transition CREATED → ACTIVE once the genesis state is dual-signed.
    ///
    /// # Errors
    /// Returns [`StatelockError::SessionNotActive`] if the record is not CREATED.
    pub fn activate(&mut self) -> Result<()> {
        if !self.status.can_transition_to(SessionStatus::Active) {
            return Err(StatelockError::SessionNotActive {
                status: self.status,
            });
        }
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Whether settlement may proceed against this record.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Mark the session DISPUTED (fraud proof submitted).
    ///
    /// # Errors
    /// Returns [`StatelockError::SessionNotActive`] unless the session is ACTIVE.
    pub fn mark_disputed(&mut self) -> Result<()> {
        if !self.status.can_transition_to(SessionStatus::Disputed) {
            return Err(StatelockError::SessionNotActive {
                status: self.status,
            });
        }
        self.status = SessionStatus::Disputed;
        Ok(())
    }

    /// Return the session to ACTIVE after a rejected challenge.
    ///
    /// # Errors
    /// Returns [`StatelockError::SessionNotActive`] unless the session is DISPUTED.
    pub fn resolve_dispute(&mut self) -> Result<()> {
        if self.status != SessionStatus::Disputed {
            return Err(StatelockError::SessionNotActive {
                status: self.status,
            });
        }
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Consume this record and produce the SETTLED version.
    ///
    /// All settlement fields change together — this is the atomic commit
    /// step. The caller (verifier) only invokes this after every check has
    /// passed; on any verification failure the original record is returned
    /// unchanged and capital remains locked.
    ///
    /// # Errors
    /// Returns [`StatelockError::SessionNotActive`] if the current status
    /// cannot transition to SETTLED.
    pub fn into_settled(
        self,
        final_state_hash: StateHash,
        settlement_proof: Option<SettlementProof>,
        settled_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !self.status.can_transition_to(SessionStatus::Settled) {
            return Err(StatelockError::SessionNotActive {
                status: self.status,
            });
        }
        Ok(Self {
            status: SessionStatus::Settled,
            settled_at: Some(settled_at),
            final_state_hash: Some(final_state_hash),
            settlement_proof,
            ..self
        })
    }
}
