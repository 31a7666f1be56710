//! Fraud proofs — bonded challenges against protocol violations.
//!
//! A challenger stakes a bond and submits evidence of a specific rule
//! violation. The proof is adjudicated within a fixed challenge window:
//! PENDING → VALIDATED | REJECTED, or EXPIRED if the deadline passes first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Action, Address, Asset, FraudProofId, MerkleProof, SessionId};

/// The category of violation a fraud proof asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FraudCategory {
    /// The same value was settled twice.
    DoubleSpend,
    /// A state transition violated the transition rules.
    InvalidTransition,
    /// A signature does not match the signed state.
    SignatureMismatch,
    /// A balance exceeded its locked capital.
    BalanceOverflow,
    /// A transfer was not authorized by both parties.
    UnauthorizedTransfer,
    /// A Merkle inclusion proof does not verify.
    InvalidMerkleProof,
    /// A previously applied action was replayed.
    Replay,
}

impl std::fmt::Display for FraudCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DoubleSpend => "DOUBLE_SPEND",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::UnauthorizedTransfer => "UNAUTHORIZED_TRANSFER",
            Self::InvalidMerkleProof => "INVALID_MERKLE_PROOF",
            Self::Replay => "REPLAY",
        };
        write!(f, "{name}")
    }
}

/// The lifecycle state of a fraud proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FraudStatus {
    /// Submitted, awaiting adjudication.
    Pending,
    /// Evidence held up — fraud proven. Terminal.
    Validated,
    /// Evidence did not hold up. Terminal.
    Rejected,
    /// The challenge deadline passed before adjudication. Terminal.
    Expired,
}

impl std::fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Type-specific evidence carried by a fraud proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudEvidence {
    /// A Merkle proof the challenger claims is invalid. Fraud is proven
    /// if the proof indeed fails verification.
    InvalidMerkleProof { proof: MerkleProof },
    /// Two distinct actions claiming the same nonce (double-spend/replay).
    ConflictingActions { first: Action, second: Action },
    /// Generic expected-vs-actual discrepancy on an asset balance.
    BalanceMismatch {
        asset: Asset,
        expected: Decimal,
        actual: Decimal,
    },
}

/// A bonded fraud challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudProof {
    /// Unique proof identifier.
    pub id: FraudProofId,
    /// The session the challenge targets.
    pub session_id: SessionId,
    /// Who staked the bond.
    pub challenger: Address,
    /// What violation is asserted.
    pub category: FraudCategory,
    /// The evidence payload.
    pub evidence: FraudEvidence,
    /// Bond staked (forfeited if the challenge is rejected).
    pub bond: Decimal,
    /// When the challenge was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Submission time plus the fixed challenge window.
    pub deadline: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: FraudStatus,
}

impl FraudProof {
    /// Whether the challenge deadline has passed.
    #[must_use]
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }
}
