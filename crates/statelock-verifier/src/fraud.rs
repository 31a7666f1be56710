//! Bonded fraud-proof registry and adjudication.
//!
//! A challenger stakes a bond and submits category-specific evidence. The
//! registry adjudicates within the challenge window: evidence that holds
//! up validates the proof (the session should be disputed); evidence that
//! does not forfeits the bond. Proofs left pending past their deadline
//! expire and can no longer validate.

use chrono::Utc;
use rust_decimal::Decimal;
use statelock_crypto::verify_merkle_proof;
use statelock_types::{
    Address, FraudCategory, FraudEvidence, FraudProof, FraudProofId, FraudStatus, Result,
    SessionId, StatelockError, VerifierConfig,
};

/// In-memory registry of fraud proofs, keyed by id.
///
/// All mutation goes through `&mut self`, so adjudication of a single
/// proof is serialized by construction.
pub struct FraudProofRegistry {
    config: VerifierConfig,
    proofs: std::collections::HashMap<FraudProofId, FraudProof>,
}

impl FraudProofRegistry {
    /// Create an empty registry with the given configuration.
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            proofs: std::collections::HashMap::new(),
        }
    }

    /// Submit a bonded fraud proof. The proof is stored PENDING with a
    /// deadline one challenge window from now.
    ///
    /// # Errors
    /// Returns [`StatelockError::BondTooLow`] if the staked bond is below
    /// the configured minimum.
    pub fn submit_fraud_proof(
        &mut self,
        session_id: SessionId,
        challenger: Address,
        category: FraudCategory,
        evidence: FraudEvidence,
        bond: Decimal,
    ) -> Result<FraudProofId> {
        if bond < self.config.min_fraud_bond {
            return Err(StatelockError::BondTooLow {
                bond,
                minimum: self.config.min_fraud_bond,
            });
        }

        let now = Utc::now();
        let proof = FraudProof {
            id: FraudProofId::new(),
            session_id,
            challenger,
            category,
            evidence,
            bond,
            submitted_at: now,
            deadline: now + chrono::Duration::seconds(self.config.challenge_window_secs),
            status: FraudStatus::Pending,
        };
        let id = proof.id;

        tracing::info!(
            proof = %id,
            session = %session_id,
            category = %category,
            %bond,
            "fraud proof submitted"
        );
        self.proofs.insert(id, proof);
        Ok(id)
    }

    /// Adjudicate a pending fraud proof by evaluating its evidence.
    ///
    /// Evidence evaluation by category:
    /// - `InvalidMerkleProof`: validated if the carried proof indeed
    ///   fails verification;
    /// - `ConflictingActions`: validated if two distinct actions claim
    ///   the same nonce;
    /// - `BalanceMismatch`: validated if the expected and actual amounts
    ///   differ.
    ///
    /// # Errors
    /// - [`StatelockError::FraudProofNotFound`] for an unknown id
    /// - [`StatelockError::FraudProofAlreadyResolved`] for a terminal proof
    /// - [`StatelockError::FraudProofExpired`] if the deadline passed
    ///   before adjudication (the proof is marked EXPIRED)
    pub fn verify_fraud_proof(&mut self, id: FraudProofId) -> Result<FraudStatus> {
        let now = Utc::now();
        let proof = self
            .proofs
            .get_mut(&id)
            .ok_or(StatelockError::FraudProofNotFound(id))?;

        if proof.status != FraudStatus::Pending {
            return Err(StatelockError::FraudProofAlreadyResolved {
                id,
                status: proof.status.to_string(),
            });
        }
        if proof.is_past_deadline(now) {
            proof.status = FraudStatus::Expired;
            tracing::warn!(proof = %id, "fraud proof expired before adjudication");
            return Err(StatelockError::FraudProofExpired(id));
        }

        let fraud_proven = match &proof.evidence {
            FraudEvidence::InvalidMerkleProof { proof: merkle } => !verify_merkle_proof(merkle),
            FraudEvidence::ConflictingActions { first, second } => {
                first.nonce == second.nonce && first != second
            }
            FraudEvidence::BalanceMismatch {
                expected, actual, ..
            } => expected != actual,
        };

        proof.status = if fraud_proven {
            FraudStatus::Validated
        } else {
            FraudStatus::Rejected
        };
        tracing::info!(
            proof = %id,
            status = %proof.status,
            "fraud proof adjudicated"
        );
        Ok(proof.status)
    }

    /// Look up a fraud proof by id.
    #[must_use]
    pub fn get(&self, id: FraudProofId) -> Option<&FraudProof> {
        self.proofs.get(&id)
    }

    /// All proofs targeting a session, in unspecified order.
    #[must_use]
    pub fn proofs_for_session(&self, session_id: SessionId) -> Vec<&FraudProof> {
        self.proofs
            .values()
            .filter(|p| p.session_id == session_id)
            .collect()
    }

    /// Number of proofs currently pending adjudication.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.proofs
            .values()
            .filter(|p| p.status == FraudStatus::Pending)
            .count()
    }

    /// Sweep pending proofs whose deadline has passed, marking them
    /// EXPIRED. Returns how many were swept.
    pub fn expire_stale(&mut self) -> usize {
        let now = Utc::now();
        let mut swept = 0;
        for proof in self.proofs.values_mut() {
            if proof.status == FraudStatus::Pending && proof.is_past_deadline(now) {
                proof.status = FraudStatus::Expired;
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::warn!(count = swept, "expired stale fraud proofs");
        }
        swept
    }
}
