//! Basic settlement verification and atomic commit.
//!
//! `verify_and_settle` takes ownership of the session record and either
//! returns the SETTLED version together with the payout outcome, or an
//! error with capital untouched. There is no partially settled record.

use chrono::{DateTime, Utc};
use statelock_crypto::verify;
use statelock_engine::{verify_capital_constraint, verify_chain};
use statelock_types::{
    PartyId, Result, SessionRecord, SessionState, SettlementOutcome, SettlementProof,
    StatelockError, VerifierConfig,
};

/// Verifies settlement proofs and commits accepted settlements.
pub struct SettlementVerifier {
    config: VerifierConfig,
}

impl SettlementVerifier {
    /// Create a verifier with the given configuration.
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Create a verifier with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(VerifierConfig::default())
    }

    /// Verify a settlement proof against the session record and, if every
    /// check passes, commit the settlement atomically.
    ///
    /// Check order is fixed and short-circuiting:
    /// 1. record is ACTIVE
    /// 2. session id constant across record, proof, and every state
    /// 3. state chain re-verification (genesis shape, hashes, links, nonces)
    /// 4. dual signatures on every state
    /// 5. proof internal consistency (final state, balances)
    /// 6. capital conservation on final balances vs locked assets
    /// 7. declared action count matches the final log
    /// 8. owner settlement signature over the settlement payload
    ///
    /// On failure the record is dropped unchanged and capital stays locked;
    /// the caller retains its own copy.
    ///
    /// # Errors
    /// The first failed check, as a 1xx or 2xx error.
    pub fn verify_and_settle(
        &self,
        record: SessionRecord,
        proof: &SettlementProof,
        owner: &PartyId,
        counterparty: &PartyId,
    ) -> Result<(SessionRecord, SettlementOutcome)> {
        // 1. Lifecycle gate. Double settlement dies here.
        if !record.is_active() {
            return Err(StatelockError::SessionNotActive {
                status: record.status,
            });
        }

        // 2. Session binding before anything derived from the proof is
        // inspected.
        if proof.session_id != record.session_id {
            return Err(StatelockError::SessionIdMismatch {
                expected: record.session_id,
                actual: proof.session_id,
            });
        }
        for state in &proof.state_history {
            if state.session_id != record.session_id {
                return Err(StatelockError::SessionIdMismatch {
                    expected: record.session_id,
                    actual: state.session_id,
                });
            }
        }

        // 3. Full chain re-verification from first principles.
        verify_chain(&proof.state_history)?;

        // 4. Dual signatures on every state in the chain.
        for state in &proof.state_history {
            verify_state_signatures(state, owner, counterparty)?;
        }

        // 5. Internal consistency of the proof bundle.
        let final_in_history = proof
            .state_history
            .last()
            .ok_or(StatelockError::ConstraintViolation {
                reason: "state history is empty".into(),
            })?;
        if proof.final_state.state_hash != final_in_history.state_hash {
            return Err(StatelockError::HashMismatch {
                nonce: proof.final_state.nonce,
            });
        }
        if proof.final_balances != proof.final_state.balances {
            return Err(StatelockError::ConstraintViolation {
                reason: "declared final balances do not match the final state".into(),
            });
        }

        // 6. Capital conservation, the non-negotiable check.
        verify_capital_constraint(&proof.final_balances, &record.locked_assets)?;

        // 7. Declared action count.
        if proof.total_actions != proof.final_state.action_log.len() {
            return Err(StatelockError::ActionCountMismatch {
                declared: proof.total_actions,
                actual: proof.final_state.action_log.len(),
            });
        }

        // 8. Owner authorization to settle at exactly this final state.
        if !verify(
            &proof.settlement_payload(),
            &proof.settlement_signature,
            owner,
        ) {
            return Err(StatelockError::SignatureVerificationFailed {
                party: "owner (settlement)".into(),
                nonce: proof.final_state.nonce,
            });
        }

        // Atomic commit.
        let outcome = SettlementOutcome::derive(
            record.session_id,
            &record.locked_assets,
            &proof.final_balances,
        );
        let settled = record.into_settled(
            proof.final_state_hash(),
            Some(proof.clone()),
            Utc::now(),
        )?;

        tracing::info!(
            session = %settled.session_id,
            states = proof.chain_len(),
            actions = proof.total_actions,
            "settlement accepted"
        );

        Ok((settled, outcome))
    }

    /// Emergency settlement against a single dual-signed state, available
    /// once the counterparty has been silent past the configured timeout.
    ///
    /// The state still gets the full treatment — session binding, hash
    /// recomputation, dual signatures, capital conservation — it is only
    /// the chain history and the settlement signature that the emergency
    /// path waives. The committed record carries no proof bundle.
    ///
    /// # Errors
    /// [`StatelockError::CounterpartyUnresponsive`] before the timeout
    /// elapses, otherwise the first failed check.
    pub fn emergency_settle(
        &self,
        record: SessionRecord,
        last_state: &SessionState,
        owner: &PartyId,
        counterparty: &PartyId,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(SessionRecord, SettlementOutcome)> {
        let elapsed_secs = (now - last_activity).num_seconds();
        if elapsed_secs < self.config.counterparty_timeout_secs {
            return Err(StatelockError::CounterpartyUnresponsive {
                elapsed_secs,
                timeout_secs: self.config.counterparty_timeout_secs,
            });
        }

        if !record.is_active() {
            return Err(StatelockError::SessionNotActive {
                status: record.status,
            });
        }
        if last_state.session_id != record.session_id {
            return Err(StatelockError::SessionIdMismatch {
                expected: record.session_id,
                actual: last_state.session_id,
            });
        }
        if !last_state.hash_matches() {
            return Err(StatelockError::HashMismatch {
                nonce: last_state.nonce,
            });
        }
        verify_state_signatures(last_state, owner, counterparty)?;
        verify_capital_constraint(&last_state.balances, &record.locked_assets)?;

        let outcome = SettlementOutcome::derive(
            record.session_id,
            &record.locked_assets,
            &last_state.balances,
        );
        let settled = record.into_settled(last_state.state_hash, None, now)?;

        tracing::warn!(
            session = %settled.session_id,
            nonce = last_state.nonce,
            elapsed_secs,
            "emergency settlement accepted"
        );

        Ok((settled, outcome))
    }
}

/// Require both signatures present and individually valid over the
/// state's hash.
pub(crate) fn verify_state_signatures(
    state: &SessionState,
    owner: &PartyId,
    counterparty: &PartyId,
) -> Result<()> {
    let owner_sig =
        state
            .signatures
            .owner
            .as_ref()
            .ok_or(StatelockError::SignatureVerificationFailed {
                party: "owner".into(),
                nonce: state.nonce,
            })?;
    if !verify(&state.state_hash, owner_sig, owner) {
        return Err(StatelockError::SignatureVerificationFailed {
            party: "owner".into(),
            nonce: state.nonce,
        });
    }

    let counterparty_sig = state.signatures.counterparty.as_ref().ok_or(
        StatelockError::SignatureVerificationFailed {
            party: "counterparty".into(),
            nonce: state.nonce,
        },
    )?;
    if !verify(&state.state_hash, counterparty_sig, counterparty) {
        return Err(StatelockError::SignatureVerificationFailed {
            party: "counterparty".into(),
            nonce: state.nonce,
        });
    }

    Ok(())
}
