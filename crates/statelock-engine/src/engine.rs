//! The state chain engine.

use chrono::Utc;
use rust_decimal::Decimal;
use statelock_crypto::{Keypair, merkle_root, verify};
use statelock_types::{
    Action, ActionKind, Balances, EnginePolicy, PartyId, Result, SessionId, SessionState,
    SettlementProof, StateSignatures, StatelockError,
};

/// Sole producer of new [`SessionState`] values for its sessions.
///
/// Holds the counterparty key pair (states it produces carry a fresh
/// counterparty signature) and the session policy. Construct one per
/// process or per test — there is no shared global instance.
pub struct StateChainEngine {
    counterparty: Keypair,
    policy: EnginePolicy,
}

impl StateChainEngine {
    /// Create an engine with the given counterparty keys and policy.
    #[must_use]
    pub fn new(counterparty: Keypair, policy: EnginePolicy) -> Self {
        Self {
            counterparty,
            policy,
        }
    }

    /// The counterparty identity states from this engine are signed with.
    #[must_use]
    pub fn counterparty_id(&self) -> PartyId {
        self.counterparty.party_id()
    }

    /// The policy this engine enforces.
    #[must_use]
    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Build the genesis state for a session: nonce 0, balances equal to
    /// the locked capital, empty action log, no previous hash.
    ///
    /// The counterparty signature is attached immediately; the caller
    /// attaches the owner signature (over `state_hash`) via
    /// [`SessionState::with_owner_signature`] before the state is used.
    #[must_use]
    pub fn create_initial_state(
        &self,
        session_id: SessionId,
        locked_assets: Balances,
        owner: PartyId,
    ) -> SessionState {
        let state_hash =
            SessionState::compute_state_hash(session_id, 0, &locked_assets, None, &[]);
        let counterparty_sig = self.counterparty.sign(&state_hash);

        tracing::info!(
            session = %session_id,
            owner = %owner,
            assets = locked_assets.len(),
            "created genesis state"
        );

        SessionState {
            session_id,
            nonce: 0,
            balances: locked_assets,
            previous_state_hash: None,
            state_hash,
            action_log: Vec::new(),
            signatures: StateSignatures {
                owner: None,
                counterparty: Some(counterparty_sig),
            },
            created_at: Utc::now(),
        }
    }

    /// Validate and apply one action, producing the next immutable state.
    ///
    /// Check order is fixed: policy, nonce, kind-specific validation,
    /// balance mutation, hash, signatures. On any rejection the prior
    /// state is untouched — there is no partial application.
    ///
    /// The provided `owner_signature` must verify over the *new* state
    /// hash against `owner`; a fresh counterparty signature is attached
    /// alongside it.
    ///
    /// # Errors
    /// - [`StatelockError::ActionNotAllowed`] if the kind is outside the policy
    /// - [`StatelockError::InvalidNonce`] unless `action.nonce == current.nonce + 1`
    /// - [`StatelockError::InsufficientBalance`] for an underfunded Deduct/Transfer
    /// - [`StatelockError::ConstraintViolation`] for a non-positive amount,
    ///   a Deposit above its cap, or an overlong action log
    /// - [`StatelockError::InvalidSignature`] if the owner signature does not verify
    pub fn execute_action(
        &self,
        current: &SessionState,
        action: Action,
        owner: &PartyId,
        owner_signature: Vec<u8>,
    ) -> Result<SessionState> {
        // 1. Policy gate.
        if !self.policy.allows(action.kind.tag()) {
            return Err(StatelockError::ActionNotAllowed {
                kind: action.kind.tag().to_string(),
            });
        }

        // 2. Nonce sequencing, acting as the optimistic lock.
        let expected = current.nonce + 1;
        if action.nonce != expected {
            return Err(StatelockError::InvalidNonce {
                expected,
                actual: action.nonce,
            });
        }

        if current.action_log.len() >= self.policy.max_actions_per_session {
            return Err(StatelockError::ConstraintViolation {
                reason: format!(
                    "action log at capacity ({})",
                    self.policy.max_actions_per_session
                ),
            });
        }

        // 3 + 4. Kind-specific validation and balance mutation, applied to
        // a copy so rejection leaves `current` untouched. Every kind moves
        // a strictly positive amount; a negative Deduct would mint balance
        // through `debit` and a negative Deposit would drive it below zero.
        if action.kind.amount() <= Decimal::ZERO {
            return Err(StatelockError::ConstraintViolation {
                reason: format!("action amount {} is not positive", action.kind.amount()),
            });
        }
        let mut new_balances = current.balances.clone();
        match &action.kind {
            ActionKind::Deduct { asset, amount } | ActionKind::Transfer { asset, amount, .. } => {
                new_balances.debit(asset, *amount)?;
            }
            ActionKind::Deposit { asset, amount } => {
                if let Some(caps) = &self.policy.deposit_caps {
                    let after = new_balances.get(asset) + *amount;
                    if after > caps.get(asset) {
                        return Err(StatelockError::ConstraintViolation {
                            reason: format!(
                                "deposit would raise {asset} to {after}, above cap {}",
                                caps.get(asset)
                            ),
                        });
                    }
                }
                new_balances.credit(asset, *amount);
            }
        }

        // 5. Append to the log and commit to the new fields.
        let mut new_log = current.action_log.clone();
        new_log.push(action);
        let new_hash = SessionState::compute_state_hash(
            current.session_id,
            expected,
            &new_balances,
            Some(&current.state_hash),
            &new_log,
        );

        // 6. Dual signatures over the new hash.
        if !verify(&new_hash, &owner_signature, owner) {
            return Err(StatelockError::InvalidSignature {
                reason: format!("owner signature does not verify for nonce {expected}"),
            });
        }
        let counterparty_sig = self.counterparty.sign(&new_hash);

        tracing::debug!(
            session = %current.session_id,
            nonce = expected,
            "applied action"
        );

        // 7. The new immutable state.
        Ok(SessionState {
            session_id: current.session_id,
            nonce: expected,
            balances: new_balances,
            previous_state_hash: Some(current.state_hash),
            state_hash: new_hash,
            action_log: new_log,
            signatures: StateSignatures {
                owner: Some(owner_signature),
                counterparty: Some(counterparty_sig),
            },
            created_at: Utc::now(),
        })
    }

    /// Package a state history into a settlement proof.
    ///
    /// The `settlement_signature` is the owner's signature over the final
    /// state's settlement payload; the verifier checks it, not the engine.
    ///
    /// # Errors
    /// Returns [`StatelockError::ConstraintViolation`] if `history` is empty.
    pub fn generate_settlement_proof(
        &self,
        history: &[SessionState],
        settlement_signature: Vec<u8>,
    ) -> Result<SettlementProof> {
        let Some(final_state) = history.last() else {
            return Err(StatelockError::ConstraintViolation {
                reason: "cannot build a settlement proof from an empty history".into(),
            });
        };

        let action_leaves: Vec<Vec<u8>> = final_state
            .action_log
            .iter()
            .map(Action::canonical_bytes)
            .collect();

        tracing::info!(
            session = %final_state.session_id,
            states = history.len(),
            actions = final_state.action_log.len(),
            "generated settlement proof"
        );

        Ok(SettlementProof {
            session_id: final_state.session_id,
            state_history: history.to_vec(),
            final_state: final_state.clone(),
            action_root: merkle_root(&action_leaves),
            total_actions: final_state.action_log.len(),
            final_balances: final_state.balances.clone(),
            settlement_signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use statelock_types::ActionKindTag;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn setup() -> (StateChainEngine, Keypair, SessionState) {
        let owner = Keypair::from_seed([1u8; 32], None);
        let counterparty = Keypair::from_seed([2u8; 32], None);
        let mut locked = Balances::new();
        locked.credit("ETH", dec(10));

        let engine = StateChainEngine::new(
            counterparty,
            EnginePolicy::allow_all_capped(locked.clone()),
        );
        let genesis = engine.create_initial_state(SessionId::new(), locked, owner.party_id());
        let genesis = sign_as_owner(&owner, genesis);
        (engine, owner, genesis)
    }

    fn sign_as_owner(owner: &Keypair, state: SessionState) -> SessionState {
        let sig = owner.sign(&state.state_hash);
        state.with_owner_signature(sig)
    }

    fn deduct(nonce: u64, amount: i64) -> Action {
        Action::new(
            ActionKind::Deduct {
                asset: "ETH".into(),
                amount: dec(amount),
            },
            nonce,
        )
    }

    /// Apply an action the way a cooperating owner would: pre-compute the
    /// new state hash and sign it.
    fn apply(
        engine: &StateChainEngine,
        owner: &Keypair,
        current: &SessionState,
        action: Action,
    ) -> Result<SessionState> {
        let mut balances = current.balances.clone();
        match &action.kind {
            ActionKind::Deduct { asset, amount } | ActionKind::Transfer { asset, amount, .. } => {
                let have = balances.get(asset);
                // Mirror the engine's rejection so the test helper doesn't
                // fail before the engine gets to.
                if have >= *amount {
                    balances.debit(asset, *amount)?;
                }
            }
            ActionKind::Deposit { asset, amount } => balances.credit(asset, *amount),
        }
        let mut log = current.action_log.clone();
        log.push(action.clone());
        let new_hash = SessionState::compute_state_hash(
            current.session_id,
            action.nonce,
            &balances,
            Some(&current.state_hash),
            &log,
        );
        let owner_sig = owner.sign(&new_hash);
        engine.execute_action(current, action, &owner.party_id(), owner_sig)
    }

    #[test]
    fn genesis_state_shape() {
        let (_, _, genesis) = setup();
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.previous_state_hash.is_none());
        assert!(genesis.action_log.is_empty());
        assert_eq!(genesis.balances.get("ETH"), dec(10));
        assert!(genesis.hash_matches());
        assert!(genesis.signatures.is_complete());
    }

    #[test]
    fn execute_action_advances_chain() {
        let (engine, owner, genesis) = setup();
        let next = apply(&engine, &owner, &genesis, deduct(1, 3)).unwrap();

        assert_eq!(next.nonce, 1);
        assert_eq!(next.balances.get("ETH"), dec(7));
        assert_eq!(next.previous_state_hash, Some(genesis.state_hash));
        assert_eq!(next.action_log.len(), 1);
        assert!(next.hash_matches());
        assert!(next.signatures.is_complete());
    }

    #[test]
    fn scenario_three_deducts() {
        // Lock 10, deduct 1+2+3 → balance 4 at nonce 3.
        let (engine, owner, genesis) = setup();
        let s1 = apply(&engine, &owner, &genesis, deduct(1, 1)).unwrap();
        let s2 = apply(&engine, &owner, &s1, deduct(2, 2)).unwrap();
        let s3 = apply(&engine, &owner, &s2, deduct(3, 3)).unwrap();

        assert_eq!(s3.nonce, 3);
        assert_eq!(s3.balances.get("ETH"), dec(4));
        assert_eq!(s3.action_log.len(), 3);
    }

    #[test]
    fn wrong_nonce_rejected() {
        let (engine, owner, genesis) = setup();
        let err = apply(&engine, &owner, &genesis, deduct(2, 1)).unwrap_err();
        assert!(matches!(
            err,
            StatelockError::InvalidNonce {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn stale_nonce_rejected() {
        let (engine, owner, genesis) = setup();
        let s1 = apply(&engine, &owner, &genesis, deduct(1, 1)).unwrap();
        // Replaying nonce 1 against state 1 is stale.
        let err = apply(&engine, &owner, &s1, deduct(1, 1)).unwrap_err();
        assert!(matches!(err, StatelockError::InvalidNonce { .. }));
    }

    #[test]
    fn insufficient_balance_rejected_without_mutation() {
        let (engine, owner, genesis) = setup();
        let s1 = apply(&engine, &owner, &genesis, deduct(1, 6)).unwrap();
        assert_eq!(s1.balances.get("ETH"), dec(4));

        // Deduct 5 against a balance of 4.
        let err = apply(&engine, &owner, &s1, deduct(2, 5)).unwrap_err();
        assert!(matches!(err, StatelockError::InsufficientBalance { .. }));
        // Prior state unchanged.
        assert_eq!(s1.nonce, 1);
        assert_eq!(s1.balances.get("ETH"), dec(4));
    }

    #[test]
    fn policy_blocks_disallowed_kind() {
        let owner = Keypair::from_seed([1u8; 32], None);
        let counterparty = Keypair::from_seed([2u8; 32], None);
        let mut locked = Balances::new();
        locked.credit("ETH", dec(10));

        let policy = EnginePolicy {
            allowed_actions: [ActionKindTag::Deduct].into_iter().collect(),
            ..EnginePolicy::default()
        };
        let engine = StateChainEngine::new(counterparty, policy);
        let genesis = engine.create_initial_state(SessionId::new(), locked, owner.party_id());
        let genesis = sign_as_owner(&owner, genesis);

        let deposit = Action::new(
            ActionKind::Deposit {
                asset: "ETH".into(),
                amount: dec(1),
            },
            1,
        );
        let err = apply(&engine, &owner, &genesis, deposit).unwrap_err();
        assert!(matches!(err, StatelockError::ActionNotAllowed { .. }));
    }

    #[test]
    fn deposit_within_cap_allowed() {
        let (engine, owner, genesis) = setup();
        let s1 = apply(&engine, &owner, &genesis, deduct(1, 4)).unwrap();

        let deposit = Action::new(
            ActionKind::Deposit {
                asset: "ETH".into(),
                amount: dec(2),
            },
            2,
        );
        let s2 = apply(&engine, &owner, &s1, deposit).unwrap();
        assert_eq!(s2.balances.get("ETH"), dec(8));
    }

    #[test]
    fn deposit_above_cap_rejected() {
        let (engine, owner, genesis) = setup();
        // Balance is 10 and the cap is 10, so any deposit overflows it.
        let deposit = Action::new(
            ActionKind::Deposit {
                asset: "ETH".into(),
                amount: dec(1),
            },
            1,
        );
        let err = apply(&engine, &owner, &genesis, deposit).unwrap_err();
        assert!(matches!(err, StatelockError::ConstraintViolation { .. }));
    }

    #[test]
    fn negative_deduct_rejected() {
        // A negative deduct would pass the available-funds check and mint
        // balance out of thin air.
        let (engine, owner, genesis) = setup();
        let err = apply(&engine, &owner, &genesis, deduct(1, -5)).unwrap_err();
        assert!(matches!(err, StatelockError::ConstraintViolation { .. }));
        assert_eq!(genesis.balances.get("ETH"), dec(10));
    }

    #[test]
    fn negative_deposit_rejected() {
        // A negative deposit would drive the balance below zero.
        let (engine, owner, genesis) = setup();
        let deposit = Action::new(
            ActionKind::Deposit {
                asset: "ETH".into(),
                amount: dec(-12),
            },
            1,
        );
        let err = apply(&engine, &owner, &genesis, deposit).unwrap_err();
        assert!(matches!(err, StatelockError::ConstraintViolation { .. }));
        assert_eq!(genesis.balances.get("ETH"), dec(10));
    }

    #[test]
    fn zero_amount_rejected() {
        let (engine, owner, genesis) = setup();
        let err = apply(&engine, &owner, &genesis, deduct(1, 0)).unwrap_err();
        assert!(matches!(err, StatelockError::ConstraintViolation { .. }));
    }

    #[test]
    fn bad_owner_signature_rejected() {
        let (engine, owner, genesis) = setup();
        let action = deduct(1, 1);
        let err = engine
            .execute_action(&genesis, action, &owner.party_id(), vec![0u8; 64])
            .unwrap_err();
        assert!(matches!(err, StatelockError::InvalidSignature { .. }));
    }

    #[test]
    fn transfer_debits_balance() {
        let (engine, owner, genesis) = setup();
        let transfer = Action::new(
            ActionKind::Transfer {
                asset: "ETH".into(),
                amount: dec(4),
                recipient: statelock_types::Address([9u8; 20]),
            },
            1,
        );
        let s1 = apply(&engine, &owner, &genesis, transfer).unwrap();
        assert_eq!(s1.balances.get("ETH"), dec(6));
    }

    #[test]
    fn proof_binds_final_state() {
        let (engine, owner, genesis) = setup();
        let s1 = apply(&engine, &owner, &genesis, deduct(1, 1)).unwrap();
        let s2 = apply(&engine, &owner, &s1, deduct(2, 2)).unwrap();
        let history = vec![genesis, s1, s2.clone()];

        let settlement_sig = owner.sign(&s2.settlement_payload());
        let proof = engine
            .generate_settlement_proof(&history, settlement_sig)
            .unwrap();

        assert_eq!(proof.final_state_hash(), s2.state_hash);
        assert_eq!(proof.total_actions, 2);
        assert_eq!(proof.final_balances.get("ETH"), dec(7));
        assert_eq!(proof.chain_len(), 3);
    }

    #[test]
    fn empty_history_rejected() {
        let (engine, _, _) = setup();
        let err = engine
            .generate_settlement_proof(&[], vec![0u8; 64])
            .unwrap_err();
        assert!(matches!(err, StatelockError::ConstraintViolation { .. }));
    }
}
