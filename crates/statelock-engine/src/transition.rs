//! Pure re-derivation checks over states produced elsewhere.
//!
//! The engine trusts its own output; nobody else should. These functions
//! re-derive every claim a [`SessionState`] makes — hash, linkage, nonce
//! sequence, balance arithmetic — from first principles, without keys and
//! without an engine instance. Signature checks live with the verifier,
//! which knows the party identities.

use rust_decimal::Decimal;
use statelock_types::{ActionKind, Balances, Result, SessionState, StatelockError};

/// Verify that `next` is the unique legal successor of `prev`.
///
/// Checks, in order: session id, nonce sequence, hash linkage, action log
/// extension (exactly one new action carrying the new nonce), balance
/// re-derivation, and the stored hash of `next`.
///
/// # Errors
/// Returns the first failed check as a 2xx verifier error.
pub fn verify_state_transition(prev: &SessionState, next: &SessionState) -> Result<()> {
    if next.session_id != prev.session_id {
        return Err(StatelockError::SessionIdMismatch {
            expected: prev.session_id,
            actual: next.session_id,
        });
    }

    if next.nonce != prev.nonce + 1 {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: format!("nonce {} does not follow {}", next.nonce, prev.nonce),
        });
    }

    if next.previous_state_hash != Some(prev.state_hash) {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: "previous_state_hash does not link to predecessor".into(),
        });
    }

    // The log must be the predecessor's log plus exactly one action,
    // stamped with the new nonce.
    if next.action_log.len() != prev.action_log.len() + 1 {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: format!(
                "action log grew by {} entries, expected 1",
                next.action_log.len() as i64 - prev.action_log.len() as i64
            ),
        });
    }
    if next.action_log[..prev.action_log.len()] != prev.action_log[..] {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: "action log prefix was rewritten".into(),
        });
    }
    let applied = &next.action_log[prev.action_log.len()];
    if applied.nonce != next.nonce {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: format!("appended action carries nonce {}", applied.nonce),
        });
    }

    // A non-positive amount would make `debit` add balance (or `credit`
    // remove it), so it is rejected outright rather than re-applied.
    if applied.kind.amount() <= Decimal::ZERO {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: format!("action amount {} is not positive", applied.kind.amount()),
        });
    }

    // Re-derive the balances from the predecessor's.
    let mut derived = prev.balances.clone();
    match &applied.kind {
        ActionKind::Deduct { asset, amount } | ActionKind::Transfer { asset, amount, .. } => {
            derived.debit(asset, *amount)?;
        }
        ActionKind::Deposit { asset, amount } => derived.credit(asset, *amount),
    }
    if derived != next.balances {
        return Err(StatelockError::StateChainBroken {
            nonce: next.nonce,
            reason: "balances do not match re-applied action".into(),
        });
    }

    if !next.hash_matches() {
        return Err(StatelockError::HashMismatch { nonce: next.nonce });
    }

    require_dual_signatures(next)
}

/// Presence check only; cryptographic verification needs the party
/// identities and lives with the verifier.
fn require_dual_signatures(state: &SessionState) -> Result<()> {
    if state.signatures.owner.is_none() {
        return Err(StatelockError::SignatureVerificationFailed {
            party: "owner".into(),
            nonce: state.nonce,
        });
    }
    if state.signatures.counterparty.is_none() {
        return Err(StatelockError::SignatureVerificationFailed {
            party: "counterparty".into(),
            nonce: state.nonce,
        });
    }
    Ok(())
}

/// Verify the capital-conservation constraint: for every asset appearing
/// in the final balances, `0 <= final <= locked`. Assets absent from
/// `locked` are treated as locked at zero, so any positive final balance
/// in an unlocked asset is a violation.
///
/// # Errors
/// Returns [`StatelockError::CapitalConservationViolated`] naming the
/// first offending asset.
pub fn verify_capital_constraint(final_balances: &Balances, locked: &Balances) -> Result<()> {
    for (asset, amount) in final_balances.iter() {
        let cap = locked.get(asset);
        if *amount < Decimal::ZERO || *amount > cap {
            return Err(StatelockError::CapitalConservationViolated {
                asset: asset.clone(),
                final_balance: *amount,
                locked: cap,
            });
        }
    }
    Ok(())
}

/// Verify a full state history: a well-formed genesis followed by a
/// valid transition at every step.
///
/// # Errors
/// Returns the first failed check; an empty history is a
/// [`StatelockError::ConstraintViolation`].
pub fn verify_chain(history: &[SessionState]) -> Result<()> {
    let Some(genesis) = history.first() else {
        return Err(StatelockError::ConstraintViolation {
            reason: "state history is empty".into(),
        });
    };

    if genesis.nonce != 0 || genesis.previous_state_hash.is_some() {
        return Err(StatelockError::StateChainBroken {
            nonce: genesis.nonce,
            reason: "history does not start at a genesis state".into(),
        });
    }
    if !genesis.action_log.is_empty() {
        return Err(StatelockError::StateChainBroken {
            nonce: 0,
            reason: "genesis state carries a non-empty action log".into(),
        });
    }
    if genesis.balances.has_negative() {
        return Err(StatelockError::StateChainBroken {
            nonce: 0,
            reason: "genesis state holds a negative balance".into(),
        });
    }
    if !genesis.hash_matches() {
        return Err(StatelockError::HashMismatch { nonce: 0 });
    }
    require_dual_signatures(genesis)?;

    for pair in history.windows(2) {
        verify_state_transition(&pair[0], &pair[1])?;
    }

    Ok(())
}
