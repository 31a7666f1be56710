//! Configuration for engines and verifiers.
//!
//! There are no module-level singletons anywhere in StateLock: every engine
//! and verifier instance is constructed explicitly with its key material
//! and one of these policy/config values.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActionKindTag, Balances, constants};

/// Per-session policy enforced by the state chain engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Action kinds the engine will apply. Anything else is rejected
    /// with `ActionNotAllowed`.
    pub allowed_actions: HashSet<ActionKindTag>,
    /// Optional per-asset balance ceilings for Deposit actions. When set
    /// (normally to the originally locked amounts), a deposit that would
    /// push a balance above its ceiling is rejected, keeping the
    /// capital-conservation invariant true for every reachable state.
    pub deposit_caps: Option<Balances>,
    /// Hard cap on the action log length for one session.
    pub max_actions_per_session: usize,
}

impl EnginePolicy {
    /// Policy allowing every action kind, capped at the given balances.
    #[must_use]
    pub fn allow_all_capped(deposit_caps: Balances) -> Self {
        Self {
            deposit_caps: Some(deposit_caps),
            ..Self::default()
        }
    }

    /// Whether the given kind is permitted.
    #[must_use]
    pub fn allows(&self, tag: ActionKindTag) -> bool {
        self.allowed_actions.contains(&tag)
    }
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            allowed_actions: [
                ActionKindTag::Deduct,
                ActionKindTag::Deposit,
                ActionKindTag::Transfer,
            ]
            .into_iter()
            .collect(),
            deposit_caps: None,
            max_actions_per_session: constants::MAX_ACTIONS_PER_SESSION,
        }
    }
}

/// Configuration for settlement verifiers and the advanced pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Fraud-proof challenge window in seconds. Also gates the optional
    /// challenge-period check in the advanced pipeline.
    pub challenge_window_secs: i64,
    /// Seconds of counterparty silence before the emergency settlement
    /// path is available.
    pub counterparty_timeout_secs: i64,
    /// Minimum bond a fraud-proof submission must stake.
    pub min_fraud_bond: Decimal,
    /// Run the optimistic challenge-period check in the advanced pipeline.
    pub check_challenge_period: bool,
    /// Include the zero-knowledge verification stubs in the pipeline
    /// report. The stubs carry zero weight and are clearly labelled —
    /// they stand in for a real proving system and must never be trusted.
    pub enable_zk_stubs: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: constants::DEFAULT_CHALLENGE_WINDOW_SECS,
            counterparty_timeout_secs: constants::DEFAULT_COUNTERPARTY_TIMEOUT_SECS,
            min_fraud_bond: Decimal::new(constants::DEFAULT_MIN_FRAUD_BOND_UNITS, 0),
            check_challenge_period: false,
            enable_zk_stubs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_all_kinds() {
        let policy = EnginePolicy::default();
        assert!(policy.allows(ActionKindTag::Deduct));
        assert!(policy.allows(ActionKindTag::Deposit));
        assert!(policy.allows(ActionKindTag::Transfer));
        assert!(policy.deposit_caps.is_none());
    }

    #[test]
    fn restricted_policy_blocks() {
        let policy = EnginePolicy {
            allowed_actions: [ActionKindTag::Deduct].into_iter().collect(),
            ..EnginePolicy::default()
        };
        assert!(policy.allows(ActionKindTag::Deduct));
        assert!(!policy.allows(ActionKindTag::Transfer));
    }

    #[test]
    fn capped_policy_carries_caps() {
        let mut caps = Balances::new();
        caps.credit("ETH", Decimal::new(10, 0));
        let policy = EnginePolicy::allow_all_capped(caps);
        assert!(policy.deposit_caps.is_some());
    }

    #[test]
    fn verifier_config_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.challenge_window_secs, 3600);
        assert_eq!(config.counterparty_timeout_secs, 300);
        assert_eq!(config.min_fraud_bond, Decimal::new(100, 0));
        assert!(!config.check_challenge_period);
        assert!(!config.enable_zk_stubs);
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = VerifierConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: VerifierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.challenge_window_secs, back.challenge_window_secs);
        assert_eq!(config.min_fraud_bond, back.min_fraud_bond);
    }
}
