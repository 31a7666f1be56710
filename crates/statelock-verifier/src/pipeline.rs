//! Advanced weighted verification pipeline.
//!
//! Unlike [`settle`](crate::settle), which short-circuits on the first
//! failure, the pipeline runs every check and produces a full
//! [`VerificationReport`]: per-check pass/fail with details, a 0–100
//! confidence score, and an overall verdict. Advisory checks (the fraud
//! scan) and zero-weight stubs inform the report without gating validity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use statelock_crypto::{merkle_root, verify};
use statelock_engine::verify_chain;
use statelock_types::{
    ExtendedSettlementProof, PartyId, SessionRecord, VerifierConfig,
};

use crate::settle::verify_state_signatures;

/// One check's outcome within the pipeline.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Stable check name, suitable for logs and dashboards.
    pub name: &'static str,
    /// Whether the check passed.
    pub passed: bool,
    /// Human-readable detail, populated on failure (and for findings).
    pub details: String,
    /// Contribution to the confidence score.
    pub weight: u32,
    /// Advisory checks never gate the overall verdict.
    pub advisory: bool,
}

/// The pipeline's aggregated verdict.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// Every check that ran, in execution order.
    pub checks: Vec<CheckResult>,
    /// Weighted pass ratio scaled to 0–100.
    pub confidence: u32,
    /// True only if every non-advisory check passed.
    pub valid: bool,
    /// When the pipeline ran.
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    fn from_checks(checks: Vec<CheckResult>) -> Self {
        let total: u32 = checks.iter().map(|c| c.weight).sum();
        let earned: u32 = checks
            .iter()
            .filter(|c| c.passed)
            .map(|c| c.weight)
            .sum();
        let confidence = if total == 0 { 0 } else { earned * 100 / total };
        let valid = checks.iter().all(|c| c.advisory || c.passed);
        Self {
            checks,
            confidence,
            valid,
            verified_at: Utc::now(),
        }
    }

    /// Look up a check by name.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Runs the weighted pipeline over extended settlement proofs.
pub struct AdvancedVerifier {
    config: VerifierConfig,
}

impl AdvancedVerifier {
    /// Create a pipeline verifier with the given configuration.
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline verifier with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(VerifierConfig::default())
    }

    /// Run every check against the extended proof and produce a report.
    ///
    /// `last_activity` feeds the optional challenge-period check; `now`
    /// is injected so callers (and tests) control the clock.
    #[must_use]
    pub fn verify_settlement(
        &self,
        record: &SessionRecord,
        proof: &ExtendedSettlementProof,
        owner: &PartyId,
        counterparty: &PartyId,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> VerificationReport {
        let mut checks = vec![
            self.check_proof_integrity(record, proof),
            self.check_merkle_commitments(proof),
            self.check_state_transitions(record, proof),
            self.check_balance_solvency(proof),
            self.check_signatures(proof, owner, counterparty),
            self.check_fraud_indicators(proof),
        ];
        if self.config.check_challenge_period {
            checks.push(self.check_challenge_period(last_activity, now));
        }
        if self.config.enable_zk_stubs {
            checks.push(Self::zk_stub());
        }

        let report = VerificationReport::from_checks(checks);
        tracing::info!(
            session = %record.session_id,
            confidence = report.confidence,
            valid = report.valid,
            "pipeline verification complete"
        );
        report
    }

    /// Structural consistency of the bundle: session binding, final hash,
    /// declared counts, declared volume.
    fn check_proof_integrity(
        &self,
        record: &SessionRecord,
        proof: &ExtendedSettlementProof,
    ) -> CheckResult {
        let base = &proof.base;
        let mut failures = Vec::new();

        if base.session_id != record.session_id {
            failures.push(format!(
                "proof session {} does not match record {}",
                base.session_id, record.session_id
            ));
        }
        match base.state_history.last() {
            Some(last) if last.state_hash == base.final_state.state_hash => {}
            Some(_) => failures.push("final state does not match last history entry".into()),
            None => failures.push("state history is empty".into()),
        }
        if base.total_actions != base.final_state.action_log.len() {
            failures.push(format!(
                "declared {} actions, log has {}",
                base.total_actions,
                base.final_state.action_log.len()
            ));
        }
        let volume: Decimal = base
            .final_state
            .action_log
            .iter()
            .map(|a| a.kind.amount())
            .sum();
        if proof.total_volume != volume {
            failures.push(format!(
                "declared volume {} does not match log volume {volume}",
                proof.total_volume
            ));
        }

        result("proof_integrity", 25, false, failures)
    }

    /// Rebuild all three Merkle roots from raw leaves; embedded roots are
    /// claims, not facts.
    fn check_merkle_commitments(&self, proof: &ExtendedSettlementProof) -> CheckResult {
        let mut failures = Vec::new();

        if merkle_root(&proof.settlement_leaves()) != proof.settlement_root {
            failures.push("settlement root does not match rebuilt tree".into());
        }
        if merkle_root(&proof.action_leaves()) != proof.base.action_root {
            failures.push("action root does not match rebuilt tree".into());
        }
        if merkle_root(&proof.transfer_leaves()) != proof.transfer_root {
            failures.push("transfer root does not match rebuilt tree".into());
        }

        result("merkle_commitments", 20, false, failures)
    }

    /// Chain validity plus the settlement-entry arithmetic: initial
    /// amounts equal locked capital, finals never exceed initials, and
    /// every entry is terminal.
    fn check_state_transitions(
        &self,
        record: &SessionRecord,
        proof: &ExtendedSettlementProof,
    ) -> CheckResult {
        let mut failures = Vec::new();

        if let Err(err) = verify_chain(&proof.base.state_history) {
            failures.push(err.to_string());
        }
        if let Some(genesis) = proof.base.state_history.first() {
            if genesis.balances != record.locked_assets {
                failures.push("genesis balances do not equal locked capital".into());
            }
        }
        for entry in &proof.asset_settlements {
            if entry.initial_amount != record.locked_assets.get(&entry.asset) {
                failures.push(format!(
                    "{}: declared initial {} does not match locked capital",
                    entry.asset, entry.initial_amount
                ));
            }
            if entry.final_amount > entry.initial_amount {
                failures.push(format!(
                    "{}: final {} exceeds initial {}",
                    entry.asset, entry.final_amount, entry.initial_amount
                ));
            }
            if !entry.status.is_terminal() {
                failures.push(format!("{}: non-terminal settlement entry", entry.asset));
            }
        }
        for transfer in &proof.transfer_settlements {
            if !transfer.status.is_terminal() {
                failures.push(format!(
                    "transfer at nonce {}: non-terminal entry",
                    transfer.nonce
                ));
            }
        }

        result("state_transitions", 20, false, failures)
    }

    /// No negative finals; aggregate final value never exceeds aggregate
    /// initial value.
    fn check_balance_solvency(&self, proof: &ExtendedSettlementProof) -> CheckResult {
        let mut failures = Vec::new();

        for (asset, amount) in proof.base.final_balances.iter() {
            if *amount < Decimal::ZERO {
                failures.push(format!("{asset}: negative final balance {amount}"));
            }
        }
        let initial_total: Decimal = proof
            .asset_settlements
            .iter()
            .map(|e| e.initial_amount)
            .sum();
        let final_total: Decimal = proof
            .asset_settlements
            .iter()
            .map(|e| e.final_amount)
            .sum();
        if final_total > initial_total {
            failures.push(format!(
                "aggregate final {final_total} exceeds aggregate initial {initial_total}"
            ));
        }

        result("balance_solvency", 15, false, failures)
    }

    /// Distinct parties, dual signatures on the final state, and the
    /// owner's settlement authorization.
    fn check_signatures(
        &self,
        proof: &ExtendedSettlementProof,
        owner: &PartyId,
        counterparty: &PartyId,
    ) -> CheckResult {
        let mut failures = Vec::new();

        if owner == counterparty {
            failures.push("owner and counterparty are the same key".into());
        }
        if let Err(err) = verify_state_signatures(&proof.base.final_state, owner, counterparty) {
            failures.push(err.to_string());
        }
        if !verify(
            &proof.base.settlement_payload(),
            &proof.base.settlement_signature,
            owner,
        ) {
            failures.push("settlement signature does not verify".into());
        }

        result("signatures", 15, false, failures)
    }

    /// Advisory scan for fraud indicators: duplicate settlement entries,
    /// duplicate action nonces, value extraction. Findings lower the
    /// confidence score but never gate validity on their own — the
    /// weighted checks above already reject anything provably wrong.
    fn check_fraud_indicators(&self, proof: &ExtendedSettlementProof) -> CheckResult {
        let mut findings = Vec::new();

        let mut seen_assets = std::collections::HashSet::new();
        for entry in &proof.asset_settlements {
            if !seen_assets.insert(entry.asset.clone()) {
                findings.push(format!("duplicate settlement entry for {}", entry.asset));
            }
            if entry.final_amount > entry.initial_amount {
                findings.push(format!(
                    "value extraction on {}: {} from {}",
                    entry.asset, entry.final_amount, entry.initial_amount
                ));
            }
        }

        let mut seen_nonces = std::collections::HashSet::new();
        for action in &proof.base.final_state.action_log {
            if !seen_nonces.insert(action.nonce) {
                findings.push(format!("duplicate action nonce {}", action.nonce));
            }
        }

        result("fraud_scan", 5, true, findings)
    }

    /// Optimistic challenge window: settlement only counts as
    /// uncontested once the window has fully elapsed since the last
    /// session activity.
    fn check_challenge_period(
        &self,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CheckResult {
        let elapsed = (now - last_activity).num_seconds();
        let window = self.config.challenge_window_secs;
        let failures = if elapsed >= window {
            Vec::new()
        } else {
            vec![format!(
                "challenge window open: {elapsed}s of {window}s elapsed"
            )]
        };
        result("challenge_period", 10, false, failures)
    }

    /// Stand-in for a real proving system. Zero weight, always advisory,
    /// never trusted.
    fn zk_stub() -> CheckResult {
        CheckResult {
            name: "zk_proof_stub",
            passed: true,
            details: "stub only: no proving system is wired in".into(),
            weight: 0,
            advisory: true,
        }
    }
}

fn result(name: &'static str, weight: u32, advisory: bool, failures: Vec<String>) -> CheckResult {
    CheckResult {
        name,
        passed: failures.is_empty(),
        details: failures.join("; "),
        weight,
        advisory,
    }
}
