//! Shared fixtures for the integration suites: a cooperating owner and
//! counterparty driving a session end to end.

#![allow(dead_code)] // each test binary uses a subset of the helpers

use chrono::Utc;
use rust_decimal::Decimal;
use statelock_crypto::{Keypair, merkle_root};
use statelock_engine::StateChainEngine;
use statelock_types::{
    Action, ActionKind, AssetSettlement, Balances, EnginePolicy, ExtendedSettlementProof, PartyId,
    Result, SessionId, SessionRecord, SessionState, SettlementEntryStatus, SettlementProof,
    TransferSettlement,
};

pub fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// One live session: the owner's keys, the counterparty's engine, the
/// committed record, and the growing state history.
pub struct TestSession {
    pub owner: Keypair,
    pub engine: StateChainEngine,
    pub record: SessionRecord,
    pub history: Vec<SessionState>,
}

/// Lock `locked_amount` ETH and produce an ACTIVE session with a
/// dual-signed genesis state.
pub fn session(locked_amount: i64) -> TestSession {
    let owner = Keypair::from_seed([11u8; 32], None);
    let counterparty = Keypair::from_seed([22u8; 32], None);
    let mut locked = Balances::new();
    locked.credit("ETH", dec(locked_amount));

    let engine = StateChainEngine::new(
        counterparty,
        EnginePolicy::allow_all_capped(locked.clone()),
    );

    let session_id = SessionId::new();
    let mut record = SessionRecord::new(
        session_id,
        owner.party_id(),
        owner.address,
        locked.clone(),
        Utc::now(),
    );
    record.activate().unwrap();

    let genesis = engine.create_initial_state(session_id, locked, owner.party_id());
    let sig = owner.sign(&genesis.state_hash);
    let genesis = genesis.with_owner_signature(sig);

    TestSession {
        owner,
        engine,
        record,
        history: vec![genesis],
    }
}

impl TestSession {
    pub fn counterparty_id(&self) -> PartyId {
        self.engine.counterparty_id()
    }

    pub fn current(&self) -> &SessionState {
        self.history.last().unwrap()
    }

    /// Apply one action the cooperative way: pre-derive the next state
    /// hash, sign it as the owner, and let the engine execute.
    pub fn act(&mut self, kind: ActionKind) -> Result<()> {
        let current = self.current();
        let nonce = current.nonce + 1;
        let action = Action::new(kind, nonce);

        let mut balances = current.balances.clone();
        match &action.kind {
            ActionKind::Deduct { asset, amount } | ActionKind::Transfer { asset, amount, .. } => {
                if balances.get(asset) >= *amount {
                    balances.debit(asset, *amount)?;
                }
            }
            ActionKind::Deposit { asset, amount } => balances.credit(asset, *amount),
        }
        let mut log = current.action_log.clone();
        log.push(action.clone());
        let next_hash = SessionState::compute_state_hash(
            current.session_id,
            nonce,
            &balances,
            Some(&current.state_hash),
            &log,
        );
        let sig = self.owner.sign(&next_hash);

        let next = self
            .engine
            .execute_action(current, action, &self.owner.party_id(), sig)?;
        self.history.push(next);
        Ok(())
    }

    pub fn deduct(&mut self, amount: i64) -> Result<()> {
        self.act(ActionKind::Deduct {
            asset: "ETH".into(),
            amount: dec(amount),
        })
    }

    /// Settlement proof over the full history, signed by the owner.
    pub fn proof(&self) -> SettlementProof {
        let sig = self.owner.sign(&self.current().settlement_payload());
        self.engine
            .generate_settlement_proof(&self.history, sig)
            .unwrap()
    }

    /// Extended proof for the advanced pipeline: asset and transfer
    /// settlement entries derived from the record and the action log,
    /// all three roots computed honestly.
    pub fn extended_proof(&self) -> ExtendedSettlementProof {
        let base = self.proof();
        let final_state = &base.final_state;

        let asset_settlements: Vec<AssetSettlement> = self
            .record
            .locked_assets
            .iter()
            .map(|(asset, initial)| AssetSettlement {
                asset: asset.clone(),
                initial_amount: *initial,
                final_amount: final_state.balances.get(asset),
                status: SettlementEntryStatus::Completed,
            })
            .collect();
        let settlement_leaves: Vec<Vec<u8>> = asset_settlements
            .iter()
            .map(AssetSettlement::canonical_bytes)
            .collect();

        let transfer_settlements: Vec<TransferSettlement> = final_state
            .action_log
            .iter()
            .filter_map(|action| match &action.kind {
                ActionKind::Transfer {
                    asset,
                    amount,
                    recipient,
                } => Some(TransferSettlement {
                    recipient: *recipient,
                    asset: asset.clone(),
                    amount: *amount,
                    nonce: action.nonce,
                    status: SettlementEntryStatus::Completed,
                }),
                _ => None,
            })
            .collect();
        let transfer_leaves: Vec<Vec<u8>> = transfer_settlements
            .iter()
            .map(TransferSettlement::canonical_bytes)
            .collect();

        let total_volume = final_state
            .action_log
            .iter()
            .map(|a| a.kind.amount())
            .sum();

        ExtendedSettlementProof {
            base,
            settlement_root: merkle_root(&settlement_leaves),
            asset_settlements,
            transfer_root: merkle_root(&transfer_leaves),
            transfer_settlements,
            total_volume,
        }
    }
}
