//! Extended settlement proof for the advanced verification pipeline.
//!
//! On top of the base [`SettlementProof`], the extended bundle carries
//! three raw leaf sets and the Merkle roots the submitter computed over
//! them. The advanced verifier rebuilds every root independently from the
//! raw leaves — an embedded root is never trusted on its own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Asset, SettlementProof, StateHash};

/// Terminal-or-not status of one settlement entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementEntryStatus {
    /// The entry settled and its value moved. Terminal.
    Completed,
    /// The entry was unwound and value returned. Terminal.
    Refunded,
    /// Still in flight — must not appear in a final proof.
    Open,
}

impl SettlementEntryStatus {
    /// Whether this status is acceptable in a final settlement.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }
}

/// Per-asset settlement summary: what was locked, what came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSettlement {
    /// The asset symbol.
    pub asset: Asset,
    /// Amount locked at session start.
    pub initial_amount: Decimal,
    /// Amount remaining at settlement.
    pub final_amount: Decimal,
    /// Entry status — must be terminal.
    pub status: SettlementEntryStatus,
}

impl AssetSettlement {
    /// Canonical leaf encoding for the settlement Merkle tree.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(self.asset.as_bytes());
        out.push(b':');
        out.extend_from_slice(self.initial_amount.normalize().to_string().as_bytes());
        out.push(b':');
        out.extend_from_slice(self.final_amount.normalize().to_string().as_bytes());
        out.push(match self.status {
            SettlementEntryStatus::Completed => 0x01,
            SettlementEntryStatus::Refunded => 0x02,
            SettlementEntryStatus::Open => 0x00,
        });
        out
    }
}

/// Per-recipient transfer settlement: value that left the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSettlement {
    /// Where the value went.
    pub recipient: Address,
    /// The asset transferred.
    pub asset: Asset,
    /// Amount transferred.
    pub amount: Decimal,
    /// The nonce of the transfer action this settles.
    pub nonce: u64,
    /// Entry status — must be terminal.
    pub status: SettlementEntryStatus,
}

impl TransferSettlement {
    /// Canonical leaf encoding for the transfer Merkle tree.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(self.asset.as_bytes());
        out.push(b':');
        out.extend_from_slice(self.amount.normalize().to_string().as_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.push(match self.status {
            SettlementEntryStatus::Completed => 0x01,
            SettlementEntryStatus::Refunded => 0x02,
            SettlementEntryStatus::Open => 0x00,
        });
        out
    }
}

/// The full bundle consumed by the advanced verification pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedSettlementProof {
    /// The base settlement proof (chain, final state, action root).
    pub base: SettlementProof,
    /// Per-asset settlement entries (raw leaves).
    pub asset_settlements: Vec<AssetSettlement>,
    /// Root the submitter computed over `asset_settlements`.
    pub settlement_root: StateHash,
    /// Per-transfer settlement entries (raw leaves).
    pub transfer_settlements: Vec<TransferSettlement>,
    /// Root the submitter computed over `transfer_settlements`.
    pub transfer_root: StateHash,
    /// Declared aggregate volume: sum of all action amounts.
    pub total_volume: Decimal,
}

impl ExtendedSettlementProof {
    /// Raw leaves for the settlement tree, in entry order.
    #[must_use]
    pub fn settlement_leaves(&self) -> Vec<Vec<u8>> {
        self.asset_settlements
            .iter()
            .map(AssetSettlement::canonical_bytes)
            .collect()
    }

    /// Raw leaves for the action tree, in log order.
    #[must_use]
    pub fn action_leaves(&self) -> Vec<Vec<u8>> {
        self.base
            .final_state
            .action_log
            .iter()
            .map(crate::Action::canonical_bytes)
            .collect()
    }

    /// Raw leaves for the transfer tree, in entry order.
    #[must_use]
    pub fn transfer_leaves(&self) -> Vec<Vec<u8>> {
        self.transfer_settlements
            .iter()
            .map(TransferSettlement::canonical_bytes)
            .collect()
    }
}
