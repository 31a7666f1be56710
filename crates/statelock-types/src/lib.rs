//! # statelock-types
//!
//! Shared types, errors, and configuration for the **StateLock** off-chain
//! state channel protocol.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`SessionId`], [`FraudProofId`], [`AggregationId`], [`PartyId`], [`Address`]
//! - **Balance model**: [`Balances`], [`Asset`]
//! - **Session model**: [`SessionRecord`], [`SessionStatus`]
//! - **State chain model**: [`SessionState`], [`StateSignatures`], [`StateHash`]
//! - **Action model**: [`Action`], [`ActionKind`], [`ActionKindTag`]
//! - **Proof model**: [`SettlementProof`], [`SettlementOutcome`], [`MerkleProof`]
//! - **Advanced proof model**: [`ExtendedSettlementProof`], [`AssetSettlement`], [`TransferSettlement`]
//! - **Fraud model**: [`FraudProof`], [`FraudCategory`], [`FraudEvidence`], [`FraudStatus`]
//! - **Threshold model**: [`ThresholdSignature`], [`PartialSignature`]
//! - **Configuration**: [`EnginePolicy`], [`VerifierConfig`]
//! - **Errors**: [`StatelockError`] with `SL_ERR_` prefix codes
//! - **Constants**: domain-separation prefixes and protocol defaults

pub mod action;
pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod extended;
pub mod fraud;
pub mod ids;
pub mod merkle;
pub mod proof;
pub mod session;
pub mod state;
pub mod threshold;

// Re-export all primary types at crate root for ergonomic imports:
//   use statelock_types::{SessionState, Action, SettlementProof, ...};

pub use action::*;
pub use balance::*;
pub use config::*;
pub use error::*;
pub use extended::*;
pub use fraud::*;
pub use ids::*;
pub use merkle::*;
pub use proof::*;
pub use session::*;
pub use state::*;
pub use threshold::*;

// Constants are accessed via `statelock_types::constants::FOO`
// (not re-exported to avoid name collisions).
