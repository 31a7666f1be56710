//! # statelock-verifier
//!
//! The trust boundary of the protocol. Everything upstream — engine
//! output, settlement proofs, fraud evidence, partial signatures — is
//! treated as adversarial input and re-verified from first principles
//! before any capital moves.
//!
//! ## Modules
//!
//! - [`settle`] — basic settlement: full chain re-verification followed
//!   by an atomic commit, plus the emergency path for an unresponsive
//!   counterparty
//! - [`pipeline`] — the advanced weighted verification pipeline over
//!   extended settlement proofs, producing a confidence report
//! - [`fraud`] — bonded fraud-proof registry and adjudication
//! - [`threshold`] — k-of-n threshold signature aggregation
//!
//! ## Verification Philosophy
//!
//! Embedded commitments are never trusted: Merkle roots are rebuilt from
//! raw leaves, state hashes are recomputed from state fields, and every
//! signature is checked against the party identities the verifier was
//! given — not against keys carried inside the proof.

pub mod fraud;
pub mod pipeline;
pub mod settle;
pub mod threshold;

pub use fraud::FraudProofRegistry;
pub use pipeline::{AdvancedVerifier, CheckResult, VerificationReport};
pub use settle::SettlementVerifier;
pub use threshold::ThresholdAggregator;
