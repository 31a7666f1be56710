//! # statelock-engine
//!
//! The state chain engine — sole authority for producing new
//! [`SessionState`](statelock_types::SessionState) values.
//!
//! ## Architecture
//!
//! The engine owns the counterparty key material and the session policy:
//! 1. `create_initial_state` produces the dual-signable genesis state
//! 2. `execute_action` validates and applies one action, yielding the next
//!    immutable state (or rejecting without touching the prior state)
//! 3. `generate_settlement_proof` packages the chain for the verifier
//!
//! The [`transition`] module holds the pure re-derivation checks callers
//! run before trusting a state they did not produce themselves.
//!
//! ## Concurrency Model
//!
//! One session, one writer: each `execute_action` call takes one prior
//! state and yields one next state. The nonce check is the optimistic
//! lock — a stale submission is rejected with `InvalidNonce`, never merged.

pub mod engine;
pub mod transition;

pub use engine::StateChainEngine;
pub use transition::{verify_capital_constraint, verify_chain, verify_state_transition};
