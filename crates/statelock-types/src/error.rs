//! Error types for the StateLock protocol.
//!
//! All errors use the `SL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Engine errors (local, non-fatal — caller may retry with corrected input)
//! - 2xx: Verifier errors (fatal to the settlement attempt — capital stays locked)
//! - 3xx: Fraud-proof / threshold-signature errors
//! - 4xx: Cryptography errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AggregationId, FraudProofId, SessionId, SessionStatus};

/// Central error enum for all StateLock operations.
#[derive(Debug, Error)]
pub enum StatelockError {
    // =================================================================
    // Engine Errors (1xx)
    // =================================================================
    /// The action's nonce does not follow the current state's nonce.
    /// Acts as the optimistic lock: stale submissions are rejected, never merged.
    #[error("SL_ERR_100: Invalid nonce: expected {expected}, got {actual}")]
    InvalidNonce { expected: u64, actual: u64 },

    /// Not enough balance to apply a Deduct or Transfer action.
    #[error("SL_ERR_101: Insufficient balance for {asset}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: String,
        needed: Decimal,
        available: Decimal,
    },

    /// The action kind is not permitted by the session's policy.
    #[error("SL_ERR_102: Action not allowed by policy: {kind}")]
    ActionNotAllowed { kind: String },

    /// A provided signature failed to verify.
    #[error("SL_ERR_103: Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    /// The session is not in the ACTIVE state.
    #[error("SL_ERR_104: Session not active: status is {status}")]
    SessionNotActive { status: SessionStatus },

    /// A protocol constraint was violated (empty history, deposit cap, etc.).
    #[error("SL_ERR_105: Constraint violation: {reason}")]
    ConstraintViolation { reason: String },

    // =================================================================
    // Verifier Errors (2xx)
    // =================================================================
    /// The state chain's links or nonce sequence are inconsistent.
    #[error("SL_ERR_200: State chain broken at nonce {nonce}: {reason}")]
    StateChainBroken { nonce: u64, reason: String },

    /// A stored state hash does not match its recomputed value.
    #[error("SL_ERR_201: Hash mismatch at nonce {nonce}")]
    HashMismatch { nonce: u64 },

    /// A party's signature over a state hash failed verification.
    #[error("SL_ERR_202: Signature verification failed for {party} at nonce {nonce}")]
    SignatureVerificationFailed { party: String, nonce: u64 },

    /// Final balances exceed locked capital or went negative —
    /// the single non-negotiable safety property of the protocol.
    #[error(
        "SL_ERR_203: Capital conservation violated for {asset}: final {final_balance}, locked {locked}"
    )]
    CapitalConservationViolated {
        asset: String,
        final_balance: Decimal,
        locked: Decimal,
    },

    /// A state in the proof belongs to a different session.
    #[error("SL_ERR_204: Session id mismatch: expected {expected}, got {actual}")]
    SessionIdMismatch {
        expected: SessionId,
        actual: SessionId,
    },

    /// The declared action count does not match the final action log.
    #[error("SL_ERR_205: Action count mismatch: declared {declared}, actual {actual}")]
    ActionCountMismatch { declared: usize, actual: usize },

    // =================================================================
    // Fraud / Threshold Errors (3xx)
    // =================================================================
    /// The fraud-proof bond is below the configured minimum.
    #[error("SL_ERR_300: Fraud bond too low: {bond} < minimum {minimum}")]
    BondTooLow { bond: Decimal, minimum: Decimal },

    /// No fraud proof with this id exists.
    #[error("SL_ERR_301: Fraud proof not found: {0}")]
    FraudProofNotFound(FraudProofId),

    /// The fraud proof was submitted but its challenge deadline has passed.
    #[error("SL_ERR_302: Fraud proof expired: {0}")]
    FraudProofExpired(FraudProofId),

    /// The fraud proof has already been adjudicated.
    #[error("SL_ERR_303: Fraud proof {id} already resolved as {status}")]
    FraudProofAlreadyResolved { id: FraudProofId, status: String },

    /// No aggregation request with this id exists.
    #[error("SL_ERR_310: Aggregation not found: {0}")]
    AggregationNotFound(AggregationId),

    /// The same signer submitted a second partial signature.
    #[error("SL_ERR_311: Duplicate signer: {signer_hex}")]
    DuplicateSigner { signer_hex: String },

    /// Not enough distinct partial signatures have been collected.
    #[error("SL_ERR_312: Threshold not reached: {collected} of {required}")]
    ThresholdNotReached { collected: usize, required: usize },

    /// The counterparty did not respond within the configured timeout,
    /// or the emergency path was attempted before the timeout elapsed.
    #[error(
        "SL_ERR_320: Counterparty unresponsive check failed: {elapsed_secs}s elapsed, {timeout_secs}s required"
    )]
    CounterpartyUnresponsive {
        elapsed_secs: i64,
        timeout_secs: i64,
    },

    // =================================================================
    // Cryptography Errors (4xx)
    // =================================================================
    /// A public key could not be parsed.
    #[error("SL_ERR_400: Malformed public key: {reason}")]
    MalformedKey { reason: String },

    /// A signature had the wrong length or encoding.
    #[error("SL_ERR_401: Malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// A Merkle proof request referenced an index outside the leaf set.
    #[error("SL_ERR_402: Merkle index out of range: {index} >= {leaf_count}")]
    MerkleIndexOutOfRange { index: usize, leaf_count: usize },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SL_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, StatelockError>;

impl From<serde_json::Error> for StatelockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
