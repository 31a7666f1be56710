//! System-wide constants for the StateLock protocol.
//!
//! Domain-separation prefixes are versioned so that a future canonical
//! encoding change cannot collide with hashes produced by this version.

/// Domain prefix for session state hashing.
pub const STATE_HASH_PREFIX: &[u8] = b"statelock:state:v1:";

/// Domain prefix for canonical action encoding.
pub const ACTION_PREFIX: &[u8] = b"statelock:action:v1:";

/// Domain prefix for the owner's settlement signature payload.
pub const SETTLEMENT_PREFIX: &[u8] = b"statelock:settle:v1:";

/// Domain prefix for Merkle leaf hashing.
pub const MERKLE_LEAF_PREFIX: &[u8] = b"statelock:leaf:v1:";

/// Preimage of the fixed padding leaf used to fill Merkle trees to the
/// next power of two.
pub const MERKLE_PAD_LEAF: &[u8] = b"statelock:merkle:pad:v1";

/// Domain prefix for threshold signature aggregation digests.
pub const AGGREGATE_PREFIX: &[u8] = b"statelock:aggregate:v1:";

/// Placeholder written into the state hash preimage at nonce 0, where no
/// previous state hash exists.
pub const GENESIS_MARKER: &[u8] = b"genesis";

/// Length of an ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Length of an ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of a derived party address in bytes (truncated SHA-256).
pub const ADDRESS_LEN: usize = 20;

/// Default fraud-proof challenge window in seconds.
pub const DEFAULT_CHALLENGE_WINDOW_SECS: i64 = 3600;

/// Default timeout in seconds before the counterparty is considered
/// unresponsive and the emergency settlement path applies.
pub const DEFAULT_COUNTERPARTY_TIMEOUT_SECS: i64 = 300;

/// Default minimum fraud-proof bond, in whole units.
pub const DEFAULT_MIN_FRAUD_BOND_UNITS: i64 = 100;

/// Maximum number of actions a single session may accumulate.
pub const MAX_ACTIONS_PER_SESSION: usize = 10_000;
