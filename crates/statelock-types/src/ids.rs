//! Globally unique identifiers used throughout StateLock.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting,
//! except `PartyId` (the raw ed25519 public key) and `Address` (a
//! truncated hash of the public key).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Globally unique session identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PartyId
// ---------------------------------------------------------------------------

/// Identity of a protocol party (owner or counterparty).
/// This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PartyId(pub [u8; 32]);

impl PartyId {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A party address: the first 20 bytes of `SHA-256(public_key [|| identity])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// FraudProofId
// ---------------------------------------------------------------------------

/// Unique identifier for a submitted fraud proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FraudProofId(pub Uuid);

impl FraudProofId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for FraudProofId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FraudProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fp:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AggregationId
// ---------------------------------------------------------------------------

/// Unique identifier for a threshold-signature aggregation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AggregationId(pub Uuid);

impl AggregationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AggregationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AggregationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agg:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_uniqueness() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_ordering() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn session_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = SessionId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn party_id_short_form() {
        let party = PartyId([0xab; 32]);
        assert_eq!(party.short(), "abababab");
    }

    #[test]
    fn address_display_hex() {
        let addr = Address([0x01; 20]);
        assert_eq!(format!("{addr}"), format!("0x{}", "01".repeat(20)));
    }

    #[test]
    fn fraud_proof_id_uniqueness() {
        let a = FraudProofId::new();
        let b = FraudProofId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn serde_roundtrips() {
        let sid = SessionId::new();
        let json = serde_json::to_string(&sid).unwrap();
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, back);

        let aid = AggregationId::new();
        let json = serde_json::to_string(&aid).unwrap();
        let back: AggregationId = serde_json::from_str(&json).unwrap();
        assert_eq!(aid, back);
    }
}
