//! Threshold signatures — k-of-n multi-party authorization.
//!
//! A message becomes authorized once `threshold` distinct signers from the
//! registered signer set have each contributed a valid partial signature.
//! Duplicate submissions from the same signer are rejected, as are partials
//! from keys outside the set. The aggregate produced here is a deterministic
//! digest committing to the collected partials, not a cryptographic
//! aggregate scheme (see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregationId, PartyId};

/// One signer's contribution to a threshold signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSignature {
    /// The signer's ed25519 public key.
    pub signer: PartyId,
    /// The signer's index in the configured signer set.
    pub signer_index: usize,
    /// Ed25519 signature over the aggregation message.
    pub signature: Vec<u8>,
    /// When the partial was collected.
    pub signed_at: DateTime<Utc>,
}

/// A k-of-n threshold signature collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSignature {
    /// Unique aggregation request identifier.
    pub id: AggregationId,
    /// The message every partial must sign.
    pub message: Vec<u8>,
    /// Required number of distinct signers (k).
    pub threshold: usize,
    /// Size of the full signer set (n).
    pub total_signers: usize,
    /// The registered signer set; a partial at `signer_index` must come
    /// from `signers[signer_index]`.
    pub signers: Vec<PartyId>,
    /// Collected partials, in arrival order.
    pub partials: Vec<PartialSignature>,
    /// Deterministic digest over the collected partials, set once the
    /// threshold is reached.
    pub aggregate: Option<[u8; 32]>,
    /// When the aggregation was created.
    pub created_at: DateTime<Utc>,
}

impl ThresholdSignature {
    /// Start a new aggregation for a message against a fixed signer set.
    #[must_use]
    pub fn new(message: Vec<u8>, threshold: usize, signers: Vec<PartyId>) -> Self {
        Self {
            id: AggregationId::new(),
            message,
            threshold,
            total_signers: signers.len(),
            signers,
            partials: Vec::new(),
            aggregate: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this signer has already contributed.
    #[must_use]
    pub fn has_signer(&self, signer: &PartyId) -> bool {
        self.partials.iter().any(|p| p.signer == *signer)
    }

    /// The registered signer at `index`, if the index is in range.
    #[must_use]
    pub fn registered_signer(&self, index: usize) -> Option<&PartyId> {
        self.signers.get(index)
    }

    /// Number of distinct partials collected so far.
    #[must_use]
    pub fn collected(&self) -> usize {
        self.partials.len()
    }

    /// Whether the threshold has been reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.partials.len() >= self.threshold
    }
}
