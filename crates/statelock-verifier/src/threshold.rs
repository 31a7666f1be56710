//! k-of-n threshold signature aggregation.
//!
//! Each partial is a real ed25519 signature over the aggregation message,
//! verified on arrival and accepted only from a key registered in the
//! aggregation's signer set, at that key's registered index. Once
//! `threshold` distinct signers have
//! contributed, the aggregation completes with a deterministic digest
//! committing to the message and every collected partial. This is a
//! commitment, not a cryptographic aggregate scheme — each partial stands
//! (and was verified) on its own.

use statelock_crypto::sha256;
use statelock_types::{
    AggregationId, PartialSignature, PartyId, Result, StatelockError, ThresholdSignature,
    constants,
};

/// Collects partial signatures and completes aggregations.
#[derive(Default)]
pub struct ThresholdAggregator {
    aggregations: std::collections::HashMap<AggregationId, ThresholdSignature>,
}

impl ThresholdAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a k-of-n aggregation over a message, registering the signer
    /// set. Only partials from these keys, at these indices, are accepted.
    ///
    /// # Errors
    /// Returns [`StatelockError::ConstraintViolation`] for a zero
    /// threshold, a threshold larger than the signer set, or a signer set
    /// containing a repeated key.
    pub fn create_aggregation(
        &mut self,
        message: Vec<u8>,
        threshold: usize,
        signers: Vec<PartyId>,
    ) -> Result<AggregationId> {
        if threshold == 0 || threshold > signers.len() {
            return Err(StatelockError::ConstraintViolation {
                reason: format!("invalid threshold {threshold} of {}", signers.len()),
            });
        }
        for (i, signer) in signers.iter().enumerate() {
            if signers[..i].contains(signer) {
                return Err(StatelockError::ConstraintViolation {
                    reason: format!("signer {signer} registered more than once"),
                });
            }
        }
        let aggregation = ThresholdSignature::new(message, threshold, signers);
        let id = aggregation.id;
        tracing::debug!(
            aggregation = %id,
            threshold,
            total_signers = aggregation.total_signers,
            "aggregation created"
        );
        self.aggregations.insert(id, aggregation);
        Ok(id)
    }

    /// Add one signer's partial signature. Returns `true` once the
    /// aggregation has reached its threshold.
    ///
    /// # Errors
    /// - [`StatelockError::AggregationNotFound`] for an unknown id
    /// - [`StatelockError::ConstraintViolation`] if the partial's key is
    ///   not the registered signer at its claimed index
    /// - [`StatelockError::DuplicateSigner`] if this signer already contributed
    /// - [`StatelockError::InvalidSignature`] if the partial does not
    ///   verify over the aggregation message
    pub fn add_partial_signature(
        &mut self,
        id: AggregationId,
        partial: PartialSignature,
    ) -> Result<bool> {
        let aggregation = self
            .aggregations
            .get_mut(&id)
            .ok_or(StatelockError::AggregationNotFound(id))?;

        // The partial must come from the registered key at its claimed
        // index; any valid key outside the set is refused.
        if aggregation.registered_signer(partial.signer_index) != Some(&partial.signer) {
            return Err(StatelockError::ConstraintViolation {
                reason: format!(
                    "signer {} is not registered at index {}",
                    partial.signer, partial.signer_index
                ),
            });
        }
        if aggregation.has_signer(&partial.signer) {
            return Err(StatelockError::DuplicateSigner {
                signer_hex: hex::encode(partial.signer.as_bytes()),
            });
        }
        if !statelock_crypto::verify(&aggregation.message, &partial.signature, &partial.signer) {
            return Err(StatelockError::InvalidSignature {
                reason: format!("partial from signer {} does not verify", partial.signer),
            });
        }

        aggregation.partials.push(partial);
        let complete = aggregation.is_complete();
        if complete && aggregation.aggregate.is_none() {
            aggregation.aggregate = Some(aggregate_digest(aggregation));
            tracing::info!(
                aggregation = %id,
                collected = aggregation.collected(),
                "threshold reached"
            );
        }
        Ok(complete)
    }

    /// The completed aggregate digest.
    ///
    /// # Errors
    /// - [`StatelockError::AggregationNotFound`] for an unknown id
    /// - [`StatelockError::ThresholdNotReached`] before enough partials
    ///   have been collected
    pub fn aggregate(&self, id: AggregationId) -> Result<[u8; 32]> {
        let aggregation = self
            .aggregations
            .get(&id)
            .ok_or(StatelockError::AggregationNotFound(id))?;
        aggregation
            .aggregate
            .ok_or(StatelockError::ThresholdNotReached {
                collected: aggregation.collected(),
                required: aggregation.threshold,
            })
    }

    /// Look up an aggregation by id.
    #[must_use]
    pub fn get(&self, id: AggregationId) -> Option<&ThresholdSignature> {
        self.aggregations.get(&id)
    }

    /// Whether the given signer has contributed to an aggregation.
    #[must_use]
    pub fn has_signed(&self, id: AggregationId, signer: &PartyId) -> bool {
        self.aggregations
            .get(&id)
            .is_some_and(|a| a.has_signer(signer))
    }
}

/// Deterministic digest over the message and the collected partials,
/// ordered by signer index so arrival order does not matter.
fn aggregate_digest(aggregation: &ThresholdSignature) -> [u8; 32] {
    let mut partials: Vec<&PartialSignature> = aggregation.partials.iter().collect();
    partials.sort_by_key(|p| p.signer_index);

    let mut preimage = Vec::with_capacity(128);
    preimage.extend_from_slice(constants::AGGREGATE_PREFIX);
    preimage.extend_from_slice(&aggregation.message);
    for partial in partials {
        preimage.extend_from_slice(partial.signer.as_bytes());
        preimage.extend_from_slice(&partial.signature);
    }
    sha256(&preimage)
}
