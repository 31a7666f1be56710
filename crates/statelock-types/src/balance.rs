//! Per-asset balance map with canonical (sorted) iteration order.
//!
//! Balances back both the locked-capital map on a [`SessionRecord`] and the
//! evolving balance map on each [`SessionState`]. A `BTreeMap` keeps asset
//! keys sorted, which makes the byte encoding used for state hashing
//! canonical without an explicit sort step.
//!
//! [`SessionRecord`]: crate::SessionRecord
//! [`SessionState`]: crate::SessionState

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, StatelockError};

/// An asset symbol (e.g., "ETH", "USDC").
pub type Asset = String;

/// A per-asset amount map. Keys iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances(BTreeMap<Asset, Decimal>);

impl Balances {
    /// Create an empty balance map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Amount held for an asset; zero if the asset is unknown.
    #[must_use]
    pub fn get(&self, asset: &str) -> Decimal {
        self.0.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Set the amount for an asset directly.
    pub fn set(&mut self, asset: impl Into<Asset>, amount: Decimal) {
        self.0.insert(asset.into(), amount);
    }

    /// Add `amount` to an asset's balance, creating the entry if needed.
    pub fn credit(&mut self, asset: &str, amount: Decimal) {
        *self.0.entry(asset.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    /// Subtract `amount` from an asset's balance.
    ///
    /// # Errors
    /// Returns [`StatelockError::InsufficientBalance`] if the balance would
    /// go negative. The map is untouched on failure.
    pub fn debit(&mut self, asset: &str, amount: Decimal) -> Result<()> {
        let available = self.get(asset);
        if available < amount {
            return Err(StatelockError::InsufficientBalance {
                asset: asset.to_string(),
                needed: amount,
                available,
            });
        }
        self.0.insert(asset.to_string(), available - amount);
        Ok(())
    }

    /// Whether any asset holds a negative amount.
    #[must_use]
    pub fn has_negative(&self) -> bool {
        self.0.values().any(|amount| *amount < Decimal::ZERO)
    }

    /// Sum of all amounts across assets.
    ///
    /// Only meaningful as an aggregate magnitude (solvency checks compare
    /// the same asset set on both sides).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    /// Iterate `(asset, amount)` pairs in sorted asset order.
    pub fn iter(&self) -> impl Iterator<Item = (&Asset, &Decimal)> {
        self.0.iter()
    }

    /// All asset symbols, sorted.
    #[must_use]
    pub fn assets(&self) -> Vec<Asset> {
        self.0.keys().cloned().collect()
    }

    /// Number of asset entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical byte encoding: `asset ':' amount ';'` per entry, in
    /// sorted asset order. Feeds the state hash preimage.
    ///
    /// Amounts are normalized before encoding so numerically equal values
    /// at different scales (`4` vs `4.00`) hash identically.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * 24);
        for (asset, amount) in &self.0 {
            out.extend_from_slice(asset.as_bytes());
            out.push(b':');
            out.extend_from_slice(amount.normalize().to_string().as_bytes());
            out.push(b';');
        }
        out
    }
}

impl FromIterator<(Asset, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (Asset, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
