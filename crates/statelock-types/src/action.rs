//! Session actions — the closed set of state-mutating operations.
//!
//! Every action is a tagged variant, exhaustively matched in the engine's
//! validation and application logic, so adding a new kind is a
//! compile-time-checked extension point. An action is deterministic: the
//! same prior state and action always produce the same posterior state.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Asset, constants};

/// The kind-specific payload of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Consume capital from the session (e.g., pay for an execution).
    Deduct { asset: Asset, amount: Decimal },
    /// Return capital into the session (e.g., proceeds flowing back).
    Deposit { asset: Asset, amount: Decimal },
    /// Send capital out of the session to a recipient address.
    Transfer {
        asset: Asset,
        amount: Decimal,
        recipient: Address,
    },
}

/// Discriminant-only view of [`ActionKind`], used in policy allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKindTag {
    Deduct,
    Deposit,
    Transfer,
}

impl ActionKind {
    /// The discriminant tag for policy checks.
    #[must_use]
    pub fn tag(&self) -> ActionKindTag {
        match self {
            Self::Deduct { .. } => ActionKindTag::Deduct,
            Self::Deposit { .. } => ActionKindTag::Deposit,
            Self::Transfer { .. } => ActionKindTag::Transfer,
        }
    }

    /// The asset this action touches.
    #[must_use]
    pub fn asset(&self) -> &str {
        match self {
            Self::Deduct { asset, .. }
            | Self::Deposit { asset, .. }
            | Self::Transfer { asset, .. } => asset,
        }
    }

    /// The amount this action moves.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Deduct { amount, .. }
            | Self::Deposit { amount, .. }
            | Self::Transfer { amount, .. } => *amount,
        }
    }
}

impl fmt::Display for ActionKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deduct => write!(f, "DEDUCT"),
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// One applied action: the kind, the nonce of the state it produced, and
/// when it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Kind-specific payload.
    pub kind: ActionKind,
    /// The nonce of the state this action produced (prior nonce + 1).
    pub nonce: u64,
    /// When the action was applied.
    pub applied_at: DateTime<Utc>,
}

impl Action {
    /// Create an action targeting the given nonce, timestamped now.
    #[must_use]
    pub fn new(kind: ActionKind, nonce: u64) -> Self {
        Self {
            kind,
            nonce,
            applied_at: Utc::now(),
        }
    }

    /// Canonical byte encoding for hashing.
    ///
    /// Format: `prefix || nonce_le || millis_le || tag || asset ':' amount
    /// [|| recipient]`. Independently implemented verifiers must agree on
    /// this byte order.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(constants::ACTION_PREFIX);
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.extend_from_slice(&self.applied_at.timestamp_millis().to_le_bytes());
        match &self.kind {
            ActionKind::Deduct { asset, amount } => {
                out.push(0x01);
                out.extend_from_slice(asset.as_bytes());
                out.push(b':');
                out.extend_from_slice(amount.normalize().to_string().as_bytes());
            }
            ActionKind::Deposit { asset, amount } => {
                out.push(0x02);
                out.extend_from_slice(asset.as_bytes());
                out.push(b':');
                out.extend_from_slice(amount.normalize().to_string().as_bytes());
            }
            ActionKind::Transfer {
                asset,
                amount,
                recipient,
            } => {
                out.push(0x03);
                out.extend_from_slice(asset.as_bytes());
                out.push(b':');
                out.extend_from_slice(amount.normalize().to_string().as_bytes());
                out.extend_from_slice(recipient.as_bytes());
            }
        }
        out
    }
}

/// Canonical encoding of an ordered action log. Feeds the state hash
/// preimage and the action Merkle leaves.
#[must_use]
pub fn canonical_action_log(actions: &[Action]) -> Vec<u8> {
    let mut out = Vec::with_capacity(actions.len() * 64 + 8);
    out.extend_from_slice(&(actions.len() as u64).to_le_bytes());
    for action in actions {
        out.extend_from_slice(&action.canonical_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn deduct(nonce: u64, amount: i64) -> Action {
        Action::new(
            ActionKind::Deduct {
                asset: "ETH".into(),
                amount: dec(amount),
            },
            nonce,
        )
    }

    #[test]
    fn tag_matches_variant() {
        assert_eq!(deduct(1, 1).kind.tag(), ActionKindTag::Deduct);
        let deposit = ActionKind::Deposit {
            asset: "ETH".into(),
            amount: dec(1),
        };
        assert_eq!(deposit.tag(), ActionKindTag::Deposit);
    }

    #[test]
    fn canonical_bytes_deterministic() {
        let action = deduct(1, 3);
        assert_eq!(action.canonical_bytes(), action.canonical_bytes());
    }

    #[test]
    fn canonical_bytes_differ_by_nonce() {
        let mut a = deduct(1, 3);
        let mut b = a.clone();
        a.nonce = 1;
        b.nonce = 2;
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn canonical_bytes_differ_by_kind() {
        let a = Action::new(
            ActionKind::Deduct {
                asset: "ETH".into(),
                amount: dec(3),
            },
            1,
        );
        let mut b = a.clone();
        b.kind = ActionKind::Deposit {
            asset: "ETH".into(),
            amount: dec(3),
        };
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn canonical_bytes_scale_invariant() {
        let a = deduct(1, 4);
        let mut b = a.clone();
        b.kind = ActionKind::Deduct {
            asset: "ETH".into(),
            // 4.00 is the same value at a different scale.
            amount: Decimal::new(400, 2),
        };
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn transfer_encodes_recipient() {
        let a = Action::new(
            ActionKind::Transfer {
                asset: "ETH".into(),
                amount: dec(1),
                recipient: Address([1u8; 20]),
            },
            1,
        );
        let mut b = a.clone();
        b.kind = ActionKind::Transfer {
            asset: "ETH".into(),
            amount: dec(1),
            recipient: Address([2u8; 20]),
        };
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn log_encoding_includes_length() {
        let empty = canonical_action_log(&[]);
        assert_eq!(empty, 0u64.to_le_bytes());

        let one = canonical_action_log(&[deduct(1, 1)]);
        assert!(one.len() > 8);
        assert_eq!(&one[..8], 1u64.to_le_bytes().as_slice());
    }

    #[test]
    fn accessors() {
        let action = deduct(1, 5);
        assert_eq!(action.kind.asset(), "ETH");
        assert_eq!(action.kind.amount(), dec(5));
    }

    #[test]
    fn serde_roundtrip() {
        let action = deduct(3, 7);
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }
}
