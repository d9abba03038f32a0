//! # Domain Value Objects
//!
//! Immutable value types shared across the escrow surface.

use super::errors::Address;
use serde::{Deserialize, Serialize};

/// The two legs of one atomic swap.
///
/// The maker deposits on the source leg, the taker on the destination leg.
/// Each leg carries its own timelock schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    /// Leg funded by the maker.
    Source,
    /// Leg funded by the taker (the leg whose secret is revealed first).
    Destination,
}

/// Escrow lifecycle state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    /// Instantiated by the factory, not yet funded.
    #[default]
    Uninitialized,
    /// Principal and safety deposit held, awaiting claim or expiry.
    Funded,
    /// Secret presented, principal released to the counterparty.
    Withdrawn,
    /// Cancellation deadline passed, funds returned to the depositor.
    Cancelled,
}

impl EscrowState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: EscrowState) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Funded)
                | (Self::Funded, Self::Withdrawn)
                | (Self::Funded, Self::Cancelled)
        )
    }

    /// Check if terminal state. Terminal states are one-shot: every further
    /// call on the instance fails.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Withdrawn | Self::Cancelled)
    }
}

/// Registry swap record stage, observed read-only through the adapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStage {
    /// No record exists for the identifier.
    #[default]
    Invalid,
    /// Record created, funds committed.
    Pending,
    /// Owner signalled readiness; the claimer may claim immediately.
    Ready,
    /// Claimed or refunded. Terminal either way.
    Completed,
}

/// Asset held by an escrow leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The ledger's native currency.
    Native,
    /// A token contract identified by its address.
    Token(Address),
}

impl Asset {
    /// Canonical byte encoding used for identity hashing.
    pub fn canonical_bytes(&self) -> [u8; 21] {
        let mut out = [0u8; 21];
        match self {
            Asset::Native => {}
            Asset::Token(addr) => {
                out[0] = 1;
                out[1..].copy_from_slice(addr);
            }
        }
        out
    }
}
