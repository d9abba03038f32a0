//! # Domain Errors
//!
//! Error taxonomy for the escrow, adapter and registry surface.
//!
//! Every on-chain precondition violation maps to exactly one variant here
//! and aborts the enclosing operation with no partial state change.

use super::value_objects::SwapStage;
use thiserror::Error;

/// Hash type (32-byte digest).
pub type Hash = [u8; 32];

/// Address type (20-byte account identifier).
pub type Address = [u8; 20];

/// Secret preimage type (32-byte).
pub type Secret = [u8; 32];

/// Registry swap identifier (32-byte).
pub type SwapId = [u8; 32];

/// Escrow error types.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Wrong party invoked a restricted operation.
    #[error("caller is not authorized for this operation")]
    InvalidCaller,

    /// Preimage does not hash to the commitment.
    #[error("secret does not match the hashlock commitment")]
    InvalidSecret,

    /// Operation attempted outside its allowed timelock window.
    #[error("outside timelock window: now={now}, allowed=[{not_before}, {not_after})")]
    InvalidTime {
        /// Clock value at the attempted call.
        now: u64,
        /// Inclusive start of the permitted window.
        not_before: u64,
        /// Exclusive end of the permitted window (`u64::MAX` when unbounded).
        not_after: u64,
    },

    /// Supplied descriptor does not match any escrow instance.
    #[error("immutables do not match any escrow instance")]
    InvalidImmutables,

    /// An escrow already occupies this identity.
    #[error("escrow already exists for identity {}", hex::encode(.0))]
    EscrowExists(Hash),

    /// Adapter has no mapping for the given hashlock.
    #[error("no swap mapped for hashlock {}", hex::encode(.0))]
    SwapNotFound(Hash),

    /// A hashlock may only ever map to one registry identifier.
    #[error("hashlock already mapped to a swap: {}", hex::encode(.0))]
    HashlockInUse(Hash),

    /// Invalid escrow state transition.
    #[error("invalid escrow transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },

    /// Asset balance too low for the requested transfer.
    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Amount the transfer required.
        needed: u128,
        /// Amount actually held.
        available: u128,
    },

    /// Spender allowance too low for the requested pull.
    #[error("insufficient allowance: needed {needed}, available {available}")]
    InsufficientAllowance {
        /// Amount the pull required.
        needed: u128,
        /// Allowance actually granted.
        available: u128,
    },

    /// Stage offsets violate the per-leg or cross-leg ordering rules.
    #[error("timelock ordering violated: {0}")]
    TimelockOrdering(String),

    /// Registry record is not in a stage that permits the call.
    #[error("unexpected swap stage: {0:?}")]
    UnexpectedStage(SwapStage),

    /// Registry call failed for a reason outside this taxonomy.
    #[error("registry call failed: {0}")]
    Registry(String),
}
