//! # Veil Escrow
//!
//! Trustless HTLC escrow core for cross-ledger atomic swaps.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Custody one leg of an atomic swap between an EVM-style ledger and a
//! privacy-preserving counter-ledger:
//! - SHA-256 hashlocks gating withdrawal
//! - Per-leg timelock stages bounding every operation
//! - Content-addressed escrow instantiation (one escrow per descriptor)
//! - Adapter bridging the hashlock-keyed escrow view into an external
//!   identifier-keyed swap registry
//!
//! ## Atomicity
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | Both legs complete or both refund | Secret disclosure + cancellation ordering |
//! | Counterparty reaction window | Revealing leg cancels strictly earlier |
//! | No half-executed operations | Validate-then-apply inside one transaction |
//! | Registry stays consistent | Write-once hashlock-to-identifier mapping |
//!
//! ## Module Structure
//!
//! ```text
//! veil-escrow/
//! ├── domain/          # Immutables, Timelocks, Escrow entity, errors
//! ├── algorithms/      # Secret generation and commitment checks
//! ├── ports/           # SwapRegistry and AssetLedger outbound ports
//! ├── adapters/        # Registry bridge + in-memory collaborators
//! ├── factory.rs       # Deterministic retrieve-or-create instantiation
//! └── vault.rs         # Transactional deposit/withdraw/cancel execution
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod events;
pub mod factory;
pub mod ports;
pub mod vault;

// Re-exports
pub use adapters::{CreateSwapParams, InMemoryLedger, InMemorySwapRegistry, SwapAdapter};
pub use algorithms::{commit, generate_secret, verify_preimage};
pub use domain::{
    Address, Asset, Escrow, EscrowError, EscrowState, Hash, Immutables, Leg, LegSchedule, Secret,
    SecretBytes, Stage, SwapId, SwapStage, TimelockOffsets, Timelocks,
};
pub use events::{AdapterEvent, EscrowEvent, EventLog};
pub use factory::EscrowFactory;
pub use ports::{AssetLedger, NewSwapParams, SwapRegistry};
pub use vault::EscrowVault;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
