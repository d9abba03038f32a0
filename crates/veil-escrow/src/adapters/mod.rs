//! # Adapters Layer (Hexagonal Architecture)
//!
//! The registry bridge plus in-memory implementations of the outbound
//! ports used for tests and local simulation.

mod ledger;
mod registry;
mod swap_adapter;

pub use ledger::InMemoryLedger;
pub use registry::InMemorySwapRegistry;
pub use swap_adapter::{CreateSwapParams, SwapAdapter};
