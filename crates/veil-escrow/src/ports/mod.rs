//! # Ports Module
//!
//! Outbound dependencies of the escrow core: the asset ledger it moves
//! funds on and the external swap registry it mirrors state into.

pub mod outbound;

pub use outbound::*;
