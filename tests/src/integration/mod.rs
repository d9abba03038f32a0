//! Integration tests across the escrow core and the coordinator.

pub mod escrow_lifecycle;
pub mod swap_protocol;
