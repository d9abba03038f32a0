//! # Algorithms Module
//!
//! Cryptographic helpers for secrets and commitments.

pub mod secret;

pub use secret::{commit, generate_secret, verify_preimage};
