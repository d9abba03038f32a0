//! # Veilswap Test Suite
//!
//! Unified test crate covering:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── escrow_lifecycle.rs   # Escrow scenarios against factory/vault/adapter
//!     └── swap_protocol.rs      # Coordinator-driven end-to-end swaps
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p veil-tests
//! cargo test -p veil-tests integration::escrow_lifecycle::
//! cargo test -p veil-tests integration::swap_protocol::
//! ```

#![allow(dead_code)]

pub mod integration;
