//! # Domain Module
//!
//! Core domain types for the escrow leg of an atomic swap.

pub mod errors;
pub mod escrow;
pub mod immutables;
pub mod secure_secret;
pub mod timelocks;
pub mod value_objects;

pub use errors::*;
pub use escrow::Escrow;
pub use immutables::Immutables;
pub use secure_secret::SecretBytes;
pub use timelocks::{LegSchedule, Stage, TimelockOffsets, Timelocks};
pub use value_objects::*;
