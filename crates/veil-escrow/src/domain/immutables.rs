//! # Immutables
//!
//! Canonical, content-addressable descriptor of one swap leg.
//!
//! Any party can recompute an escrow's identity purely from this descriptor;
//! two descriptors differing in any field map to different escrow instances.

use super::errors::{Address, Hash};
use super::timelocks::Timelocks;
use super::value_objects::Asset;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Canonical descriptor of one swap leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immutables {
    /// Hash of the off-chain order this leg settles.
    pub order_hash: Hash,
    /// Commitment to the claim secret.
    pub hashlock: Hash,
    /// Party originating the order.
    pub maker: Address,
    /// Party filling the order.
    pub taker: Address,
    /// Asset held by this leg.
    pub asset: Asset,
    /// Principal amount.
    pub amount: u128,
    /// Native-currency collateral returned with the principal settlement.
    pub safety_deposit: u128,
    /// Stage schedule for both legs, anchored at deployment.
    pub timelocks: Timelocks,
}

impl Immutables {
    /// Canonical byte encoding. Field order and widths are fixed; this is
    /// the preimage of [`Immutables::identity`].
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(189);
        out.extend_from_slice(&self.order_hash);
        out.extend_from_slice(&self.hashlock);
        out.extend_from_slice(&self.maker);
        out.extend_from_slice(&self.taker);
        out.extend_from_slice(&self.asset.canonical_bytes());
        out.extend_from_slice(&self.amount.to_be_bytes());
        out.extend_from_slice(&self.safety_deposit.to_be_bytes());
        out.extend_from_slice(&self.timelocks.canonical_bytes());
        out
    }

    /// Content-addressed escrow identity: Keccak-256 of the canonical
    /// encoding. Pure function of the descriptor; no factory state needed.
    pub fn identity(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.canonical_bytes());
        hasher.finalize().into()
    }
}
