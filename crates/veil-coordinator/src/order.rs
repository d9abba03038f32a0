//! Order state machine.
//!
//! One order tracks one atomic swap from the maker's side: home-ledger
//! escrow on the source leg, counter-ledger payment on the destination leg.
//! The record carries both preimages; the store holding it is the maker's
//! private state, never shared with the taker.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use veil_escrow::{Address, Asset, Hash, Immutables, SecretBytes, TimelockOffsets, Timelocks};

/// Terms fixed at order creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderTerms {
    /// Maker's home-ledger account.
    pub maker: Address,
    /// Asset escrowed on the source leg.
    pub src_asset: Asset,
    /// Source-leg principal.
    pub src_amount: u128,
    /// Safety deposit held with the source-leg principal.
    pub safety_deposit: u128,
    /// Amount the taker owes on the counter ledger.
    pub dst_amount: u128,
    /// Maker's counter-ledger receive address.
    pub counter_address: String,
    /// Timelock stage offsets for both legs.
    pub offsets: TimelockOffsets,
}

/// Reference to a submitted counter-ledger payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRef {
    /// Counter-ledger transaction identifier.
    pub tx_id: String,
}

/// Confirmation proof for a counter-ledger payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Counter-ledger transaction identifier.
    pub tx_id: String,
    /// Confirmations observed when the proof was fetched.
    pub confirmations: u64,
}

/// Protocol progress of one order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrderState {
    /// Order published; waiting for a taker.
    Created,
    /// A taker committed to the terms.
    Filled {
        /// Taker's home-ledger account.
        taker: Address,
    },
    /// Source-leg escrow instantiated and funded by the maker.
    EscrowCreated {
        /// Taker's home-ledger account.
        taker: Address,
        /// Escrow identity on the home ledger.
        identity: Hash,
        /// Timelock anchor recorded at funding.
        deployed_at: u64,
    },
    /// Counter-ledger payment submitted.
    CounterLegFunded {
        /// Taker's home-ledger account.
        taker: Address,
        /// Escrow identity on the home ledger.
        identity: Hash,
        /// Timelock anchor recorded at funding.
        deployed_at: u64,
        /// Submitted counter-ledger payment.
        payment: PaymentRef,
    },
    /// Counter-ledger payment confirmed; the secret is now disclosed.
    SecretRevealed {
        /// Taker's home-ledger account.
        taker: Address,
        /// Escrow identity on the home ledger.
        identity: Hash,
        /// Timelock anchor recorded at funding.
        deployed_at: u64,
        /// Confirmation proof for the counter-leg payment.
        proof: PaymentProof,
    },
    /// Both legs settled.
    Completed {
        /// Escrow identity on the home ledger.
        identity: Hash,
    },
    /// Order unwound after a timeout.
    Refunded {
        /// Why the order was refunded.
        reason: String,
    },
}

impl OrderState {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Filled { .. } => "Filled",
            Self::EscrowCreated { .. } => "EscrowCreated",
            Self::CounterLegFunded { .. } => "CounterLegFunded",
            Self::SecretRevealed { .. } => "SecretRevealed",
            Self::Completed { .. } => "Completed",
            Self::Refunded { .. } => "Refunded",
        }
    }

    /// Whether no further step can change this order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Refunded { .. })
    }
}

/// Durable record of one swap order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: Uuid,
    /// Wall-clock-independent creation instant (home-ledger time).
    pub created_at: u64,
    /// Terms fixed at creation.
    pub terms: OrderTerms,
    /// SHA-256 commitment to the claim secret.
    pub hashlock: Hash,
    /// SHA-256 commitment to the refund secret.
    pub refund_commitment: Hash,
    secret: SecretBytes,
    refund_secret: SecretBytes,
    /// Current protocol state.
    pub state: OrderState,
}

impl Order {
    /// Assemble a new order around freshly generated secrets.
    pub fn new(
        terms: OrderTerms,
        secret: SecretBytes,
        refund_secret: SecretBytes,
        created_at: u64,
    ) -> Self {
        let hashlock = Sha256::digest(secret.as_bytes()).into();
        let refund_commitment = Sha256::digest(refund_secret.as_bytes()).into();
        Self {
            id: Uuid::new_v4(),
            created_at,
            terms,
            hashlock,
            refund_commitment,
            secret,
            refund_secret,
            state: OrderState::Created,
        }
    }

    /// Claim preimage. Maker-private until the counter leg confirms.
    pub fn secret(&self) -> &SecretBytes {
        &self.secret
    }

    /// Refund preimage for the registry record.
    pub fn refund_secret(&self) -> &SecretBytes {
        &self.refund_secret
    }

    /// Source-leg escrow descriptor for a given taker and anchor.
    pub fn immutables(
        &self,
        taker: Address,
        deployed_at: u64,
    ) -> Result<Immutables, veil_escrow::EscrowError> {
        Ok(Immutables {
            order_hash: self.order_hash(),
            hashlock: self.hashlock,
            maker: self.terms.maker,
            taker,
            asset: self.terms.src_asset,
            amount: self.terms.src_amount,
            safety_deposit: self.terms.safety_deposit,
            timelocks: Timelocks::new(deployed_at, self.terms.offsets)?,
        })
    }

    /// Hash binding escrow instances to this order.
    pub fn order_hash(&self) -> Hash {
        Sha256::digest(self.id.as_bytes()).into()
    }

    /// Instant the source leg becomes cancellable, if an escrow exists.
    pub fn cancellation_start(&self) -> Option<u64> {
        let deployed_at = match &self.state {
            OrderState::EscrowCreated { deployed_at, .. }
            | OrderState::CounterLegFunded { deployed_at, .. }
            | OrderState::SecretRevealed { deployed_at, .. } => *deployed_at,
            _ => return None,
        };
        Some(deployed_at + u64::from(self.terms.offsets.src.cancellation))
    }
}
