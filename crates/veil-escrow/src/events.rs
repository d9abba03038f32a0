//! # Escrow Events
//!
//! On a real deployment these are contract events; here an in-process log
//! collects them so the coordinator and tests can observe what the vault
//! and adapter did.

use crate::domain::{Address, Asset, Hash, Leg, Secret, SwapId};
use parking_lot::RwLock;

/// Events emitted by the vault's escrow operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscrowEvent {
    /// An escrow leg was funded.
    Deposit {
        /// Identity of the escrow instance.
        identity: Hash,
        /// Hashlock gating the withdrawal.
        hashlock: Hash,
        /// Leg the escrow custodies.
        leg: Leg,
        /// Depositor account.
        caller: Address,
        /// Asset held by the leg.
        asset: Asset,
        /// Principal amount.
        amount: u128,
        /// Safety deposit held alongside the principal.
        safety_deposit: u128,
    },
    /// Funds left the escrow through the hashlock.
    ///
    /// Carries the disclosed preimage: this event is how the counterparty
    /// on the other chain learns the secret for its own leg.
    EscrowWithdrawal {
        /// Identity of the escrow instance.
        identity: Hash,
        /// Hashlock the preimage satisfied.
        hashlock: Hash,
        /// Account that triggered the withdrawal.
        caller: Address,
        /// Preimage that satisfied the hashlock.
        secret: Secret,
    },
    /// Escrow was cancelled after its cancellation stage opened.
    EscrowCancelled {
        /// Identity of the escrow instance.
        identity: Hash,
        /// Hashlock of the cancelled escrow.
        hashlock: Hash,
        /// Account that triggered the cancellation.
        caller: Address,
    },
}

/// Events emitted by the registry bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdapterEvent {
    /// A registry record was created and mapped to a hashlock.
    SwapCreated {
        /// Hashlock keying the mapping.
        hashlock: Hash,
        /// Registry-side identifier.
        swap_id: SwapId,
    },
    /// The mapped record was marked ready for claiming.
    SwapReady {
        /// Hashlock keying the mapping.
        hashlock: Hash,
        /// Registry-side identifier.
        swap_id: SwapId,
    },
    /// The mapped record was claimed.
    SwapClaimed {
        /// Hashlock keying the mapping.
        hashlock: Hash,
        /// Registry-side identifier.
        swap_id: SwapId,
    },
    /// The mapped record was refunded.
    SwapRefunded {
        /// Hashlock keying the mapping.
        hashlock: Hash,
        /// Registry-side identifier.
        swap_id: SwapId,
    },
}

/// Append-only event sink shared by the vault and the adapter.
#[derive(Default)]
pub struct EventLog {
    escrow: RwLock<Vec<EscrowEvent>>,
    adapter: RwLock<Vec<AdapterEvent>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an escrow event.
    pub fn record(&self, event: EscrowEvent) {
        self.escrow.write().push(event);
    }

    /// Record an adapter event.
    pub fn record_adapter(&self, event: AdapterEvent) {
        self.adapter.write().push(event);
    }

    /// Snapshot of all escrow events in emission order.
    pub fn escrow_events(&self) -> Vec<EscrowEvent> {
        self.escrow.read().clone()
    }

    /// Snapshot of all adapter events in emission order.
    pub fn adapter_events(&self) -> Vec<AdapterEvent> {
        self.adapter.read().clone()
    }
}
