//! # Swap Adapter
//!
//! Bridges hashlock-keyed escrow state into the identifier-keyed swap
//! registry. The adapter owns the only hashlock-to-identifier mapping;
//! entries are written once on `create_swap` and never mutated, so a
//! hashlock resolves to at most one registry record for its lifetime.
//!
//! Token custody: on `create_swap` the adapter pulls the principal from the
//! depositor account through a previously granted allowance and holds it
//! until `claim_swap` or `refund_swap` releases it. Native principal never
//! moves through the adapter.

use crate::domain::{Address, Asset, EscrowError, Hash, Secret, SwapId, SwapStage};
use crate::events::{AdapterEvent, EventLog};
use crate::ports::{AssetLedger, NewSwapParams, SwapRegistry};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Parameters for [`SwapAdapter::create_swap`].
#[derive(Clone, Debug)]
pub struct CreateSwapParams {
    /// Commitment the claim preimage must hash to; keys the mapping.
    pub hashlock: Hash,
    /// Commitment the refund preimage must hash to.
    pub refund_commitment: Hash,
    /// Depositor account the adapter pulls token principal from.
    pub depositor: Address,
    /// Account entitled to claim on the registry side.
    pub claimer: Address,
    /// Registry timeout after which claiming no longer needs readiness.
    pub timeout_1: u64,
    /// Registry timeout after which the record may always be refunded.
    pub timeout_2: u64,
    /// Asset carrying the principal.
    pub asset: Asset,
    /// Principal value.
    pub value: u128,
    /// Disambiguator forwarded to the registry record.
    pub nonce: u64,
}

struct MappedSwap {
    id: SwapId,
    asset: Asset,
    // Token principal still held by the adapter; zeroed once released so a
    // later registry-side completion cannot pay twice.
    custody: u128,
}

/// Registry bridge holding the write-once hashlock mapping.
pub struct SwapAdapter {
    registry: Arc<dyn SwapRegistry>,
    ledger: Arc<dyn AssetLedger>,
    address: Address,
    events: Arc<EventLog>,
    mappings: RwLock<HashMap<Hash, MappedSwap>>,
}

impl SwapAdapter {
    /// Create an adapter at `address` bridging `registry` over `ledger`.
    pub fn new(
        registry: Arc<dyn SwapRegistry>,
        ledger: Arc<dyn AssetLedger>,
        address: Address,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            registry,
            ledger,
            address,
            events,
            mappings: RwLock::new(HashMap::new()),
        }
    }

    /// Account the adapter holds token custody under.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether a hashlock is already mapped to a registry record.
    pub fn is_mapped(&self, hashlock: &Hash) -> bool {
        self.mappings.read().contains_key(hashlock)
    }

    /// Registry identifier mapped to a hashlock, if any.
    pub fn swap_id_for(&self, hashlock: &Hash) -> Option<SwapId> {
        self.mappings.read().get(hashlock).map(|m| m.id)
    }

    /// Create a registry record and map it to the hashlock.
    ///
    /// Validates the mapping slot and (for tokens) the depositor's balance
    /// and allowance before touching the registry or moving funds, so a
    /// failed call leaves no partial effects.
    pub fn create_swap(&self, params: CreateSwapParams, now: u64) -> Result<SwapId, EscrowError> {
        let mut mappings = self.mappings.write();
        if mappings.contains_key(&params.hashlock) {
            return Err(EscrowError::HashlockInUse(params.hashlock));
        }
        if let Asset::Token(_) = params.asset {
            let allowance = self
                .ledger
                .allowance(&params.depositor, &self.address, &params.asset);
            if allowance < params.value {
                return Err(EscrowError::InsufficientAllowance {
                    needed: params.value,
                    available: allowance,
                });
            }
            let balance = self.ledger.balance(&params.depositor, &params.asset);
            if balance < params.value {
                return Err(EscrowError::InsufficientBalance {
                    needed: params.value,
                    available: balance,
                });
            }
        }

        let id = self.registry.new_swap(
            NewSwapParams {
                owner: self.address,
                claimer: params.claimer,
                claim_commitment: params.hashlock,
                refund_commitment: params.refund_commitment,
                timeout_1: params.timeout_1,
                timeout_2: params.timeout_2,
                asset: params.asset,
                value: params.value,
                nonce: params.nonce,
            },
            now,
        )?;

        // Pre-validated above; with the mapping lock held this cannot fail.
        if let Asset::Token(_) = params.asset {
            self.ledger.transfer_from(
                &self.address,
                &params.depositor,
                &self.address,
                &params.asset,
                params.value,
            )?;
        }

        let custody = match params.asset {
            Asset::Token(_) => params.value,
            Asset::Native => 0,
        };
        mappings.insert(
            params.hashlock,
            MappedSwap {
                id,
                asset: params.asset,
                custody,
            },
        );
        info!(
            hashlock = %hex::encode(params.hashlock),
            swap = %hex::encode(id),
            "swap record created"
        );
        self.events.record_adapter(AdapterEvent::SwapCreated {
            hashlock: params.hashlock,
            swap_id: id,
        });
        Ok(id)
    }

    /// Signal the registry that the mapped record may be claimed early.
    pub fn set_swap_ready(&self, hashlock: &Hash, now: u64) -> Result<(), EscrowError> {
        let mappings = self.mappings.read();
        let mapped = mappings
            .get(hashlock)
            .ok_or(EscrowError::SwapNotFound(*hashlock))?;
        self.registry.set_ready(&mapped.id, &self.address, now)?;
        self.events.record_adapter(AdapterEvent::SwapReady {
            hashlock: *hashlock,
            swap_id: mapped.id,
        });
        Ok(())
    }

    /// Claim the mapped record and release any remaining custody to `to`.
    pub fn claim_swap(
        &self,
        hashlock: &Hash,
        to: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError> {
        let mut mappings = self.mappings.write();
        let mapped = mappings
            .get_mut(hashlock)
            .ok_or(EscrowError::SwapNotFound(*hashlock))?;
        self.registry.claim(&mapped.id, &self.address, secret, now)?;
        if mapped.custody > 0 {
            self.ledger
                .transfer(&self.address, to, &mapped.asset, mapped.custody)?;
            mapped.custody = 0;
        }
        info!(hashlock = %hex::encode(hashlock), "swap claimed");
        self.events.record_adapter(AdapterEvent::SwapClaimed {
            hashlock: *hashlock,
            swap_id: mapped.id,
        });
        Ok(())
    }

    /// Refund the mapped record and return any remaining custody to `to`.
    pub fn refund_swap(
        &self,
        hashlock: &Hash,
        to: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError> {
        let mut mappings = self.mappings.write();
        let mapped = mappings
            .get_mut(hashlock)
            .ok_or(EscrowError::SwapNotFound(*hashlock))?;
        self.registry.refund(&mapped.id, &self.address, secret, now)?;
        if mapped.custody > 0 {
            self.ledger
                .transfer(&self.address, to, &mapped.asset, mapped.custody)?;
            mapped.custody = 0;
        }
        info!(hashlock = %hex::encode(hashlock), "swap refunded");
        self.events.record_adapter(AdapterEvent::SwapRefunded {
            hashlock: *hashlock,
            swap_id: mapped.id,
        });
        Ok(())
    }

    /// Release remaining custody to `to` without touching the registry.
    ///
    /// The vault uses this on cancellation, where funds must go back to the
    /// depositor even though the refund preimage is not on hand. The record
    /// stays in the registry; any later completion pays nothing.
    pub fn release_custody(&self, hashlock: &Hash, to: &Address) -> Result<(), EscrowError> {
        let mut mappings = self.mappings.write();
        let mapped = mappings
            .get_mut(hashlock)
            .ok_or(EscrowError::SwapNotFound(*hashlock))?;
        if mapped.custody > 0 {
            self.ledger
                .transfer(&self.address, to, &mapped.asset, mapped.custody)?;
            mapped.custody = 0;
        }
        Ok(())
    }

    /// Registry stage for a hashlock; `Invalid` when unmapped.
    pub fn get_swap_status(&self, hashlock: &Hash) -> SwapStage {
        match self.mappings.read().get(hashlock) {
            Some(mapped) => self.registry.swap_stage(&mapped.id),
            None => SwapStage::Invalid,
        }
    }
}
