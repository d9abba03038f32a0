//! Home-ledger access for the coordinator.
//!
//! `EscrowChain` is the driver's view of the ledger hosting the escrow
//! contracts. `LocalEscrowChain` backs it with the in-process vault plus a
//! controllable clock, standing in for an RPC connection in tests and
//! local runs.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use veil_escrow::{
    Address, EscrowState, EscrowVault, Hash, Immutables, Leg, Secret, SwapStage,
};

/// On-chain locator of a funded escrow, recovered by its hashlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscrowRecord {
    /// Identity of the escrow instance.
    pub identity: Hash,
    /// Timelock anchor recorded at instantiation.
    pub deployed_at: u64,
}

/// Outbound port to the escrow-hosting ledger.
#[async_trait]
pub trait EscrowChain: Send + Sync {
    /// Current ledger time.
    async fn now(&self) -> Result<u64>;

    /// Instantiate an escrow for a descriptor; returns its identity.
    async fn create_escrow(&self, immutables: &Immutables, leg: Leg) -> Result<Hash>;

    /// Fund an escrow leg as `caller`.
    async fn deposit(
        &self,
        caller: &Address,
        claim_commitment: &Hash,
        refund_commitment: &Hash,
        immutables: &Immutables,
    ) -> Result<()>;

    /// Withdraw through the hashlock as `caller`.
    async fn withdraw(&self, caller: &Address, secret: &Secret, immutables: &Immutables)
        -> Result<()>;

    /// Cancel a funded escrow as `caller`.
    async fn cancel(&self, caller: &Address, immutables: &Immutables) -> Result<()>;

    /// Signal the registry record may be claimed early.
    async fn set_swap_ready(&self, hashlock: &Hash) -> Result<()>;

    /// Registry stage for a hashlock.
    async fn swap_stage(&self, hashlock: &Hash) -> Result<SwapStage>;

    /// Locate the funded escrow for a hashlock, if one landed on chain.
    async fn find_escrow(&self, hashlock: &Hash) -> Result<Option<EscrowRecord>>;

    /// Lifecycle state of an escrow, `None` if never instantiated.
    async fn escrow_state(&self, identity: &Hash) -> Result<Option<EscrowState>>;
}

/// In-process chain over the vault, with a manually driven clock.
pub struct LocalEscrowChain {
    vault: Arc<EscrowVault>,
    time: RwLock<u64>,
}

impl LocalEscrowChain {
    /// Wrap a vault, starting the clock at `now`.
    pub fn new(vault: Arc<EscrowVault>, now: u64) -> Self {
        Self {
            vault,
            time: RwLock::new(now),
        }
    }

    /// Vault the chain executes against.
    pub fn vault(&self) -> &Arc<EscrowVault> {
        &self.vault
    }

    /// Set the clock to an absolute instant.
    pub fn set_time(&self, now: u64) {
        *self.time.write() = now;
    }

    /// Advance the clock by `delta` seconds.
    pub fn advance_time(&self, delta: u64) {
        *self.time.write() += delta;
    }
}

#[async_trait]
impl EscrowChain for LocalEscrowChain {
    async fn now(&self) -> Result<u64> {
        Ok(*self.time.read())
    }

    async fn create_escrow(&self, immutables: &Immutables, leg: Leg) -> Result<Hash> {
        let identity = self.vault.factory().create_escrow(immutables.clone(), leg)?;
        Ok(identity)
    }

    async fn deposit(
        &self,
        caller: &Address,
        claim_commitment: &Hash,
        refund_commitment: &Hash,
        immutables: &Immutables,
    ) -> Result<()> {
        let now = *self.time.read();
        self.vault
            .deposit(caller, claim_commitment, refund_commitment, immutables, now)?;
        Ok(())
    }

    async fn withdraw(
        &self,
        caller: &Address,
        secret: &Secret,
        immutables: &Immutables,
    ) -> Result<()> {
        let now = *self.time.read();
        self.vault.withdraw(caller, secret, immutables, now)?;
        Ok(())
    }

    async fn cancel(&self, caller: &Address, immutables: &Immutables) -> Result<()> {
        let now = *self.time.read();
        self.vault.cancel(caller, immutables, now)?;
        Ok(())
    }

    async fn set_swap_ready(&self, hashlock: &Hash) -> Result<()> {
        let now = *self.time.read();
        self.vault.adapter().set_swap_ready(hashlock, now)?;
        Ok(())
    }

    async fn swap_stage(&self, hashlock: &Hash) -> Result<SwapStage> {
        Ok(self.vault.adapter().get_swap_status(hashlock))
    }

    async fn find_escrow(&self, hashlock: &Hash) -> Result<Option<EscrowRecord>> {
        Ok(self
            .vault
            .factory()
            .find_funded_by_hashlock(hashlock)
            .map(|(identity, escrow)| EscrowRecord {
                identity,
                deployed_at: escrow.immutables.timelocks.deployed_at,
            }))
    }

    async fn escrow_state(&self, identity: &Hash) -> Result<Option<EscrowState>> {
        Ok(self.vault.factory().get(identity).map(|e| e.state))
    }
}
