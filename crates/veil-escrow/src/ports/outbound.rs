//! # Outbound Ports
//!
//! Traits for the escrow core's external collaborators.
//!
//! Both ports are synchronous: escrow operations execute one transaction at
//! a time, serialized by the underlying ledger's consensus, so there is no
//! in-process concurrency to suspend on. Async plumbing belongs to the
//! off-chain coordinator, not here.

use crate::domain::{Address, Asset, EscrowError, Hash, Secret, SwapId, SwapStage};

/// Asset ledger - outbound port.
///
/// Balance and allowance bookkeeping for native currency and tokens. The
/// implementations trust their caller with authorization: who may move which
/// funds is decided by escrow/adapter preconditions, not down here.
pub trait AssetLedger: Send + Sync {
    /// Balance of an account in an asset.
    fn balance(&self, account: &Address, asset: &Asset) -> u128;

    /// Move funds between accounts.
    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError>;

    /// Grant a spender an allowance over the owner's funds.
    fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError>;

    /// Remaining allowance of a spender over an owner's funds.
    fn allowance(&self, owner: &Address, spender: &Address, asset: &Asset) -> u128;

    /// Pull funds from an owner using a previously granted allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError>;
}

/// Parameters for `SwapRegistry::new_swap`. Mirrors the collaborator's
/// fixed external interface.
#[derive(Clone, Debug)]
pub struct NewSwapParams {
    /// Account that created the record and may refund it.
    pub owner: Address,
    /// Account entitled to claim.
    pub claimer: Address,
    /// Commitment the claim preimage must hash to.
    pub claim_commitment: Hash,
    /// Commitment the refund preimage must hash to.
    pub refund_commitment: Hash,
    /// After this instant the claimer may claim even without `set_ready`.
    pub timeout_1: u64,
    /// After this instant the owner may always refund; claiming closes.
    pub timeout_2: u64,
    /// Asset the record accounts for.
    pub asset: Asset,
    /// Principal value.
    pub value: u128,
    /// Owner-chosen disambiguator so identical terms yield distinct records.
    pub nonce: u64,
}

/// Swap registry - outbound port.
///
/// Pre-existing collaborator contract tracking swap records keyed by an
/// opaque identifier. The escrow core only consumes this interface; the
/// registry's internal state is its own system of record.
pub trait SwapRegistry: Send + Sync {
    /// Create a record; returns its identifier.
    fn new_swap(&self, params: NewSwapParams, now: u64) -> Result<SwapId, EscrowError>;

    /// Owner signals the claimer may claim immediately.
    fn set_ready(&self, id: &SwapId, caller: &Address, now: u64) -> Result<(), EscrowError>;

    /// Complete the record with the claim preimage.
    fn claim(
        &self,
        id: &SwapId,
        caller: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError>;

    /// Complete the record with the refund preimage.
    fn refund(
        &self,
        id: &SwapId,
        caller: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError>;

    /// Stage of a record; `Invalid` when the identifier is unknown.
    fn swap_stage(&self, id: &SwapId) -> SwapStage;
}
