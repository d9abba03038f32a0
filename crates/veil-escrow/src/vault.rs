//! # Escrow Vault
//!
//! Transactional execution of the four escrow operations. Every operation
//! runs validate-then-apply under the factory's escrow lock: all
//! preconditions (state, caller, window, preimage, balances, mapping slot)
//! are checked before the first fund movement, so a rejected call leaves
//! ledger, registry and escrow state untouched.
//!
//! Custody split: the vault account holds native principal and every safety
//! deposit; token principal sits with the adapter from `deposit` until a
//! claim, refund or cancellation releases it.

use crate::adapters::{CreateSwapParams, SwapAdapter};
use crate::domain::{Address, Asset, EscrowError, EscrowState, Hash, Immutables, Secret, Stage};
use crate::events::{EscrowEvent, EventLog};
use crate::factory::EscrowFactory;
use crate::ports::AssetLedger;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Executes escrow operations over the factory's instances.
pub struct EscrowVault {
    factory: Arc<EscrowFactory>,
    adapter: Arc<SwapAdapter>,
    ledger: Arc<dyn AssetLedger>,
    address: Address,
    events: Arc<EventLog>,
    public_withdrawers: RwLock<HashSet<Address>>,
}

impl EscrowVault {
    /// Create a vault at `address` over the given collaborators.
    pub fn new(
        factory: Arc<EscrowFactory>,
        adapter: Arc<SwapAdapter>,
        ledger: Arc<dyn AssetLedger>,
        address: Address,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            factory,
            adapter,
            ledger,
            address,
            events,
            public_withdrawers: RwLock::new(HashSet::new()),
        }
    }

    /// Account the vault custodies funds under.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Factory the vault executes against.
    pub fn factory(&self) -> &Arc<EscrowFactory> {
        &self.factory
    }

    /// Adapter the vault bridges registry calls through.
    pub fn adapter(&self) -> &Arc<SwapAdapter> {
        &self.adapter
    }

    /// Grant an account the public-withdrawal credential.
    pub fn add_public_withdrawer(&self, account: Address) {
        self.public_withdrawers.write().insert(account);
    }

    /// Fund an escrow leg.
    ///
    /// Pulls principal plus safety deposit from the caller, creates the
    /// registry record through the adapter, and transitions the escrow to
    /// `Funded`. The claim commitment must equal the escrow's hashlock.
    pub fn deposit(
        &self,
        caller: &Address,
        claim_commitment: &Hash,
        refund_commitment: &Hash,
        immutables: &Immutables,
        now: u64,
    ) -> Result<(), EscrowError> {
        let identity = EscrowFactory::address_of(immutables);
        self.factory.with_escrow_mut(&identity, |escrow| {
            escrow.check_deposit(caller)?;
            if *claim_commitment != immutables.hashlock {
                return Err(EscrowError::InvalidImmutables);
            }
            if self.adapter.is_mapped(&immutables.hashlock) {
                return Err(EscrowError::HashlockInUse(immutables.hashlock));
            }
            self.check_funding_balance(caller, immutables)?;

            let leg = escrow.leg;
            let claimer = escrow.counterparty();
            // Apply phase: pre-validated, so none of this fails.
            self.ledger
                .transfer(caller, &self.address, &immutables.asset, immutables.amount)?;
            self.ledger.transfer(
                caller,
                &self.address,
                &Asset::Native,
                immutables.safety_deposit,
            )?;
            if let Asset::Token(_) = immutables.asset {
                self.ledger
                    .approve(&self.address, &self.adapter.address(), &immutables.asset, immutables.amount)?;
            }
            self.adapter.create_swap(
                CreateSwapParams {
                    hashlock: immutables.hashlock,
                    refund_commitment: *refund_commitment,
                    depositor: self.address,
                    claimer,
                    timeout_1: immutables.timelocks.start_of(leg, Stage::Withdrawal),
                    timeout_2: immutables.timelocks.start_of(leg, Stage::Cancellation),
                    asset: immutables.asset,
                    value: immutables.amount,
                    nonce: u64::from_be_bytes(identity[..8].try_into().unwrap_or_default()),
                },
                now,
            )?;
            escrow.transition_to(EscrowState::Funded)?;
            info!(identity = %hex::encode(identity), ?leg, amount = immutables.amount, "escrow funded");
            self.events.record(EscrowEvent::Deposit {
                identity,
                hashlock: immutables.hashlock,
                leg,
                caller: *caller,
                asset: immutables.asset,
                amount: immutables.amount,
                safety_deposit: immutables.safety_deposit,
            });
            Ok(())
        })
    }

    /// Withdraw with the secret during the private window.
    pub fn withdraw(
        &self,
        caller: &Address,
        secret: &Secret,
        immutables: &Immutables,
        now: u64,
    ) -> Result<(), EscrowError> {
        self.withdraw_inner(caller, secret, immutables, now, false)
    }

    /// Withdraw with the secret during the public window.
    ///
    /// The caller must hold the public-withdrawal credential; effects are
    /// identical to [`EscrowVault::withdraw`].
    pub fn public_withdraw(
        &self,
        caller: &Address,
        secret: &Secret,
        immutables: &Immutables,
        now: u64,
    ) -> Result<(), EscrowError> {
        if !self.public_withdrawers.read().contains(caller) {
            return Err(EscrowError::InvalidCaller);
        }
        self.withdraw_inner(caller, secret, immutables, now, true)
    }

    fn withdraw_inner(
        &self,
        caller: &Address,
        secret: &Secret,
        immutables: &Immutables,
        now: u64,
        public_caller: bool,
    ) -> Result<(), EscrowError> {
        let identity = EscrowFactory::address_of(immutables);
        self.factory.with_escrow_mut(&identity, |escrow| {
            escrow.check_withdraw(caller, secret, now, public_caller)?;
            self.check_payout_balance(immutables)?;

            let counterparty = escrow.counterparty();
            let depositor = escrow.depositor();
            // Registry first: the escrow window sits inside the record's
            // claim window, so this cannot fail after check_withdraw.
            self.adapter
                .claim_swap(&immutables.hashlock, &counterparty, secret, now)?;
            if immutables.asset == Asset::Native {
                self.ledger.transfer(
                    &self.address,
                    &counterparty,
                    &Asset::Native,
                    immutables.amount,
                )?;
            }
            self.ledger.transfer(
                &self.address,
                &depositor,
                &Asset::Native,
                immutables.safety_deposit,
            )?;
            escrow.transition_to(EscrowState::Withdrawn)?;
            info!(identity = %hex::encode(identity), public = public_caller, "escrow withdrawn");
            self.events.record(EscrowEvent::EscrowWithdrawal {
                identity,
                hashlock: immutables.hashlock,
                caller: *caller,
                secret: *secret,
            });
            Ok(())
        })
    }

    /// Cancel a funded escrow after its cancellation stage opens.
    pub fn cancel(
        &self,
        caller: &Address,
        immutables: &Immutables,
        now: u64,
    ) -> Result<(), EscrowError> {
        let identity = EscrowFactory::address_of(immutables);
        self.factory.with_escrow_mut(&identity, |escrow| {
            escrow.check_cancel(caller, now)?;
            self.check_payout_balance(immutables)?;

            let depositor = escrow.depositor();
            match immutables.asset {
                Asset::Native => {
                    self.ledger.transfer(
                        &self.address,
                        &depositor,
                        &Asset::Native,
                        immutables.amount,
                    )?;
                }
                Asset::Token(_) => {
                    // The refund preimage lives off-chain; the adapter hands
                    // custody back without completing the registry record.
                    self.adapter
                        .release_custody(&immutables.hashlock, &depositor)?;
                }
            }
            self.ledger.transfer(
                &self.address,
                &depositor,
                &Asset::Native,
                immutables.safety_deposit,
            )?;
            escrow.transition_to(EscrowState::Cancelled)?;
            info!(identity = %hex::encode(identity), "escrow cancelled");
            self.events.record(EscrowEvent::EscrowCancelled {
                identity,
                hashlock: immutables.hashlock,
                caller: *caller,
            });
            Ok(())
        })
    }

    fn check_funding_balance(
        &self,
        caller: &Address,
        immutables: &Immutables,
    ) -> Result<(), EscrowError> {
        let native_needed = match immutables.asset {
            Asset::Native => immutables.amount + immutables.safety_deposit,
            Asset::Token(_) => {
                let balance = self.ledger.balance(caller, &immutables.asset);
                if balance < immutables.amount {
                    return Err(EscrowError::InsufficientBalance {
                        needed: immutables.amount,
                        available: balance,
                    });
                }
                immutables.safety_deposit
            }
        };
        let native = self.ledger.balance(caller, &Asset::Native);
        if native < native_needed {
            return Err(EscrowError::InsufficientBalance {
                needed: native_needed,
                available: native,
            });
        }
        Ok(())
    }

    fn check_payout_balance(&self, immutables: &Immutables) -> Result<(), EscrowError> {
        let needed = match immutables.asset {
            Asset::Native => immutables.amount + immutables.safety_deposit,
            Asset::Token(_) => immutables.safety_deposit,
        };
        let balance = self.ledger.balance(&self.address, &Asset::Native);
        if balance < needed {
            return Err(EscrowError::InsufficientBalance {
                needed,
                available: balance,
            });
        }
        Ok(())
    }
}
