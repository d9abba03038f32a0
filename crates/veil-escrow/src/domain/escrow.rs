//! # Escrow Entity
//!
//! One escrow instance per descriptor: custody of principal plus safety
//! deposit, and the hashlock/timelock state machine deciding who may move
//! them and when.
//!
//! One flattened type serves both legs, tagged by [`Leg`]; the leg decides
//! which party deposits and which timelock schedule applies.

use super::errors::{Address, EscrowError, Secret};
use super::immutables::Immutables;
use super::value_objects::{EscrowState, Leg};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One leg's escrow instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Escrow {
    /// Canonical descriptor; also the instance's identity preimage.
    pub immutables: Immutables,
    /// Which leg of the swap this instance custodies.
    pub leg: Leg,
    /// Current lifecycle state.
    pub state: EscrowState,
}

impl Escrow {
    /// Create an unfunded instance for a descriptor.
    pub fn new(immutables: Immutables, leg: Leg) -> Self {
        Self {
            immutables,
            leg,
            state: EscrowState::Uninitialized,
        }
    }

    /// The party entitled to fund this leg: maker on the source leg, taker
    /// on the destination leg. Refunds also flow back here.
    pub fn depositor(&self) -> Address {
        match self.leg {
            Leg::Source => self.immutables.maker,
            Leg::Destination => self.immutables.taker,
        }
    }

    /// The party receiving the principal on a successful claim.
    pub fn counterparty(&self) -> Address {
        match self.leg {
            Leg::Source => self.immutables.taker,
            Leg::Destination => self.immutables.maker,
        }
    }

    fn require_state(&self, expected: EscrowState) -> Result<(), EscrowError> {
        if self.state != expected {
            return Err(EscrowError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{:?}", expected),
            });
        }
        Ok(())
    }

    /// Precondition check for `deposit`: unfunded, and the caller is the
    /// designated depositor for this leg.
    pub fn check_deposit(&self, caller: &Address) -> Result<(), EscrowError> {
        self.require_state(EscrowState::Uninitialized)?;
        if *caller != self.depositor() {
            return Err(EscrowError::InvalidCaller);
        }
        Ok(())
    }

    /// Precondition check for `withdraw` / `publicWithdraw`.
    ///
    /// State must be `Funded`, the preimage must hash to the hashlock, and
    /// `now` must fall inside the (private or public) withdrawal window.
    /// Caller entitlement for the private window is maker-or-taker; the
    /// public window's credential check lives with the vault, which owns the
    /// access list.
    pub fn check_withdraw(
        &self,
        caller: &Address,
        secret: &Secret,
        now: u64,
        public_caller: bool,
    ) -> Result<(), EscrowError> {
        self.require_state(EscrowState::Funded)?;
        if !public_caller && *caller != self.immutables.maker && *caller != self.immutables.taker {
            return Err(EscrowError::InvalidCaller);
        }
        self.immutables
            .timelocks
            .check_withdrawal_window(self.leg, now, public_caller)?;
        let digest: [u8; 32] = Sha256::digest(secret).into();
        if digest != self.immutables.hashlock {
            return Err(EscrowError::InvalidSecret);
        }
        Ok(())
    }

    /// Precondition check for `cancel`: still funded, past the cancellation
    /// start, and called by the refunding party (the depositor).
    pub fn check_cancel(&self, caller: &Address, now: u64) -> Result<(), EscrowError> {
        self.require_state(EscrowState::Funded)?;
        if *caller != self.depositor() {
            return Err(EscrowError::InvalidCaller);
        }
        self.immutables
            .timelocks
            .check_cancellation_window(self.leg, now)
    }

    /// Transition to a new state, rejecting anything the lifecycle does not
    /// allow.
    pub fn transition_to(&mut self, next: EscrowState) -> Result<(), EscrowError> {
        if !self.state.can_transition_to(next) {
            return Err(EscrowError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("{:?}", next),
            });
        }
        self.state = next;
        Ok(())
    }
}
