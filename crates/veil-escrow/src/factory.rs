//! # Escrow Factory
//!
//! Content-addressed instantiation: an escrow's identity is a pure function
//! of its immutable descriptor, so any party can precompute where an escrow
//! will live before it exists. Creation fails loudly when the identity is
//! already occupied; a given descriptor instantiates at most once.

use crate::domain::{Escrow, EscrowError, EscrowState, Hash, Immutables, Leg};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// Deterministic retrieve-or-create escrow instantiation.
#[derive(Default)]
pub struct EscrowFactory {
    escrows: RwLock<HashMap<Hash, Escrow>>,
}

impl EscrowFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity an escrow with this descriptor will be (or is) stored under.
    ///
    /// Pure: depends only on the descriptor, never on factory state.
    pub fn address_of(immutables: &Immutables) -> Hash {
        immutables.identity()
    }

    /// Instantiate a new escrow for a descriptor, returning its identity.
    pub fn create_escrow(&self, immutables: Immutables, leg: Leg) -> Result<Hash, EscrowError> {
        immutables.timelocks.offsets.validate()?;
        let identity = Self::address_of(&immutables);
        let mut escrows = self.escrows.write();
        if escrows.contains_key(&identity) {
            return Err(EscrowError::EscrowExists(identity));
        }
        info!(identity = %hex::encode(identity), ?leg, "escrow instantiated");
        escrows.insert(identity, Escrow::new(immutables, leg));
        Ok(identity)
    }

    /// Snapshot of the escrow stored at an identity.
    pub fn get(&self, identity: &Hash) -> Option<Escrow> {
        self.escrows.read().get(identity).cloned()
    }

    /// Whether an escrow exists at an identity.
    pub fn contains(&self, identity: &Hash) -> bool {
        self.escrows.read().contains_key(identity)
    }

    /// Identity and snapshot of the funded escrow carrying a hashlock.
    ///
    /// At most one escrow per hashlock ever leaves `Uninitialized` on a
    /// ledger (the adapter's mapping is write-once), so the match is
    /// unambiguous. Uninitialized instances are skipped: they hold no funds
    /// and may be abandoned descriptors.
    pub fn find_funded_by_hashlock(&self, hashlock: &Hash) -> Option<(Hash, Escrow)> {
        self.escrows
            .read()
            .iter()
            .find(|(_, escrow)| {
                escrow.immutables.hashlock == *hashlock
                    && escrow.state != EscrowState::Uninitialized
            })
            .map(|(identity, escrow)| (*identity, escrow.clone()))
    }

    /// Run a closure against the stored escrow under the write lock.
    ///
    /// The vault uses this to validate and apply an operation atomically;
    /// a missing identity maps to `InvalidImmutables` since the descriptor
    /// denotes no instantiated escrow.
    pub fn with_escrow_mut<T>(
        &self,
        identity: &Hash,
        f: impl FnOnce(&mut Escrow) -> Result<T, EscrowError>,
    ) -> Result<T, EscrowError> {
        let mut escrows = self.escrows.write();
        let escrow = escrows
            .get_mut(identity)
            .ok_or(EscrowError::InvalidImmutables)?;
        f(escrow)
    }
}
