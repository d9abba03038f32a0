//! In-Memory Swap Registry
//!
//! Implements the `SwapRegistry` port with the collaborator contract's
//! documented stage machine. In production the adapter talks to the
//! deployed registry; this implementation backs tests and local runs.

use crate::domain::{Address, EscrowError, Secret, SwapId, SwapStage};
use crate::ports::{NewSwapParams, SwapRegistry};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::collections::HashMap;
use tracing::debug;

struct SwapRecord {
    params: NewSwapParams,
    stage: SwapStage,
}

/// In-memory registry of swap records.
#[derive(Default)]
pub struct InMemorySwapRegistry {
    swaps: RwLock<HashMap<SwapId, SwapRecord>>,
}

impl InMemorySwapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

fn swap_id(params: &NewSwapParams) -> SwapId {
    let mut hasher = Keccak256::new();
    sha3::Digest::update(&mut hasher, params.owner);
    sha3::Digest::update(&mut hasher, params.claimer);
    sha3::Digest::update(&mut hasher, params.claim_commitment);
    sha3::Digest::update(&mut hasher, params.refund_commitment);
    sha3::Digest::update(&mut hasher, params.timeout_1.to_be_bytes());
    sha3::Digest::update(&mut hasher, params.timeout_2.to_be_bytes());
    sha3::Digest::update(&mut hasher, params.asset.canonical_bytes());
    sha3::Digest::update(&mut hasher, params.value.to_be_bytes());
    sha3::Digest::update(&mut hasher, params.nonce.to_be_bytes());
    sha3::Digest::finalize(hasher).into()
}

impl SwapRegistry for InMemorySwapRegistry {
    fn new_swap(&self, params: NewSwapParams, now: u64) -> Result<SwapId, EscrowError> {
        if params.timeout_1 >= params.timeout_2 {
            return Err(EscrowError::Registry(format!(
                "timeout_1 ({}) must precede timeout_2 ({})",
                params.timeout_1, params.timeout_2
            )));
        }
        if now >= params.timeout_2 {
            return Err(EscrowError::Registry(
                "swap would be created already expired".to_string(),
            ));
        }
        let id = swap_id(&params);
        let mut swaps = self.swaps.write();
        if swaps.contains_key(&id) {
            return Err(EscrowError::Registry(format!(
                "swap {} already exists",
                hex::encode(id)
            )));
        }
        debug!(swap = %hex::encode(id), value = params.value, "registry: swap record created");
        swaps.insert(
            id,
            SwapRecord {
                params,
                stage: SwapStage::Pending,
            },
        );
        Ok(id)
    }

    fn set_ready(&self, id: &SwapId, caller: &Address, _now: u64) -> Result<(), EscrowError> {
        let mut swaps = self.swaps.write();
        let record = swaps
            .get_mut(id)
            .ok_or_else(|| EscrowError::Registry(format!("unknown swap {}", hex::encode(id))))?;
        if *caller != record.params.owner {
            return Err(EscrowError::InvalidCaller);
        }
        if record.stage != SwapStage::Pending {
            return Err(EscrowError::UnexpectedStage(record.stage));
        }
        record.stage = SwapStage::Ready;
        Ok(())
    }

    fn claim(
        &self,
        id: &SwapId,
        caller: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError> {
        let mut swaps = self.swaps.write();
        let record = swaps
            .get_mut(id)
            .ok_or_else(|| EscrowError::Registry(format!("unknown swap {}", hex::encode(id))))?;
        let params = &record.params;
        if *caller != params.claimer && *caller != params.owner {
            return Err(EscrowError::InvalidCaller);
        }
        if record.stage == SwapStage::Completed {
            return Err(EscrowError::UnexpectedStage(record.stage));
        }
        // Before timeout_1 the owner must have signalled readiness; after it
        // the claimer may claim regardless, until timeout_2 closes claiming.
        let open = record.stage == SwapStage::Ready || now >= params.timeout_1;
        if !open || now >= params.timeout_2 {
            return Err(EscrowError::InvalidTime {
                now,
                not_before: params.timeout_1,
                not_after: params.timeout_2,
            });
        }
        let digest: [u8; 32] = Sha256::digest(secret).into();
        if digest != params.claim_commitment {
            return Err(EscrowError::InvalidSecret);
        }
        debug!(swap = %hex::encode(id), "registry: swap claimed");
        record.stage = SwapStage::Completed;
        Ok(())
    }

    fn refund(
        &self,
        id: &SwapId,
        caller: &Address,
        secret: &Secret,
        now: u64,
    ) -> Result<(), EscrowError> {
        let mut swaps = self.swaps.write();
        let record = swaps
            .get_mut(id)
            .ok_or_else(|| EscrowError::Registry(format!("unknown swap {}", hex::encode(id))))?;
        let params = &record.params;
        if *caller != params.owner {
            return Err(EscrowError::InvalidCaller);
        }
        if record.stage == SwapStage::Completed {
            return Err(EscrowError::UnexpectedStage(record.stage));
        }
        // Refund is open before timeout_1 while the swap was never readied,
        // and unconditionally once timeout_2 passes.
        let open = (record.stage == SwapStage::Pending && now < params.timeout_1)
            || now >= params.timeout_2;
        if !open {
            return Err(EscrowError::InvalidTime {
                now,
                not_before: params.timeout_2,
                not_after: u64::MAX,
            });
        }
        let digest: [u8; 32] = Sha256::digest(secret).into();
        if digest != params.refund_commitment {
            return Err(EscrowError::InvalidSecret);
        }
        debug!(swap = %hex::encode(id), "registry: swap refunded");
        record.stage = SwapStage::Completed;
        Ok(())
    }

    fn swap_stage(&self, id: &SwapId) -> SwapStage {
        self.swaps
            .read()
            .get(id)
            .map(|record| record.stage)
            .unwrap_or(SwapStage::Invalid)
    }
}
