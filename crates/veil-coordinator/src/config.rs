//! Coordinator configuration.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the order coordinator.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Directory holding persisted order records.
    pub data_dir: PathBuf,
    /// RPC endpoint of the escrow-hosting ledger.
    pub home_rpc_url: String,
    /// RPC endpoint of the counter-ledger wallet.
    pub wallet_rpc_url: String,
    /// Confirmations required on the counter leg.
    pub confirmations: u64,
    /// Delay between driver passes over an order.
    pub poll_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./orders"),
            home_rpc_url: "http://localhost:8545".to_string(),
            wallet_rpc_url: "http://localhost:18083".to_string(),
            confirmations: 10,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl CoordinatorConfig {
    /// Reject configurations that cannot drive a swap.
    pub fn validate(&self) -> Result<()> {
        validate_rpc_url("home_rpc_url", &self.home_rpc_url)?;
        validate_rpc_url("wallet_rpc_url", &self.wallet_rpc_url)?;
        validate_nonzero("confirmations", self.confirmations)?;
        validate_nonzero("poll_interval", self.poll_interval.as_secs())?;
        Ok(())
    }
}

fn validate_rpc_url(label: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{label} must start with http:// or https://"))
    }
}

fn validate_nonzero(label: &str, value: u64) -> Result<()> {
    if value == 0 {
        Err(anyhow!("{label} must be greater than zero"))
    } else {
        Ok(())
    }
}
