//! Counter-ledger wallet access.
//!
//! The coordinator talks to the privacy-preserving ledger through a narrow
//! wallet interface: submit a payment, poll its confirmation, fetch a
//! proof. Wallet RPCs are slow and flaky, so `RetryingWallet` wraps every
//! call in a bounded timeout with exponential backoff.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::order::{PaymentProof, PaymentRef};

/// A payment to submit on the counter ledger.
#[derive(Clone, Debug)]
pub struct PaymentRequest {
    /// Destination address on the counter ledger.
    pub to: String,
    /// Amount in counter-ledger base units.
    pub amount: u128,
    /// Order the payment settles.
    pub order_id: Uuid,
}

/// Outbound port to the counter-ledger wallet.
#[async_trait]
pub trait CounterLedgerWallet: Send + Sync {
    /// Submit a payment; returns a reference to poll.
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentRef>;

    /// Whether a submitted payment has enough confirmations.
    async fn is_confirmed(&self, payment: &PaymentRef) -> Result<bool>;

    /// Fetch the confirmation proof for a confirmed payment.
    async fn fetch_proof(&self, payment: &PaymentRef) -> Result<PaymentProof>;
}

/// Retry schedule for wallet calls.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each retry.
    pub initial_backoff: Duration,
    /// Per-attempt deadline.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(250),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Wallet wrapper applying a [`RetryPolicy`] to every call.
pub struct RetryingWallet<W> {
    inner: W,
    policy: RetryPolicy,
}

impl<W: CounterLedgerWallet> RetryingWallet<W> {
    /// Wrap a wallet with a retry policy.
    pub fn new(inner: W, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<'a, T, F, Fut>(&'a self, call: &'static str, f: F) -> Result<T>
    where
        F: Fn(&'a W) -> Fut,
        Fut: std::future::Future<Output = Result<T>> + 'a,
    {
        let mut backoff = self.policy.initial_backoff;
        let mut last_err = None;
        for attempt in 1..=self.policy.max_attempts {
            match tokio::time::timeout(self.policy.call_timeout, f(&self.inner)).await {
                Ok(Ok(value)) => {
                    let outcome = if attempt == 1 { "ok" } else { "retried" };
                    veil_telemetry::WALLET_CALLS
                        .with_label_values(&[call, outcome])
                        .inc();
                    return Ok(value);
                }
                Ok(Err(err)) => {
                    warn!(call, attempt, error = %err, "wallet call failed");
                    last_err = Some(err);
                }
                Err(_) => {
                    warn!(call, attempt, "wallet call timed out");
                    last_err = Some(anyhow!(
                        "{call} timed out after {:?}",
                        self.policy.call_timeout
                    ));
                }
            }
            if attempt < self.policy.max_attempts {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
        veil_telemetry::WALLET_CALLS
            .with_label_values(&[call, "failed"])
            .inc();
        Err(last_err.unwrap_or_else(|| anyhow!("{call} failed with no attempts")))
    }
}

#[async_trait]
impl<W: CounterLedgerWallet> CounterLedgerWallet for RetryingWallet<W> {
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentRef> {
        self.with_retry("submit_payment", |w| w.submit_payment(request))
            .await
    }

    async fn is_confirmed(&self, payment: &PaymentRef) -> Result<bool> {
        self.with_retry("is_confirmed", |w| w.is_confirmed(payment))
            .await
    }

    async fn fetch_proof(&self, payment: &PaymentRef) -> Result<PaymentProof> {
        self.with_retry("fetch_proof", |w| w.fetch_proof(payment))
            .await
    }
}

/// Scripted wallet for tests.
pub struct MockWallet {
    confirmations_required: u64,
    submit_failures: parking_lot::Mutex<u32>,
    polls: parking_lot::Mutex<u64>,
}

impl MockWallet {
    /// A wallet that confirms after `confirmations_required` polls.
    pub fn new(confirmations_required: u64) -> Self {
        Self {
            confirmations_required,
            submit_failures: parking_lot::Mutex::new(0),
            polls: parking_lot::Mutex::new(0),
        }
    }

    /// Make the next `n` submissions fail before succeeding.
    pub fn fail_submissions(&self, n: u32) {
        *self.submit_failures.lock() = n;
    }
}

#[async_trait]
impl CounterLedgerWallet for MockWallet {
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<PaymentRef> {
        let mut failures = self.submit_failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(anyhow!("wallet rpc unavailable"));
        }
        Ok(PaymentRef {
            tx_id: format!("ctx-{}", request.order_id.simple()),
        })
    }

    async fn is_confirmed(&self, _payment: &PaymentRef) -> Result<bool> {
        let mut polls = self.polls.lock();
        *polls += 1;
        Ok(*polls >= self.confirmations_required)
    }

    async fn fetch_proof(&self, payment: &PaymentRef) -> Result<PaymentProof> {
        Ok(PaymentProof {
            tx_id: payment.tx_id.clone(),
            confirmations: self.confirmations_required,
        })
    }
}
