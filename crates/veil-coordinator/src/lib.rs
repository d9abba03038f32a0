//! # Veil Coordinator
//!
//! Off-chain coordinator driving both legs of an atomic swap from the
//! maker's side: escrow funding on the home ledger, payment and
//! confirmation on the privacy-preserving counter ledger.
//!
//! ## Order Lifecycle
//!
//! ```text
//! Created ─> Filled ─> EscrowCreated ─> CounterLegFunded ─> SecretRevealed ─> Completed
//!                          │                  │                   │
//!                          └──────────────────┴───────────────────┴──> Refunded
//! ```
//!
//! Every state is persisted before it is acted on, so a crashed run resumes
//! from its last durable record. The timeout path takes priority: once the
//! source leg's cancellation stage opens, `driver::step` unwinds the order
//! instead of advancing it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod config;
pub mod driver;
pub mod metrics;
pub mod order;
pub mod store;
pub mod wallet;

pub use chain::{EscrowChain, EscrowRecord, LocalEscrowChain};
pub use config::CoordinatorConfig;
pub use driver::{create_order, fill_order, step};
pub use metrics::{NoopMetrics, PrometheusMetrics, SwapMetrics};
pub use order::{Order, OrderState, OrderTerms, PaymentProof, PaymentRef};
pub use store::{JsonFileStore, OrderLock, OrderStore};
pub use wallet::{
    CounterLedgerWallet, MockWallet, PaymentRequest, RetryPolicy, RetryingWallet,
};
