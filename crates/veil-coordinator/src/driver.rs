//! Order protocol driver.
//!
//! `step` advances an order by at most one state. Each pass starts with a
//! timeout check: once the source leg's cancellation stage opens, any
//! non-terminal order is unwound instead of advanced. Callers re-invoke
//! `step` until it returns `None` (nothing left to do right now).
//!
//! Concurrent drivers on the same order must serialize through
//! [`crate::store::JsonFileStore::lock_order`].

use anyhow::{anyhow, Result};
use std::time::Instant;
use tracing::{info, warn};
use veil_escrow::{generate_secret, Address, EscrowState};

use crate::chain::{EscrowChain, EscrowRecord};
use crate::metrics::SwapMetrics;
use crate::order::{Order, OrderState, OrderTerms};
use crate::store::OrderStore;
use crate::wallet::{CounterLedgerWallet, PaymentRequest};

/// Validate terms, mint secrets and persist a fresh order.
pub fn create_order<D, M>(terms: OrderTerms, store: &D, metrics: &M, now: u64) -> Result<Order>
where
    D: OrderStore,
    M: SwapMetrics,
{
    terms.offsets.validate()?;
    if terms.src_amount == 0 || terms.dst_amount == 0 {
        return Err(anyhow!("order amounts must be greater than zero"));
    }
    let order = Order::new(terms, generate_secret(), generate_secret(), now);
    store.save(&order)?;
    metrics.record_order_created();
    info!(order = %order.id, "order created");
    Ok(order)
}

/// Commit a taker to an open order.
pub fn fill_order<D, M>(order: &mut Order, taker: Address, store: &D, metrics: &M) -> Result<()>
where
    D: OrderStore,
    M: SwapMetrics,
{
    if order.state != OrderState::Created {
        return Err(anyhow!(
            "order {} cannot be filled from state {}",
            order.id,
            order.state.label()
        ));
    }
    let from = order.state.label();
    order.state = OrderState::Filled { taker };
    store.save(order)?;
    metrics.record_transition(from, order.state.label());
    info!(order = %order.id, taker = %hex::encode(taker), "order filled");
    Ok(())
}

/// Drive one protocol step; `None` means there was nothing to advance.
pub async fn step<D, C, W, M>(
    order: &Order,
    store: &D,
    chain: &C,
    wallet: &W,
    metrics: &M,
) -> Result<Option<Order>>
where
    D: OrderStore,
    C: EscrowChain,
    W: CounterLedgerWallet,
    M: SwapMetrics,
{
    if let Some(deadline) = order.cancellation_start() {
        let now = chain.now().await?;
        if now >= deadline && !order.state.is_terminal() {
            let refunded = handle_refund(order, chain, metrics).await?;
            store.save(&refunded)?;
            metrics.record_transition(order.state.label(), refunded.state.label());
            return Ok(Some(refunded));
        }
    }

    let mut next = order.clone();
    match &order.state {
        // Waiting on a taker; `fill_order` is the only way forward.
        OrderState::Created => return Ok(None),

        OrderState::Filled { taker } => {
            let started = Instant::now();
            // A crashed pass may have funded the escrow without saving the
            // transition. Recover the on-chain record in that case: deriving
            // a fresh descriptor would anchor a second schedule and trip the
            // adapter's write-once mapping forever.
            let record = match chain.find_escrow(&next.hashlock).await? {
                Some(found) => {
                    info!(order = %next.id, identity = %hex::encode(found.identity),
                        "escrow already funded on chain; recording it");
                    found
                }
                None => {
                    let deployed_at = chain.now().await?;
                    let immutables = next.immutables(*taker, deployed_at)?;
                    let identity = chain
                        .create_escrow(&immutables, veil_escrow::Leg::Source)
                        .await?;
                    chain
                        .deposit(
                            &next.terms.maker,
                            &next.hashlock,
                            &next.refund_commitment,
                            &immutables,
                        )
                        .await?;
                    metrics.record_escrow_funded();
                    EscrowRecord {
                        identity,
                        deployed_at,
                    }
                }
            };
            metrics.record_latency("fund_escrow", started.elapsed());
            next.state = OrderState::EscrowCreated {
                taker: *taker,
                identity: record.identity,
                deployed_at: record.deployed_at,
            };
        }

        OrderState::EscrowCreated {
            taker,
            identity,
            deployed_at,
        } => {
            let started = Instant::now();
            let payment = wallet
                .submit_payment(&PaymentRequest {
                    to: next.terms.counter_address.clone(),
                    amount: next.terms.dst_amount,
                    order_id: next.id,
                })
                .await?;
            // With the counter leg under way, shorten the private wait by
            // marking the registry record claimable.
            chain.set_swap_ready(&next.hashlock).await?;
            metrics.record_latency("fund_counter_leg", started.elapsed());
            next.state = OrderState::CounterLegFunded {
                taker: *taker,
                identity: *identity,
                deployed_at: *deployed_at,
                payment,
            };
        }

        OrderState::CounterLegFunded {
            taker,
            identity,
            deployed_at,
            payment,
        } => {
            if !wallet.is_confirmed(payment).await? {
                return Ok(None);
            }
            let started = Instant::now();
            let proof = wallet.fetch_proof(payment).await?;
            metrics.record_latency("confirm_counter_leg", started.elapsed());
            next.state = OrderState::SecretRevealed {
                taker: *taker,
                identity: *identity,
                deployed_at: *deployed_at,
                proof: proof.clone(),
            };
            info!(order = %next.id, tx = %proof.tx_id, "counter leg confirmed; secret disclosed");
        }

        OrderState::SecretRevealed {
            taker,
            identity,
            deployed_at,
            ..
        } => {
            let started = Instant::now();
            let immutables = next.immutables(*taker, *deployed_at)?;
            match chain.escrow_state(identity).await? {
                // Already settled on chain; just record it.
                Some(EscrowState::Withdrawn) => {}
                _ => {
                    let secret = next.secret().expose();
                    chain.withdraw(taker, &secret, &immutables).await?;
                    metrics.record_escrow_withdrawn();
                }
            }
            metrics.record_latency("settle", started.elapsed());
            next.state = OrderState::Completed {
                identity: *identity,
            };
        }

        OrderState::Completed { .. } | OrderState::Refunded { .. } => return Ok(None),
    }

    store.save(&next)?;
    metrics.record_transition(order.state.label(), next.state.label());
    Ok(Some(next))
}

async fn handle_refund<C, M>(order: &Order, chain: &C, metrics: &M) -> Result<Order>
where
    C: EscrowChain,
    M: SwapMetrics,
{
    let (taker, identity, deployed_at) = match &order.state {
        OrderState::EscrowCreated {
            taker,
            identity,
            deployed_at,
        }
        | OrderState::CounterLegFunded {
            taker,
            identity,
            deployed_at,
            ..
        }
        | OrderState::SecretRevealed {
            taker,
            identity,
            deployed_at,
            ..
        } => (*taker, *identity, *deployed_at),
        _ => return Err(anyhow!("cannot refund from state {}", order.state.label())),
    };

    let started = Instant::now();
    let immutables = order.immutables(taker, deployed_at)?;
    match chain.escrow_state(&identity).await? {
        // A concurrent refund already landed; just record it.
        Some(EscrowState::Cancelled) => {}
        Some(EscrowState::Funded) => {
            chain.cancel(&order.terms.maker, &immutables).await?;
            metrics.record_escrow_cancelled();
        }
        other => {
            warn!(order = %order.id, ?other, "refund with no cancellable escrow");
        }
    }
    metrics.record_latency("refund", started.elapsed());

    let mut refunded = order.clone();
    refunded.state = OrderState::Refunded {
        reason: "source-leg cancellation deadline passed".to_string(),
    };
    info!(order = %refunded.id, "order refunded");
    Ok(refunded)
}
