//! # Swap Protocol Tests
//!
//! End-to-end coordinator runs over a local escrow chain and a scripted
//! counter-ledger wallet: the happy path to `Completed`, the timeout path
//! to `Refunded`, and crash-resume over the persisted store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use veil_coordinator::{
        create_order, fill_order, step, EscrowChain, JsonFileStore, LocalEscrowChain, MockWallet,
        NoopMetrics, Order, OrderState, OrderStore, OrderTerms,
    };
    use veil_escrow::{
        Asset, AssetLedger, EscrowFactory, EscrowState, EscrowVault, EventLog, InMemoryLedger,
        InMemorySwapRegistry, LegSchedule, SwapAdapter, SwapStage, TimelockOffsets,
    };

    const VAULT: [u8; 20] = [0xEEu8; 20];
    const ADAPTER: [u8; 20] = [0xAAu8; 20];
    const MAKER: [u8; 20] = [1u8; 20];
    const TAKER: [u8; 20] = [2u8; 20];

    const START: u64 = 1_000;

    struct Harness {
        store: JsonFileStore,
        chain: LocalEscrowChain,
        ledger: Arc<InMemoryLedger>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let registry = Arc::new(InMemorySwapRegistry::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let events = Arc::new(EventLog::new());
        let adapter = Arc::new(SwapAdapter::new(
            registry,
            ledger.clone(),
            ADAPTER,
            events.clone(),
        ));
        let factory = Arc::new(EscrowFactory::new());
        let vault = Arc::new(EscrowVault::new(
            factory,
            adapter,
            ledger.clone(),
            VAULT,
            events,
        ));
        ledger.mint(&MAKER, &Asset::Native, 100_000);
        let dir = tempfile::tempdir().unwrap();
        Harness {
            store: JsonFileStore::new(dir.path()).unwrap(),
            chain: LocalEscrowChain::new(vault, START),
            ledger,
            _dir: dir,
        }
    }

    fn terms() -> OrderTerms {
        OrderTerms {
            maker: MAKER,
            src_asset: Asset::Native,
            src_amount: 1_000,
            safety_deposit: 50,
            dst_amount: 900,
            counter_address: "veil1makerreceive".to_string(),
            offsets: TimelockOffsets {
                src: LegSchedule {
                    withdrawal: 5,
                    public_withdrawal: 20,
                    cancellation: 100,
                },
                dst: LegSchedule {
                    withdrawal: 5,
                    public_withdrawal: 20,
                    cancellation: 60,
                },
            },
        }
    }

    async fn drive_once(h: &Harness, wallet: &MockWallet, order: &Order) -> Option<Order> {
        let _lock = h.store.lock_order(&order.id).unwrap();
        step(order, &h.store, &h.chain, wallet, &NoopMetrics)
            .await
            .unwrap()
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_order_runs_to_completion() {
        let h = harness();
        let wallet = MockWallet::new(2);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();

        // Filled -> EscrowCreated: source leg funded on chain.
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let (identity, deployed_at) = match &order.state {
            OrderState::EscrowCreated {
                identity,
                deployed_at,
                ..
            } => (*identity, *deployed_at),
            other => panic!("unexpected state {other:?}"),
        };
        assert_eq!(deployed_at, START);
        assert_eq!(
            h.chain.vault().factory().get(&identity).unwrap().state,
            EscrowState::Funded
        );
        assert_eq!(h.ledger.balance(&VAULT, &Asset::Native), 1_050);

        // EscrowCreated -> CounterLegFunded: payment submitted, registry
        // record marked ready.
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::CounterLegFunded { .. }));
        assert_eq!(
            h.chain.vault().adapter().get_swap_status(&order.hashlock),
            SwapStage::Ready
        );

        // First poll: not yet confirmed, nothing to do.
        assert!(drive_once(&h, &wallet, &order).await.is_none());

        // Second poll confirms; the proof discloses the secret.
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::SecretRevealed { .. }));

        // SecretRevealed -> Completed: taker settles the source leg.
        h.chain.advance_time(10);
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::Completed { .. }));
        assert_eq!(h.ledger.balance(&TAKER, &Asset::Native), 1_000);
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 99_000);
        assert_eq!(h.ledger.balance(&VAULT, &Asset::Native), 0);

        // Terminal: further steps are no-ops.
        assert!(drive_once(&h, &wallet, &order).await.is_none());
    }

    // =========================================================================
    // TIMEOUT PATH
    // =========================================================================

    #[tokio::test]
    async fn test_stalled_order_refunds_after_deadline() {
        let h = harness();
        let wallet = MockWallet::new(u64::MAX);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();

        // Counter leg never confirms; polls keep returning nothing.
        assert!(drive_once(&h, &wallet, &order).await.is_none());

        // Past the source-leg cancellation deadline the driver unwinds the
        // order instead of polling further.
        h.chain.set_time(START + 100);
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::Refunded { .. }));
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 100_000);
        assert_eq!(h.ledger.balance(&VAULT, &Asset::Native), 0);

        // Refunded is terminal even after more time passes.
        h.chain.advance_time(1_000);
        assert!(drive_once(&h, &wallet, &order).await.is_none());
    }

    #[tokio::test]
    async fn test_unfilled_order_never_times_out_on_chain() {
        let h = harness();
        let wallet = MockWallet::new(1);
        let order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();

        // No escrow exists yet, so there is no deadline to enforce and no
        // step to take.
        h.chain.set_time(START + 10_000);
        assert!(drive_once(&h, &wallet, &order).await.is_none());
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 100_000);
    }

    // =========================================================================
    // PERSISTENCE AND RESUME
    // =========================================================================

    #[tokio::test]
    async fn test_resume_from_persisted_state() {
        let h = harness();
        let wallet = MockWallet::new(1);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let id = order.id;
        drop(order);

        // "Crash": forget the in-memory order and reload from the store.
        let ids = h.store.list().unwrap();
        assert_eq!(ids, vec![id]);
        let recovered = h.store.load(&id).unwrap().unwrap();
        assert!(matches!(
            recovered.state,
            OrderState::CounterLegFunded { .. }
        ));

        let recovered = drive_once(&h, &wallet, &recovered).await.unwrap();
        h.chain.advance_time(10);
        let recovered = drive_once(&h, &wallet, &recovered).await.unwrap();
        assert!(matches!(recovered.state, OrderState::Completed { .. }));
    }

    #[tokio::test]
    async fn test_step_persists_every_transition() {
        let h = harness();
        let wallet = MockWallet::new(1);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();

        let mut current = order;
        for _ in 0..3 {
            current = drive_once(&h, &wallet, &current).await.unwrap();
            // The durable record always matches the in-memory state.
            let stored = h.store.load(&current.id).unwrap().unwrap();
            assert_eq!(stored.state, current.state);
        }
        assert!(matches!(current.state, OrderState::SecretRevealed { .. }));

        // The last transition waits for the withdrawal window to open.
        h.chain.advance_time(10);
        current = drive_once(&h, &wallet, &current).await.unwrap();
        let stored = h.store.load(&current.id).unwrap().unwrap();
        assert_eq!(stored.state, current.state);
        assert!(matches!(current.state, OrderState::Completed { .. }));
    }

    // =========================================================================
    // CRASH RECOVERY AND OUT-OF-BAND SETTLEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_funded_escrow_recovered_from_stale_filled_order() {
        let h = harness();
        let wallet = MockWallet::new(1);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();

        // First pass funds the escrow; replaying the stale `Filled` record
        // simulates a driver that crashed between the deposit and the save.
        let advanced = drive_once(&h, &wallet, &order).await.unwrap();
        let replayed = drive_once(&h, &wallet, &order).await.unwrap();
        assert_eq!(replayed.state, advanced.state);
        // No second deposit happened.
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 98_950);
        assert_eq!(h.ledger.balance(&VAULT, &Asset::Native), 1_050);
        assert_eq!(
            h.chain.swap_stage(&replayed.hashlock).await.unwrap(),
            SwapStage::Pending
        );

        // The recovered order still runs to completion.
        let order = drive_once(&h, &wallet, &replayed).await.unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        h.chain.advance_time(10);
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::Completed { .. }));
    }

    #[tokio::test]
    async fn test_settle_records_out_of_band_withdrawal() {
        let h = harness();
        let wallet = MockWallet::new(1);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let (taker, deployed_at) = match &order.state {
            OrderState::SecretRevealed {
                taker, deployed_at, ..
            } => (*taker, *deployed_at),
            other => panic!("unexpected state {other:?}"),
        };

        // The taker claims the source leg themselves once the window opens.
        h.chain.advance_time(10);
        let imm = order.immutables(taker, deployed_at).unwrap();
        h.chain
            .vault()
            .withdraw(&TAKER, &order.secret().expose(), &imm, deployed_at + 10)
            .unwrap();
        let taker_balance = h.ledger.balance(&TAKER, &Asset::Native);

        // The driver observes the settled escrow and records completion
        // without a second withdrawal.
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::Completed { .. }));
        assert_eq!(h.ledger.balance(&TAKER, &Asset::Native), taker_balance);
    }

    #[tokio::test]
    async fn test_refund_records_out_of_band_cancellation() {
        let h = harness();
        let wallet = MockWallet::new(u64::MAX);
        let mut order = create_order(terms(), &h.store, &NoopMetrics, START).unwrap();
        fill_order(&mut order, TAKER, &h.store, &NoopMetrics).unwrap();
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        let (taker, deployed_at) = match &order.state {
            OrderState::EscrowCreated {
                taker, deployed_at, ..
            } => (*taker, *deployed_at),
            other => panic!("unexpected state {other:?}"),
        };

        // The maker unwinds on chain directly after the deadline.
        h.chain.set_time(START + 100);
        let imm = order.immutables(taker, deployed_at).unwrap();
        h.chain.vault().cancel(&MAKER, &imm, START + 100).unwrap();
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 100_000);

        // The driver finds the escrow already cancelled and just records
        // the refund.
        let order = drive_once(&h, &wallet, &order).await.unwrap();
        assert!(matches!(order.state, OrderState::Refunded { .. }));
        assert_eq!(h.ledger.balance(&MAKER, &Asset::Native), 100_000);
    }
}
