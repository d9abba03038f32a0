//! # Escrow Lifecycle Tests
//!
//! Drives the factory, vault and adapter through the four swap outcomes,
//! with one full escrow stack per ledger (the two legs of a swap live on
//! different chains and share only the hashlock):
//!
//! 1. **Cooperative settlement**: both legs fund, secret disclosed, both claim
//! 2. **Timeout refund**: nothing settles, both legs cancel
//! 3. **Late reveal**: secret disclosed late, a watcher settles the source
//!    leg through the public window
//! 4. **Unsafe schedule**: a descriptor whose revealing leg cancels last is
//!    rejected before any instantiation

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sha2::{Digest, Sha256};
    use veil_escrow::{
        Asset, AssetLedger, EscrowError, EscrowEvent, EscrowFactory, EscrowState, EscrowVault,
        EventLog, Hash, Immutables, InMemoryLedger, InMemorySwapRegistry, Leg, LegSchedule, Secret,
        SwapAdapter, SwapStage, TimelockOffsets, Timelocks,
    };

    const VAULT: [u8; 20] = [0xEEu8; 20];
    const ADAPTER: [u8; 20] = [0xAAu8; 20];
    const MAKER: [u8; 20] = [1u8; 20];
    const TAKER: [u8; 20] = [2u8; 20];
    const WATCHER: [u8; 20] = [3u8; 20];

    const SECRET: Secret = [0x42u8; 32];
    const REFUND_SECRET: Secret = [0x43u8; 32];
    const ANCHOR: u64 = 10_000;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// One ledger's escrow stack.
    struct Stack {
        vault: EscrowVault,
        ledger: Arc<InMemoryLedger>,
        events: Arc<EventLog>,
    }

    fn stack() -> Stack {
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
        let vault = EscrowVault::new(factory, adapter, ledger.clone(), VAULT, events.clone());
        ledger.mint(&MAKER, &Asset::Native, 100_000);
        ledger.mint(&TAKER, &Asset::Native, 100_000);
        Stack {
            vault,
            ledger,
            events,
        }
    }

    /// Both chains of one swap: maker escrows on `src`, taker on `dst`.
    struct World {
        src: Stack,
        dst: Stack,
    }

    fn world() -> World {
        World {
            src: stack(),
            dst: stack(),
        }
    }

    fn offsets() -> TimelockOffsets {
        TimelockOffsets {
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
        }
    }

    /// Descriptors for both legs of one swap, sharing a hashlock.
    fn swap_descriptors() -> (Immutables, Immutables) {
        let hashlock: Hash = Sha256::digest(SECRET).into();
        let timelocks = Timelocks::new(ANCHOR, offsets()).unwrap();
        let src = Immutables {
            order_hash: [7u8; 32],
            hashlock,
            maker: MAKER,
            taker: TAKER,
            asset: Asset::Native,
            amount: 1_000,
            safety_deposit: 50,
            timelocks,
        };
        let dst = Immutables {
            amount: 900,
            ..src.clone()
        };
        (src, dst)
    }

    fn refund_commitment() -> Hash {
        Sha256::digest(REFUND_SECRET).into()
    }

    fn fund_both_legs(world: &World, src: &Immutables, dst: &Immutables) {
        world
            .src
            .vault
            .factory()
            .create_escrow(src.clone(), Leg::Source)
            .unwrap();
        world
            .src
            .vault
            .deposit(&MAKER, &src.hashlock, &refund_commitment(), src, ANCHOR)
            .unwrap();
        world
            .dst
            .vault
            .factory()
            .create_escrow(dst.clone(), Leg::Destination)
            .unwrap();
        world
            .dst
            .vault
            .deposit(&TAKER, &dst.hashlock, &refund_commitment(), dst, ANCHOR)
            .unwrap();
    }

    // =========================================================================
    // SCENARIO 1: COOPERATIVE SETTLEMENT
    // =========================================================================

    #[test]
    fn test_cooperative_swap_settles_both_legs() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        // Maker claims the destination leg first, disclosing the secret.
        let now = ANCHOR + 10;
        world.dst.vault.withdraw(&MAKER, &SECRET, &dst, now).unwrap();
        // Taker replays the disclosed secret on the source leg.
        world
            .src
            .vault
            .withdraw(&TAKER, &SECRET, &src, now + 1)
            .unwrap();

        // Principals crossed; every safety deposit went home.
        assert_eq!(world.src.ledger.balance(&MAKER, &Asset::Native), 99_000);
        assert_eq!(world.src.ledger.balance(&TAKER, &Asset::Native), 101_000);
        assert_eq!(world.dst.ledger.balance(&MAKER, &Asset::Native), 100_900);
        assert_eq!(world.dst.ledger.balance(&TAKER, &Asset::Native), 99_100);
        assert_eq!(world.src.ledger.balance(&VAULT, &Asset::Native), 0);
        assert_eq!(world.dst.ledger.balance(&VAULT, &Asset::Native), 0);

        let src_state = world
            .src
            .vault
            .factory()
            .get(&EscrowFactory::address_of(&src))
            .unwrap()
            .state;
        assert_eq!(src_state, EscrowState::Withdrawn);
    }

    #[test]
    fn test_wrong_secret_settles_nothing() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        let bogus: Secret = [0x66u8; 32];
        assert!(matches!(
            world.dst.vault.withdraw(&MAKER, &bogus, &dst, ANCHOR + 10),
            Err(EscrowError::InvalidSecret)
        ));
        // Both legs remain funded and claimable.
        assert_eq!(world.src.ledger.balance(&VAULT, &Asset::Native), 1_050);
        assert_eq!(world.dst.ledger.balance(&VAULT, &Asset::Native), 950);
        world
            .dst
            .vault
            .withdraw(&MAKER, &SECRET, &dst, ANCHOR + 11)
            .unwrap();
    }

    // =========================================================================
    // SCENARIO 2: TIMEOUT REFUND
    // =========================================================================

    #[test]
    fn test_timeout_refunds_both_legs() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        // The destination (revealing) leg cancels first by construction.
        world.dst.vault.cancel(&TAKER, &dst, ANCHOR + 60).unwrap();
        world.src.vault.cancel(&MAKER, &src, ANCHOR + 100).unwrap();

        for stack in [&world.src, &world.dst] {
            assert_eq!(stack.ledger.balance(&MAKER, &Asset::Native), 100_000);
            assert_eq!(stack.ledger.balance(&TAKER, &Asset::Native), 100_000);
            assert_eq!(stack.ledger.balance(&VAULT, &Asset::Native), 0);
        }
    }

    #[test]
    fn test_source_leg_outlives_destination_leg() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        // At the destination cancellation instant the source leg is still
        // claimable: the taker always has a reaction window.
        let now = ANCHOR + 60;
        assert!(matches!(
            world.src.vault.cancel(&MAKER, &src, now),
            Err(EscrowError::InvalidTime { .. })
        ));
        world.src.vault.withdraw(&TAKER, &SECRET, &src, now).unwrap();
    }

    #[test]
    fn test_withdraw_after_cancellation_rejected() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        world.src.vault.cancel(&MAKER, &src, ANCHOR + 100).unwrap();
        assert!(matches!(
            world.src.vault.withdraw(&TAKER, &SECRET, &src, ANCHOR + 101),
            Err(EscrowError::InvalidTransition { .. })
        ));
        // The destination leg is unaffected by the source-leg cancellation.
        world.dst.vault.cancel(&TAKER, &dst, ANCHOR + 101).unwrap();
    }

    // =========================================================================
    // SCENARIO 3: LATE REVEAL / PUBLIC WITHDRAWAL
    // =========================================================================

    #[test]
    fn test_watcher_settles_source_leg_in_public_window() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);
        world.src.vault.add_public_withdrawer(WATCHER);

        // Secret came out late; a third-party watcher completes the source
        // leg for the inattentive taker.
        world
            .dst
            .vault
            .withdraw(&MAKER, &SECRET, &dst, ANCHOR + 10)
            .unwrap();
        world
            .src
            .vault
            .public_withdraw(&WATCHER, &SECRET, &src, ANCHOR + 30)
            .unwrap();

        // Principal still lands with the taker, not the watcher.
        assert_eq!(world.src.ledger.balance(&TAKER, &Asset::Native), 101_000);
        assert_eq!(world.src.ledger.balance(&WATCHER, &Asset::Native), 0);
    }

    #[test]
    fn test_public_window_rejects_uncredentialed_caller() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        assert!(matches!(
            world
                .src
                .vault
                .public_withdraw(&WATCHER, &SECRET, &src, ANCHOR + 30),
            Err(EscrowError::InvalidCaller)
        ));
    }

    // =========================================================================
    // SCENARIO 4: UNSAFE SCHEDULE REJECTED
    // =========================================================================

    #[test]
    fn test_revealing_leg_cancelling_last_is_rejected() {
        let mut unsafe_offsets = offsets();
        unsafe_offsets.dst.cancellation = 100; // ties the source leg
        assert!(matches!(
            Timelocks::new(ANCHOR, unsafe_offsets),
            Err(EscrowError::TimelockOrdering(_))
        ));

        unsafe_offsets.dst.cancellation = 150; // outlives the source leg
        assert!(Timelocks::new(ANCHOR, unsafe_offsets).is_err());
    }

    #[test]
    fn test_factory_refuses_unvalidated_descriptor() {
        let world = world();
        let (mut src, _) = swap_descriptors();
        // Deserialized descriptors bypass `Timelocks::new`; the factory
        // re-checks the ordering before instantiating.
        src.timelocks.offsets.dst.cancellation = 200;
        assert!(matches!(
            world.src.vault.factory().create_escrow(src, Leg::Source),
            Err(EscrowError::TimelockOrdering(_))
        ));
    }

    // =========================================================================
    // DETERMINISTIC INSTANTIATION AND ADAPTER MAPPING
    // =========================================================================

    #[test]
    fn test_identity_is_stable_across_parties() {
        let (src, _) = swap_descriptors();
        let predicted = EscrowFactory::address_of(&src);
        let world = world();
        let identity = world
            .src
            .vault
            .factory()
            .create_escrow(src.clone(), Leg::Source)
            .unwrap();
        assert_eq!(identity, predicted);
        // Any party re-derives the same identity from an equal descriptor.
        assert_eq!(EscrowFactory::address_of(&src), predicted);
    }

    #[test]
    fn test_duplicate_hashlock_on_one_ledger_rejected() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        // A second descriptor reusing the hashlock on the same ledger gets
        // past the factory (different identity) but not the adapter.
        let mut second = src.clone();
        second.amount = 2_000;
        world
            .src
            .vault
            .factory()
            .create_escrow(second.clone(), Leg::Source)
            .unwrap();
        assert!(matches!(
            world
                .src
                .vault
                .deposit(&MAKER, &second.hashlock, &refund_commitment(), &second, ANCHOR),
            Err(EscrowError::HashlockInUse(_))
        ));
    }

    #[test]
    fn test_adapter_mapping_survives_lifecycle() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        let adapter = world.src.vault.adapter();
        let id_before = adapter.swap_id_for(&src.hashlock).unwrap();
        world
            .dst
            .vault
            .withdraw(&MAKER, &SECRET, &dst, ANCHOR + 10)
            .unwrap();
        world
            .src
            .vault
            .withdraw(&TAKER, &SECRET, &src, ANCHOR + 11)
            .unwrap();
        // Completion never rebinds the hashlock.
        assert_eq!(adapter.swap_id_for(&src.hashlock).unwrap(), id_before);
        assert_eq!(adapter.get_swap_status(&src.hashlock), SwapStage::Completed);
    }

    #[test]
    fn test_event_log_records_full_history() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);
        world
            .dst
            .vault
            .withdraw(&MAKER, &SECRET, &dst, ANCHOR + 10)
            .unwrap();
        world
            .src
            .vault
            .withdraw(&TAKER, &SECRET, &src, ANCHOR + 11)
            .unwrap();

        for stack in [&world.src, &world.dst] {
            assert_eq!(stack.events.escrow_events().len(), 2); // deposit + withdrawal
            assert_eq!(stack.events.adapter_events().len(), 2); // create + claim
        }
    }

    #[test]
    fn test_withdrawal_event_discloses_secret() {
        let world = world();
        let (src, dst) = swap_descriptors();
        fund_both_legs(&world, &src, &dst);

        world
            .dst
            .vault
            .withdraw(&MAKER, &SECRET, &dst, ANCHOR + 10)
            .unwrap();

        // The taker need never be told the secret out of band: the maker's
        // withdrawal event on the destination chain carries the preimage.
        let observed = world
            .dst
            .events
            .escrow_events()
            .iter()
            .find_map(|event| match event {
                EscrowEvent::EscrowWithdrawal { secret, .. } => Some(*secret),
                _ => None,
            })
            .unwrap();
        assert_eq!(observed, SECRET);
        world
            .src
            .vault
            .withdraw(&TAKER, &observed, &src, ANCHOR + 11)
            .unwrap();
        assert_eq!(world.src.ledger.balance(&TAKER, &Asset::Native), 101_000);
    }
}
