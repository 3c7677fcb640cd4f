//! Order lifecycle, round-trip laws, and failure handling on the facade.

use veilmatch_core::{CoreFacade, ManualClock, SubmitOrder};
use veilmatch_settlement::RecordingLedger;
use veilmatch_types::{
    CoreError, LedgerEvent, Order, OrderId, OwnerId, PairId, Side, Tick, TokenId,
};

const BASE: TokenId = TokenId(10);
const QUOTE: TokenId = TokenId(20);

fn core() -> CoreFacade<RecordingLedger, ManualClock> {
    let mut core = CoreFacade::new(
        veilmatch_types::CoreConfig::default(),
        RecordingLedger::new(),
        ManualClock::new(1_000),
    );
    core.apply_ledger_event(
        1,
        &LedgerEvent::PairRegistered {
            pair_id: PairId(1),
            base_token_id: BASE,
            quote_token_id: QUOTE,
            tick_size: 100,
            max_tick_range: 50,
        },
    )
    .unwrap();
    core
}

fn cmd(
    id: u64,
    owner: u64,
    side: Side,
    lo: Tick,
    hi: Tick,
    price: u64,
    qty: u64,
) -> SubmitOrder {
    SubmitOrder {
        order_id: OrderId::from_low(id),
        owner: OwnerId::from_low(owner),
        pair_id: PairId(1),
        side,
        tick_lower: lo,
        tick_upper: hi,
        limit_price: price,
        quantity: qty,
        escrow_amount: Order::required_escrow(side, price, qty).unwrap(),
    }
}

fn buy_cmd(id: u64, owner: u64) -> SubmitOrder {
    cmd(id, owner, Side::Buy, 1490, 1510, 150_000, 1000)
}

// =====================================================================
// Round-trip laws
// =====================================================================

#[test]
fn submit_then_cancel_restores_pre_submit_state() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 15_000);

    core.cancel(OrderId::from_low(1), OwnerId::from_low(1)).unwrap();

    assert_eq!(core.open_orders(), 0);
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
    assert!(core.order(&OrderId::from_low(1)).is_none());
    assert!(core.scan_and_match(PairId(1), 8).unwrap().is_empty());
    core.check_invariants().unwrap();

    // The id is free again, exactly as before the first submit.
    core.submit(buy_cmd(1, 1)).unwrap();
}

#[test]
fn update_with_identical_params_is_a_noop() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    let before = core.order(&OrderId::from_low(1)).unwrap().clone();

    core.update(OrderId::from_low(1), OwnerId::from_low(1), 1490, 1510, 150_000, 1000)
        .unwrap();

    let after = core.order(&OrderId::from_low(1)).unwrap();
    assert_eq!(&before, after, "identical update must not disturb the order");
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 15_000);
    core.check_invariants().unwrap();
}

#[test]
fn update_recomputes_escrow_in_both_directions() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();

    // Growing quantity commits the delta.
    core.update(OrderId::from_low(1), OwnerId::from_low(1), 1490, 1510, 150_000, 2000)
        .unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 30_000);

    // Lowering the price releases it.
    core.update(OrderId::from_low(1), OwnerId::from_low(1), 1490, 1510, 149_000, 2000)
        .unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 29_800);
    core.check_invariants().unwrap();
}

#[test]
fn update_moves_the_tick_range() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    core.submit(cmd(2, 2, Side::Sell, 1515, 1525, 151_600, 1000))
        .unwrap();

    // Disjoint ranges: no cross yet.
    assert!(core.scan_and_match(PairId(1), 8).unwrap().is_empty());

    // Move the buy up into the sell's territory.
    core.update(OrderId::from_low(1), OwnerId::from_low(1), 1515, 1525, 152_000, 1000)
        .unwrap();
    core.check_invariants().unwrap();

    let proposals = core.scan_and_match(PairId(1), 8).unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].exec_price, (152_000 + 151_600) / 2);
}

#[test]
fn update_shrinking_to_filled_volume_retires_the_order() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    core.submit(cmd(2, 2, Side::Sell, 1495, 1505, 149_500, 400))
        .unwrap();
    core.scan_and_match(PairId(1), 8).unwrap();
    core.apply_ledger_event(
        2,
        &LedgerEvent::SettlementCommitted {
            buy_id: OrderId::from_low(1),
            sell_id: OrderId::from_low(2),
            fill_qty: 400,
            exec_price: 149_750,
            block_height: 7,
        },
    )
    .unwrap();

    // Shrink the buy to exactly its filled volume.
    core.update(OrderId::from_low(1), OwnerId::from_low(1), 1490, 1510, 150_000, 400)
        .unwrap();

    assert!(core.order(&OrderId::from_low(1)).is_none());
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
    assert_eq!(core.open_orders(), 0);
    core.check_invariants().unwrap();
}

// =====================================================================
// Input errors
// =====================================================================

#[test]
fn duplicate_submission_rejected() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    let err = core.submit(buy_cmd(1, 1)).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateOrder(_)));
}

#[test]
fn under_attested_escrow_rejected() {
    let mut core = core();
    let mut c = buy_cmd(1, 1);
    c.escrow_amount -= 1;
    let err = core.submit(c).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InsufficientEscrow {
            required: 15_000,
            attested: 14_999,
        }
    ));
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
}

#[test]
fn over_attested_escrow_is_booked_in_full() {
    let mut core = core();
    let mut c = buy_cmd(1, 1);
    c.escrow_amount += 500;
    core.submit(c).unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 15_500);
    core.check_invariants().unwrap();

    // Cancel returns the whole attested amount.
    core.cancel(OrderId::from_low(1), OwnerId::from_low(1)).unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
}

#[test]
fn submission_against_unknown_or_inactive_pair() {
    let mut core = core();
    let mut c = buy_cmd(1, 1);
    c.pair_id = PairId(9);
    assert!(matches!(
        core.submit(c).unwrap_err(),
        CoreError::PairNotFound(_)
    ));

    core.apply_ledger_event(2, &LedgerEvent::PairDeactivated { pair_id: PairId(1) })
        .unwrap();
    assert!(matches!(
        core.submit(buy_cmd(1, 1)).unwrap_err(),
        CoreError::PairInactive(_)
    ));

    core.apply_ledger_event(3, &LedgerEvent::PairReactivated { pair_id: PairId(1) })
        .unwrap();
    core.submit(buy_cmd(1, 1)).unwrap();
}

#[test]
fn cancel_requires_ownership_and_existence() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();

    assert!(matches!(
        core.cancel(OrderId::from_low(1), OwnerId::from_low(2)).unwrap_err(),
        CoreError::NotOwner(_)
    ));
    assert!(matches!(
        core.cancel(OrderId::from_low(9), OwnerId::from_low(1)).unwrap_err(),
        CoreError::UnknownOrder(_)
    ));
    // The failed attempts changed nothing.
    assert_eq!(core.open_orders(), 1);
    core.check_invariants().unwrap();
}

#[test]
fn cancel_works_on_a_deactivated_pair() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    core.apply_ledger_event(2, &LedgerEvent::PairDeactivated { pair_id: PairId(1) })
        .unwrap();

    core.cancel(OrderId::from_low(1), OwnerId::from_low(1)).unwrap();
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
}

#[test]
fn created_at_is_monotonic_even_if_the_clock_jumps_back() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    let first = core.order(&OrderId::from_low(1)).unwrap().created_at;

    core.clock().set(10); // wall clock regressed
    core.submit(buy_cmd(2, 2)).unwrap();
    let second = core.order(&OrderId::from_low(2)).unwrap().created_at;
    assert!(second >= first);
}

// =====================================================================
// Cancellation vs in-flight proposals
// =====================================================================

#[test]
fn cancel_evicts_inflight_proposal() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    core.submit(cmd(2, 2, Side::Sell, 1495, 1505, 149_500, 400))
        .unwrap();
    core.scan_and_match(PairId(1), 8).unwrap();
    assert_eq!(core.reserved_for(&OrderId::from_low(1)), 400);

    core.cancel(OrderId::from_low(1), OwnerId::from_low(1)).unwrap();

    assert_eq!(core.reserved_for(&OrderId::from_low(1)), 0);
    assert_eq!(core.reserved_for(&OrderId::from_low(2)), 0);
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);
    core.check_invariants().unwrap();

    // The ledger's eventual nack finds nothing to undo.
    core.apply_ledger_event(
        2,
        &LedgerEvent::SettlementRejected {
            buy_id: OrderId::from_low(1),
            sell_id: OrderId::from_low(2),
            reason: "order cancelled".into(),
        },
    )
    .unwrap();
    assert_eq!(core.order(&OrderId::from_low(2)).unwrap().filled, 0);
    core.check_invariants().unwrap();
}

// =====================================================================
// On-chain events
// =====================================================================

#[test]
fn on_chain_cancellation_is_applied_and_idempotent() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();

    let ev = LedgerEvent::OrderCancelledOnChain {
        order_id: OrderId::from_low(1),
    };
    core.apply_ledger_event(2, &ev).unwrap();
    assert!(core.order(&OrderId::from_low(1)).is_none());
    assert_eq!(core.escrow_committed(OwnerId::from_low(1), QUOTE), 0);

    // Same event replayed, and the same cancel under a fresh sequence.
    core.apply_ledger_event(2, &ev).unwrap();
    core.apply_ledger_event(3, &ev).unwrap();
    core.check_invariants().unwrap();
}

// =====================================================================
// Desync and the sticky halt
// =====================================================================

#[test]
fn escrow_desync_halts_until_supervisor_reset() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();

    // The ledger reports a different committed amount: fatal.
    let err = core
        .apply_ledger_event(
            2,
            &LedgerEvent::EscrowSync {
                owner: OwnerId::from_low(1),
                token_id: QUOTE,
                external_committed: 14_000,
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::EscrowDesync { .. }));
    assert!(core.is_halted());

    // Commands refuse; events keep flowing.
    assert!(matches!(
        core.submit(buy_cmd(5, 5)).unwrap_err(),
        CoreError::CoreHalted { .. }
    ));
    assert!(matches!(
        core.cancel(OrderId::from_low(1), OwnerId::from_low(1)).unwrap_err(),
        CoreError::CoreHalted { .. }
    ));
    assert!(matches!(
        core.scan_and_match(PairId(1), 8).unwrap_err(),
        CoreError::CoreHalted { .. }
    ));
    core.apply_ledger_event(3, &LedgerEvent::PairDeactivated { pair_id: PairId(1) })
        .unwrap();
    core.apply_ledger_event(4, &LedgerEvent::PairReactivated { pair_id: PairId(1) })
        .unwrap();

    // Supervisor adopts the corrected figure and the core resumes.
    core.reset_after_desync(OwnerId::from_low(1), QUOTE, 15_000);
    assert!(!core.is_halted());
    core.submit(buy_cmd(5, 5)).unwrap();
    core.check_invariants().unwrap();
}

#[test]
fn matching_escrow_sync_is_benign() {
    let mut core = core();
    core.submit(buy_cmd(1, 1)).unwrap();
    core.apply_ledger_event(
        2,
        &LedgerEvent::EscrowSync {
            owner: OwnerId::from_low(1),
            token_id: QUOTE,
            external_committed: 15_000,
        },
    )
    .unwrap();
    assert!(!core.is_halted());
    core.check_invariants().unwrap();
}
