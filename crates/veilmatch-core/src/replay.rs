//! Startup bootstrap from the ledger's event stream.
//!
//! The core persists nothing. A host restarts it by reading its stored
//! sequence cursor, replaying `event_stream()` from that point, and storing
//! the cursor back after each fully-applied event. Duplicate deliveries are
//! absorbed by the facade's idempotency window, so an at-least-once stream
//! is safe to replay.

use veilmatch_types::{LedgerEvent, Result};

use veilmatch_settlement::Ledger;

use crate::clock::Clock;
use crate::facade::CoreFacade;

impl<L: Ledger, C: Clock> CoreFacade<L, C> {
    /// Apply a batch of `(sequence, event)` pairs in stream order, returning
    /// the advanced cursor.
    ///
    /// # Errors
    /// Stops at the first event that fails to apply; everything before it is
    /// applied and reflected in the cursor.
    pub fn replay<I>(&mut self, events: I) -> Result<u64>
    where
        I: IntoIterator<Item = (u64, LedgerEvent)>,
    {
        for (sequence, event) in events {
            self.apply_ledger_event(sequence, &event)?;
        }
        Ok(self.cursor())
    }
}

#[cfg(test)]
mod tests {
    use veilmatch_types::{
        CoreConfig, LedgerEvent, OrderId, OwnerId, PairId, Side, TokenId,
    };

    use veilmatch_settlement::RecordingLedger;

    use crate::clock::ManualClock;

    use super::*;

    fn core() -> CoreFacade<RecordingLedger, ManualClock> {
        CoreFacade::new(
            CoreConfig::default(),
            RecordingLedger::new(),
            ManualClock::new(1_000),
        )
    }

    fn registered_pair() -> LedgerEvent {
        LedgerEvent::PairRegistered {
            pair_id: PairId(1),
            base_token_id: TokenId(10),
            quote_token_id: TokenId(20),
            tick_size: 100,
            max_tick_range: 50,
        }
    }

    fn observed_order(id: u64, owner: u64, side: Side, qty: u64) -> LedgerEvent {
        let (lo, hi, price) = match side {
            Side::Buy => (1490, 1510, 150_000),
            Side::Sell => (1495, 1505, 149_500),
        };
        let escrow_amount = match side {
            Side::Buy => qty * price / 10_000,
            Side::Sell => qty,
        };
        LedgerEvent::OrderObserved {
            order_id: OrderId::from_low(id),
            owner: OwnerId::from_low(owner),
            pair_id: PairId(1),
            side,
            tick_lower: lo,
            tick_upper: hi,
            limit_price: price,
            quantity: qty,
            escrow_amount,
            created_at: id,
        }
    }

    #[test]
    fn replay_rebuilds_working_set() {
        let mut core = core();
        let cursor = core
            .replay(vec![
                (1, registered_pair()),
                (2, observed_order(1, 1, Side::Buy, 1000)),
                (3, observed_order(2, 2, Side::Sell, 400)),
            ])
            .unwrap();

        assert_eq!(cursor, 3);
        assert_eq!(core.open_orders(), 2);
        assert!(core.pair(PairId(1)).is_some());
        assert_eq!(
            core.escrow_committed(OwnerId::from_low(1), TokenId(20)),
            15_000
        );
        assert_eq!(core.escrow_committed(OwnerId::from_low(2), TokenId(10)), 400);
        core.check_invariants().unwrap();

        // The rebuilt index matches: a scan finds the cross immediately.
        let proposals = core.scan_and_match(PairId(1), 8).unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].fill_qty, 400);
    }

    #[test]
    fn replay_includes_committed_settlements() {
        let mut core = core();
        core.replay(vec![
            (1, registered_pair()),
            (2, observed_order(1, 1, Side::Buy, 1000)),
            (3, observed_order(2, 2, Side::Sell, 400)),
            (
                4,
                LedgerEvent::SettlementCommitted {
                    buy_id: OrderId::from_low(1),
                    sell_id: OrderId::from_low(2),
                    fill_qty: 400,
                    exec_price: 149_750,
                    block_height: 77,
                },
            ),
        ])
        .unwrap();

        let buy = core.order(&OrderId::from_low(1)).unwrap();
        assert_eq!(buy.filled, 400);
        // The fully-filled sell was retired during replay.
        assert!(core.order(&OrderId::from_low(2)).is_none());
        core.check_invariants().unwrap();
    }

    #[test]
    fn replaying_the_same_stream_twice_is_idempotent() {
        let stream = vec![
            (1, registered_pair()),
            (2, observed_order(1, 1, Side::Buy, 1000)),
            (3, observed_order(2, 2, Side::Sell, 400)),
        ];

        let mut core = core();
        core.replay(stream.clone()).unwrap();
        let cursor = core.replay(stream).unwrap();

        assert_eq!(cursor, 3);
        assert_eq!(core.open_orders(), 2);
        assert_eq!(
            core.escrow_committed(OwnerId::from_low(1), TokenId(20)),
            15_000,
            "duplicate replay must not double-book escrow"
        );
        core.check_invariants().unwrap();
    }

    #[test]
    fn conflicting_sequence_is_fatal() {
        let mut core = core();
        core.replay(vec![(1, registered_pair())]).unwrap();

        let err = core
            .apply_ledger_event(1, &observed_order(1, 1, Side::Buy, 1000))
            .unwrap_err();
        assert!(matches!(
            err,
            veilmatch_types::CoreError::DuplicateLedgerEvent { sequence: 1 }
        ));
        assert!(core.is_halted());
    }

    #[test]
    fn failed_event_does_not_advance_cursor() {
        let mut core = core();
        // Order observed before its pair: fails, cursor stays put.
        let err = core.replay(vec![(5, observed_order(1, 1, Side::Buy, 1000))]);
        assert!(err.is_err());
        assert_eq!(core.cursor(), 0);

        // The same sequence can be replayed once the pair exists.
        core.apply_ledger_event(4, &registered_pair()).unwrap();
        core.apply_ledger_event(5, &observed_order(1, 1, Side::Buy, 1000))
            .unwrap();
        assert_eq!(core.cursor(), 5);
        assert_eq!(core.open_orders(), 1);
    }
}
