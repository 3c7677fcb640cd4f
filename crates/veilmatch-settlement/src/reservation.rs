//! Shadow reservations for proposals awaiting ledger acknowledgement.
//!
//! A reservation tentatively spends order quantity without touching the
//! persisted `filled` counters: scans subtract it, commits consume it,
//! nacks and timeouts hand it back. The book also enforces one in-flight
//! proposal per `(buy, sell)` pair.

use std::collections::HashMap;

use veilmatch_types::{OrderId, SettlementProposal};

/// Where an in-flight settlement stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    /// Re-validated and reserved; not yet handed to the ledger.
    Reserved,
    /// Submitted; waiting for the ledger's ack, nack, or a timeout.
    AwaitingAck,
}

/// One proposal in flight, with its reservation metadata.
#[derive(Debug, Clone)]
pub struct PendingSettlement {
    pub proposal: SettlementProposal,
    pub state: SettlementState,
    /// Which retry attempt produced this proposal.
    pub attempt: u32,
    /// When the proposal was submitted (milliseconds).
    pub submitted_at: u64,
}

/// The engine's shadow bookkeeping structure.
#[derive(Debug, Default)]
pub struct ReservationBook {
    /// Quantity reserved per order across all its in-flight proposals.
    reserved: HashMap<OrderId, u64>,
    /// In-flight settlements keyed by `(buy_id, sell_id)`.
    pending: HashMap<(OrderId, OrderId), PendingSettlement>,
}

impl ReservationBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity of an order currently promised to in-flight proposals.
    #[must_use]
    pub fn reserved_qty(&self, id: &OrderId) -> u64 {
        self.reserved.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_pending(&self, key: &(OrderId, OrderId)) -> bool {
        self.pending.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &(OrderId, OrderId)) -> Option<&PendingSettlement> {
        self.pending.get(key)
    }

    pub fn get_mut(&mut self, key: &(OrderId, OrderId)) -> Option<&mut PendingSettlement> {
        self.pending.get_mut(key)
    }

    /// Reserve the proposal's fill quantity on both legs.
    ///
    /// The caller must have checked `has_pending` first; a second
    /// reservation for the same key replaces nothing and is a logic error.
    pub fn reserve(&mut self, pending: PendingSettlement) {
        let key = (pending.proposal.buy_id, pending.proposal.sell_id);
        debug_assert!(!self.pending.contains_key(&key));
        let qty = pending.proposal.fill_qty;
        *self.reserved.entry(key.0).or_insert(0) += qty;
        *self.reserved.entry(key.1).or_insert(0) += qty;
        self.pending.insert(key, pending);
    }

    /// Undo a reservation, returning the pending settlement if one existed.
    pub fn release(&mut self, key: &(OrderId, OrderId)) -> Option<PendingSettlement> {
        let pending = self.pending.remove(key)?;
        let qty = pending.proposal.fill_qty;
        for id in [key.0, key.1] {
            if let Some(r) = self.reserved.get_mut(&id) {
                *r = r.saturating_sub(qty);
                if *r == 0 {
                    self.reserved.remove(&id);
                }
            }
        }
        Some(pending)
    }

    /// Release every pending settlement one order participates in.
    pub fn evict_order(&mut self, id: &OrderId) -> Vec<PendingSettlement> {
        let keys: Vec<(OrderId, OrderId)> = self
            .pending
            .keys()
            .filter(|(b, s)| b == id || s == id)
            .copied()
            .collect();
        keys.iter().filter_map(|k| self.release(k)).collect()
    }

    /// Keys of settlements submitted at or before `cutoff`.
    #[must_use]
    pub fn expired_keys(&self, cutoff: u64) -> Vec<(OrderId, OrderId)> {
        let mut keys: Vec<(OrderId, OrderId)> = self
            .pending
            .iter()
            .filter(|(_, p)| {
                p.state == SettlementState::AwaitingAck && p.submitted_at <= cutoff
            })
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use veilmatch_types::{Order, Side};

    use super::*;

    fn pending(buy: u64, sell: u64, qty: u64, submitted_at: u64) -> PendingSettlement {
        let b = Order::dummy(buy, buy, Side::Buy, 1490, 1510, 150_000, qty);
        let s = Order::dummy(sell, sell, Side::Sell, 1495, 1505, 149_500, qty);
        let proposal =
            SettlementProposal::build(&b, &s, qty, 149_750, 5, 0, submitted_at).unwrap();
        PendingSettlement {
            proposal,
            state: SettlementState::AwaitingAck,
            attempt: 0,
            submitted_at,
        }
    }

    #[test]
    fn reserve_counts_both_legs() {
        let mut book = ReservationBook::new();
        book.reserve(pending(1, 2, 400, 10));

        assert_eq!(book.reserved_qty(&OrderId::from_low(1)), 400);
        assert_eq!(book.reserved_qty(&OrderId::from_low(2)), 400);
        assert!(book.has_pending(&(OrderId::from_low(1), OrderId::from_low(2))));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn release_hands_back_both_legs() {
        let mut book = ReservationBook::new();
        book.reserve(pending(1, 2, 400, 10));

        let released = book
            .release(&(OrderId::from_low(1), OrderId::from_low(2)))
            .unwrap();
        assert_eq!(released.proposal.fill_qty, 400);
        assert_eq!(book.reserved_qty(&OrderId::from_low(1)), 0);
        assert_eq!(book.reserved_qty(&OrderId::from_low(2)), 0);
        assert!(book.is_empty());
    }

    #[test]
    fn release_of_unknown_key_is_none() {
        let mut book = ReservationBook::new();
        assert!(book
            .release(&(OrderId::from_low(1), OrderId::from_low(2)))
            .is_none());
    }

    #[test]
    fn reservations_accumulate_across_counterparties() {
        let mut book = ReservationBook::new();
        // Order 1 buys from two different sellers.
        book.reserve(pending(1, 2, 300, 10));
        book.reserve(pending(1, 3, 200, 11));

        assert_eq!(book.reserved_qty(&OrderId::from_low(1)), 500);
        book.release(&(OrderId::from_low(1), OrderId::from_low(2)));
        assert_eq!(book.reserved_qty(&OrderId::from_low(1)), 200);
    }

    #[test]
    fn evict_order_releases_every_involvement() {
        let mut book = ReservationBook::new();
        book.reserve(pending(1, 2, 300, 10));
        book.reserve(pending(1, 3, 200, 11));
        book.reserve(pending(4, 5, 100, 12));

        let evicted = book.evict_order(&OrderId::from_low(1));
        assert_eq!(evicted.len(), 2);
        assert_eq!(book.reserved_qty(&OrderId::from_low(1)), 0);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn expired_keys_respect_cutoff_and_state() {
        let mut book = ReservationBook::new();
        book.reserve(pending(1, 2, 300, 10));
        book.reserve(pending(3, 4, 200, 50));
        let mut still_reserved = pending(5, 6, 100, 5);
        still_reserved.state = SettlementState::Reserved;
        book.reserve(still_reserved);

        let expired = book.expired_keys(20);
        assert_eq!(expired, vec![(OrderId::from_low(1), OrderId::from_low(2))]);
    }
}
