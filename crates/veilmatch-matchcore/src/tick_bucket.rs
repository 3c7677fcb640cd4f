//! A single price-lattice bucket: the orders of one `(pair, tick)` cell.
//!
//! Each side is an ordered set keyed `(created_at, order_id)` — ascending
//! submission time, ties broken by id — so bucket iteration yields time
//! priority directly. Counters are derived from set sizes, never tracked
//! separately.

use std::collections::BTreeSet;

use veilmatch_types::{OrderId, Side};

/// Buy and sell occupants of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickBucket {
    buys: BTreeSet<(u64, OrderId)>,
    sells: BTreeSet<(u64, OrderId)>,
}

impl TickBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn side_set(&self, side: Side) -> &BTreeSet<(u64, OrderId)> {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    fn side_set_mut(&mut self, side: Side) -> &mut BTreeSet<(u64, OrderId)> {
        match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        }
    }

    /// Returns `false` if the entry was already present.
    pub fn insert(&mut self, side: Side, created_at: u64, id: OrderId) -> bool {
        self.side_set_mut(side).insert((created_at, id))
    }

    /// Returns `false` if the entry was absent.
    pub fn remove(&mut self, side: Side, created_at: u64, id: OrderId) -> bool {
        self.side_set_mut(side).remove(&(created_at, id))
    }

    #[must_use]
    pub fn contains(&self, side: Side, created_at: u64, id: OrderId) -> bool {
        self.side_set(side).contains(&(created_at, id))
    }

    #[must_use]
    pub fn buy_count(&self) -> usize {
        self.buys.len()
    }

    #[must_use]
    pub fn sell_count(&self) -> usize {
        self.sells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }

    /// Both sides populated — the precondition for crossing inside a bucket.
    #[must_use]
    pub fn has_both_sides(&self) -> bool {
        !self.buys.is_empty() && !self.sells.is_empty()
    }

    /// Buy order ids in ascending `(created_at, order_id)` order.
    pub fn buys(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.buys.iter().map(|(_, id)| *id)
    }

    /// Sell order ids in ascending `(created_at, order_id)` order.
    pub fn sells(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.sells.iter().map(|(_, id)| *id)
    }

    /// Entries for one side, with their timestamps.
    pub fn side_entries(&self, side: Side) -> impl Iterator<Item = (u64, OrderId)> + '_ {
        self.side_set(side).iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_counts() {
        let mut b = TickBucket::new();
        assert!(b.insert(Side::Buy, 1, OrderId::from_low(1)));
        assert!(b.insert(Side::Sell, 2, OrderId::from_low(2)));
        assert_eq!(b.buy_count(), 1);
        assert_eq!(b.sell_count(), 1);
        assert!(b.has_both_sides());
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut b = TickBucket::new();
        assert!(b.insert(Side::Buy, 1, OrderId::from_low(1)));
        assert!(!b.insert(Side::Buy, 1, OrderId::from_low(1)));
        assert_eq!(b.buy_count(), 1);
    }

    #[test]
    fn remove_prunes_to_empty() {
        let mut b = TickBucket::new();
        b.insert(Side::Buy, 1, OrderId::from_low(1));
        assert!(b.remove(Side::Buy, 1, OrderId::from_low(1)));
        assert!(b.is_empty());
        assert!(!b.remove(Side::Buy, 1, OrderId::from_low(1)));
    }

    #[test]
    fn iteration_is_time_ordered_with_id_tiebreak() {
        let mut b = TickBucket::new();
        b.insert(Side::Buy, 5, OrderId::from_low(9));
        b.insert(Side::Buy, 3, OrderId::from_low(7));
        b.insert(Side::Buy, 5, OrderId::from_low(2));

        let ids: Vec<OrderId> = b.buys().collect();
        assert_eq!(
            ids,
            vec![
                OrderId::from_low(7),
                OrderId::from_low(2),
                OrderId::from_low(9)
            ]
        );
    }
}
