//! The secondary index mapping `(pair, tick)` to tick buckets.
//!
//! A live order occupies **every** bucket in `[tick_lower, tick_upper)`.
//! That redundancy is what makes overlap queries cheap: visiting any bucket
//! that intersects a query range surfaces every order whose range touches it,
//! and a visited set collapses the duplicates.
//!
//! The index is a two-level structure, `PairId → BTreeMap<Tick, TickBucket>`;
//! the core never hashes pair and tick into a single key.

use std::collections::{BTreeSet, HashMap};

use veilmatch_types::{CoreError, Order, OrderId, PairId, Result, Side, Tick};

use crate::tick_bucket::TickBucket;

/// Two-level tick index over all pairs this core serves.
#[derive(Debug, Default)]
pub struct TickIndex {
    buckets: HashMap<PairId, std::collections::BTreeMap<Tick, TickBucket>>,
}

impl TickIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index an order under every tick of its declared range.
    ///
    /// # Errors
    /// Returns [`CoreError::IndexInvariantViolated`] if the order is already
    /// present in any of its buckets.
    pub fn insert_order(&mut self, order: &Order) -> Result<()> {
        let pair_buckets = self.buckets.entry(order.pair_id).or_default();
        for tick in order.ticks() {
            let bucket = pair_buckets.entry(tick).or_default();
            if !bucket.insert(order.side, order.created_at, order.id) {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("{} already indexed at tick {tick}", order.id),
                });
            }
        }
        Ok(())
    }

    /// Remove an order from every tick of its declared range, pruning
    /// buckets (and the pair entry) that become empty.
    ///
    /// # Errors
    /// Returns [`CoreError::IndexInvariantViolated`] if the order is missing
    /// from any bucket it should occupy.
    pub fn remove_order(&mut self, order: &Order) -> Result<()> {
        let pair_buckets =
            self.buckets
                .get_mut(&order.pair_id)
                .ok_or_else(|| CoreError::IndexInvariantViolated {
                    reason: format!("no buckets for {}", order.pair_id),
                })?;
        for tick in order.ticks() {
            let Some(bucket) = pair_buckets.get_mut(&tick) else {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("missing bucket {tick} for {}", order.id),
                });
            };
            if !bucket.remove(order.side, order.created_at, order.id) {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("{} not indexed at tick {tick}", order.id),
                });
            }
            if bucket.is_empty() {
                pair_buckets.remove(&tick);
            }
        }
        if pair_buckets.is_empty() {
            self.buckets.remove(&order.pair_id);
        }
        Ok(())
    }

    /// Non-empty buckets of a pair in ascending tick order.
    pub fn iter_buckets(&self, pair_id: PairId) -> impl Iterator<Item = (Tick, &TickBucket)> + '_ {
        self.buckets
            .get(&pair_id)
            .into_iter()
            .flat_map(|b| b.iter().map(|(t, bucket)| (*t, bucket)))
    }

    #[must_use]
    pub fn bucket(&self, pair_id: PairId, tick: Tick) -> Option<&TickBucket> {
        self.buckets.get(&pair_id)?.get(&tick)
    }

    /// Live orders of `side` whose tick range intersects `[tick_lower,
    /// tick_upper)`, each id yielded exactly once, in ascending
    /// `(created_at, order_id)` order.
    #[must_use]
    pub fn orders_overlapping(
        &self,
        pair_id: PairId,
        side: Side,
        tick_lower: Tick,
        tick_upper: Tick,
    ) -> Vec<OrderId> {
        let Some(pair_buckets) = self.buckets.get(&pair_id) else {
            return Vec::new();
        };
        // An order appears in every bucket of its range, so the union over
        // the query interval visits each intersecting order at least once;
        // the set collapses repeats and restores global time order.
        let mut seen: BTreeSet<(u64, OrderId)> = BTreeSet::new();
        for (_, bucket) in pair_buckets.range(tick_lower..tick_upper) {
            seen.extend(bucket.side_entries(side));
        }
        seen.into_iter().map(|(_, id)| id).collect()
    }

    /// Buy orders intersecting `[tick_lower, tick_upper)`; see
    /// [`Self::orders_overlapping`].
    #[must_use]
    pub fn buy_orders_overlapping(
        &self,
        pair_id: PairId,
        tick_lower: Tick,
        tick_upper: Tick,
    ) -> Vec<OrderId> {
        self.orders_overlapping(pair_id, Side::Buy, tick_lower, tick_upper)
    }

    /// Sell orders intersecting `[tick_lower, tick_upper)`; see
    /// [`Self::orders_overlapping`].
    #[must_use]
    pub fn sell_orders_overlapping(
        &self,
        pair_id: PairId,
        tick_lower: Tick,
        tick_upper: Tick,
    ) -> Vec<OrderId> {
        self.orders_overlapping(pair_id, Side::Sell, tick_lower, tick_upper)
    }

    /// Whether an order is present in every bucket of its range. Used by the
    /// invariant auditor.
    #[must_use]
    pub fn contains(&self, order: &Order) -> bool {
        let Some(pair_buckets) = self.buckets.get(&order.pair_id) else {
            return false;
        };
        order.ticks().all(|tick| {
            pair_buckets
                .get(&tick)
                .is_some_and(|b| b.contains(order.side, order.created_at, order.id))
        })
    }

    /// Whether an order has been fully un-indexed.
    #[must_use]
    pub fn is_absent(&self, order: &Order) -> bool {
        let Some(pair_buckets) = self.buckets.get(&order.pair_id) else {
            return true;
        };
        order.ticks().all(|tick| {
            pair_buckets
                .get(&tick)
                .map_or(true, |b| !b.contains(order.side, order.created_at, order.id))
        })
    }

    /// Number of non-empty buckets for a pair.
    #[must_use]
    pub fn bucket_count(&self, pair_id: PairId) -> usize {
        self.buckets.get(&pair_id).map_or(0, std::collections::BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
