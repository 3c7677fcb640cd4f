//! Candidate enumeration over the tick index.
//!
//! A scan cycle walks a pair's buckets in ascending tick order, crosses the
//! buy and sell occupants of every two-sided bucket, and keeps the pairs
//! that pass [`validator::check_match`]. Each `(buy, sell)` pair is
//! considered at most once per cycle regardless of how many buckets it
//! shares. Candidates come back ordered by descending projected
//! profitability so a bounded settlement budget spends itself on the best
//! crosses first.

use std::collections::HashSet;

use veilmatch_types::{Order, OrderId, Pair, Tick};

use crate::order_store::OrderStore;
use crate::tick_index::TickIndex;
use crate::validator;

/// A candidate cross surfaced by one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub buy_id: OrderId,
    pub sell_id: OrderId,
    /// Intersection of the two tick ranges, `[overlap_low, overlap_high)`.
    pub overlap_low: Tick,
    pub overlap_high: Tick,
    /// `min(buy remaining, sell remaining)` net of shadow reservations.
    pub projected_fill: u64,
    /// Truncating midpoint of the two limit prices.
    pub projected_price: u64,
    /// `(buy.limit − sell.limit) · projected_fill`; the scan emits high
    /// scores first.
    pub score: u128,
    pub buy_created_at: u64,
    pub sell_created_at: u64,
}

/// Enumerate the profitable candidates of one pair.
///
/// `reserved_qty` reports each order's quantity currently shadow-reserved by
/// in-flight proposals; fully reserved orders are skipped so concurrent scan
/// cycles cannot double-spend liquidity.
#[must_use]
pub fn scan_pair(
    pair: &Pair,
    index: &TickIndex,
    store: &OrderStore,
    reserved_qty: impl Fn(&OrderId) -> u64,
) -> Vec<MatchCandidate> {
    let mut visited: HashSet<(OrderId, OrderId)> = HashSet::new();
    let mut candidates: Vec<MatchCandidate> = Vec::new();
    let mut rejected = 0usize;

    for (_, bucket) in index.iter_buckets(pair.pair_id) {
        if !bucket.has_both_sides() {
            continue;
        }
        for buy_id in bucket.buys() {
            for sell_id in bucket.sells() {
                if !visited.insert((buy_id, sell_id)) {
                    continue;
                }
                let (Some(buy), Some(sell)) = (store.get_opt(&buy_id), store.get_opt(&sell_id))
                else {
                    // The index outlived the store entry; the facade's
                    // invariant auditor will flag this, scanning skips it.
                    continue;
                };
                match candidate_for(pair, buy, sell, &reserved_qty) {
                    Some(c) => candidates.push(c),
                    None => rejected += 1,
                }
            }
        }
    }

    // Descending score; ties by submission order of both legs, then ids so
    // a cycle's output is fully deterministic.
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.buy_created_at.cmp(&b.buy_created_at))
            .then_with(|| a.sell_created_at.cmp(&b.sell_created_at))
            .then_with(|| a.buy_id.cmp(&b.buy_id))
            .then_with(|| a.sell_id.cmp(&b.sell_id))
    });

    tracing::debug!(
        pair = %pair.pair_id,
        candidates = candidates.len(),
        rejected,
        "Scan cycle complete"
    );

    candidates
}

fn candidate_for(
    pair: &Pair,
    buy: &Order,
    sell: &Order,
    reserved_qty: &impl Fn(&OrderId) -> u64,
) -> Option<MatchCandidate> {
    if let Err(rejection) = validator::check_match(buy, sell, pair) {
        if rejection == veilmatch_types::MatchRejection::SameOwner {
            tracing::warn!(
                owner = %buy.owner,
                buy_order = %buy.id,
                sell_order = %sell.id,
                "Self-trade blocked: same owner on both sides"
            );
        }
        return None;
    }

    let buy_open = buy.remaining().saturating_sub(reserved_qty(&buy.id));
    let sell_open = sell.remaining().saturating_sub(reserved_qty(&sell.id));
    let projected_fill = buy_open.min(sell_open);
    if projected_fill == 0 {
        return None;
    }

    let (overlap_low, overlap_high) = buy.overlap(sell)?;
    let spread = buy.limit_price - sell.limit_price;
    Some(MatchCandidate {
        buy_id: buy.id,
        sell_id: sell.id,
        overlap_low,
        overlap_high,
        projected_fill,
        projected_price: veilmatch_types::numeric::midpoint_price(
            buy.limit_price,
            sell.limit_price,
        ),
        score: u128::from(spread) * u128::from(projected_fill),
        buy_created_at: buy.created_at,
        sell_created_at: sell.created_at,
    })
}
