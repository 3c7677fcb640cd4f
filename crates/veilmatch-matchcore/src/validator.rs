//! Pure validation of order submissions and candidate matches.
//!
//! Nothing here mutates state or consults anything beyond its arguments;
//! the facade calls [`check_submission`] before admitting an order and the
//! scanner and settlement engine both call [`check_match`] — once when a
//! candidate is generated, and again under current state just before a
//! proposal is reserved.

use veilmatch_types::{numeric, CoreError, MatchRejection, Order, Pair, Result, Side, Tick};

/// Validate the parameters of an order submission against its pair.
///
/// # Errors
/// `PairInactive`, `InvalidTickRange`, `TickRangeExceedsMax`,
/// `PriceOutsideTicks`, or `NonPositiveQuantity`.
pub fn check_submission(
    pair: &Pair,
    _side: Side,
    tick_lower: Tick,
    tick_upper: Tick,
    limit_price: u64,
    quantity: u64,
) -> Result<()> {
    if !pair.active {
        return Err(CoreError::PairInactive(pair.pair_id));
    }
    if tick_lower >= tick_upper {
        return Err(CoreError::InvalidTickRange {
            lower: tick_lower,
            upper: tick_upper,
        });
    }
    let width = tick_upper - tick_lower;
    if width > pair.max_tick_range {
        return Err(CoreError::TickRangeExceedsMax {
            width,
            max: pair.max_tick_range,
        });
    }
    let low = pair.tick_floor_price(tick_lower)?;
    let high = pair.tick_floor_price(tick_upper)?;
    if limit_price < low || limit_price > high {
        return Err(CoreError::PriceOutsideTicks {
            price: limit_price,
            low,
            high,
        });
    }
    if quantity == 0 {
        return Err(CoreError::NonPositiveQuantity);
    }
    Ok(())
}

/// Decide whether two candidate orders may legally cross.
///
/// The midpoint bound uses the closed interval `[low·ts, high·ts]`: order
/// limit prices may sit exactly on their upper tick boundary, so a midpoint
/// equal to the overlap's upper price is legal.
pub fn check_match(
    buy: &Order,
    sell: &Order,
    pair: &Pair,
) -> std::result::Result<(), MatchRejection> {
    debug_assert_eq!(buy.side, Side::Buy);
    debug_assert_eq!(sell.side, Side::Sell);

    if buy.pair_id != sell.pair_id || buy.pair_id != pair.pair_id {
        return Err(MatchRejection::PairMismatch);
    }
    if buy.owner == sell.owner {
        return Err(MatchRejection::SameOwner);
    }
    if !buy.is_live() || !sell.is_live() || buy.remaining() == 0 || sell.remaining() == 0 {
        return Err(MatchRejection::EitherAlreadyFilled);
    }
    // Non-strict cross: equal limit prices match.
    if buy.limit_price < sell.limit_price {
        return Err(MatchRejection::PricesDoNotCross);
    }
    let Some((overlap_low, overlap_high)) = buy.overlap(sell) else {
        return Err(MatchRejection::NoTickOverlap);
    };
    let exec_price = numeric::midpoint_price(buy.limit_price, sell.limit_price);
    let in_bounds = pair
        .tick_floor_price(overlap_low)
        .and_then(|low| pair.tick_floor_price(overlap_high).map(|high| (low, high)))
        .map(|(low, high)| exec_price >= low && exec_price <= high);
    match in_bounds {
        Ok(true) => Ok(()),
        _ => Err(MatchRejection::OverlapPriceOutOfBounds),
    }
}
