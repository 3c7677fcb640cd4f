//! Order types for the VeilMatch matching core.
//!
//! An order declares a public tick range and keeps its exact limit price
//! inside that range; the range is what the index sees, the limit price is
//! what matching validates against.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{OrderId, OwnerId, PairId, Tick, TokenId};
use crate::numeric;
use crate::pair::Pair;

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of an order.
///
/// `Filled` and `Cancelled` are terminal; `Active` and `PartiallyFilled`
/// distinguish `filled = 0` from `0 < filled < quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Active,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }

    /// The status implied by a fill level on a live order.
    #[must_use]
    pub fn for_fill(filled: u64, quantity: u64) -> Self {
        if filled == 0 {
            Self::Active
        } else if filled < quantity {
            Self::PartiallyFilled
        } else {
            Self::Filled
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A live order in the matching core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: OwnerId,
    pub pair_id: PairId,
    pub side: Side,
    /// Inclusive lower tick of the declared range.
    pub tick_lower: Tick,
    /// Exclusive upper tick of the declared range.
    pub tick_upper: Tick,
    /// Limit price in basis points; within `[lower·ts, upper·ts]`.
    pub limit_price: u64,
    /// Total quantity in base-token smallest units.
    pub quantity: u64,
    /// Executed quantity; monotonically non-decreasing, never above `quantity`.
    pub filled: u64,
    /// Amount still committed against `owner` in the escrow ledger.
    pub escrow_amount: u64,
    /// Millisecond timestamp; monotonically non-decreasing across orders.
    pub created_at: u64,
    pub status: OrderStatus,
}

impl Order {
    /// Quantity still open for matching.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.quantity.saturating_sub(self.filled)
    }

    /// Whether the order participates in matching.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.status.is_terminal()
    }

    /// The ticks `[tick_lower, tick_upper)` this order occupies.
    #[must_use]
    pub fn ticks(&self) -> std::ops::Range<Tick> {
        self.tick_lower..self.tick_upper
    }

    /// Intersection of two orders' tick ranges, if non-empty.
    #[must_use]
    pub fn overlap(&self, other: &Order) -> Option<(Tick, Tick)> {
        let low = self.tick_lower.max(other.tick_lower);
        let high = self.tick_upper.min(other.tick_upper);
        (low < high).then_some((low, high))
    }

    /// The token this order's escrow is denominated in: quote for buys,
    /// base for sells.
    #[must_use]
    pub fn escrow_token(&self, pair: &Pair) -> TokenId {
        match self.side {
            Side::Buy => pair.quote_token_id,
            Side::Sell => pair.base_token_id,
        }
    }

    /// Escrow an order with these parameters must have booked:
    /// `⌊quantity · limit_price / 10_000⌋` of quote for a buy, `quantity`
    /// of base for a sell.
    pub fn required_escrow(side: Side, limit_price: u64, quantity: u64) -> Result<u64> {
        match side {
            Side::Buy => numeric::quote_value(quantity, limit_price),
            Side::Sell => Ok(quantity),
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order[{}] {} {} [{}, {}) @ {} qty {} filled {} ({})",
            self.id,
            self.pair_id,
            self.side,
            self.tick_lower,
            self.tick_upper,
            self.limit_price,
            self.quantity,
            self.filled,
            self.status,
        )
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A live order on pair 1 with the given shape. Escrow is set to exactly
    /// the requirement.
    pub fn dummy(
        id: u64,
        owner: u64,
        side: Side,
        tick_lower: Tick,
        tick_upper: Tick,
        limit_price: u64,
        quantity: u64,
    ) -> Self {
        let escrow_amount = Self::required_escrow(side, limit_price, quantity)
            .expect("dummy order escrow fits in u64");
        Self {
            id: OrderId::from_low(id),
            owner: OwnerId::from_low(owner),
            pair_id: PairId(1),
            side,
            tick_lower,
            tick_upper,
            limit_price,
            quantity,
            filled: 0,
            escrow_amount,
            created_at: id,
            status: OrderStatus::Active,
        }
    }
}
