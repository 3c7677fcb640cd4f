//! Trading-pair metadata and the tick price lattice.
//!
//! Pairs are never fabricated by the core; they enter through
//! `pair_registered` ledger events and are only ever deactivated, never
//! deleted.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{PairId, Tick, TokenId};

/// Metadata for one base/quote token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub pair_id: PairId,
    pub base_token_id: TokenId,
    pub quote_token_id: TokenId,
    /// Quote-currency basis points per tick. Strictly positive.
    pub tick_size: u64,
    /// Widest tick range an order on this pair may declare. Strictly positive.
    pub max_tick_range: u64,
    pub active: bool,
}

impl Pair {
    /// Lower price bound of tick `t`, in basis points.
    ///
    /// # Errors
    /// Returns [`CoreError::AmountOverflow`] if `t · tick_size` exceeds `u64`.
    pub fn tick_floor_price(&self, tick: Tick) -> Result<u64> {
        tick.checked_mul(self.tick_size)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("tick {tick} * tick_size {}", self.tick_size),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Pair {
        Pair {
            pair_id: PairId(1),
            base_token_id: TokenId(10),
            quote_token_id: TokenId(20),
            tick_size: 100,
            max_tick_range: 50,
            active: true,
        }
    }

    #[test]
    fn tick_floor_price_scales_by_tick_size() {
        let p = pair();
        assert_eq!(p.tick_floor_price(0).unwrap(), 0);
        assert_eq!(p.tick_floor_price(1490).unwrap(), 149_000);
    }

    #[test]
    fn tick_floor_price_overflow_checked() {
        let p = pair();
        let err = p.tick_floor_price(u64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn pair_serde_roundtrip() {
        let p = pair();
        let json = serde_json::to_string(&p).unwrap();
        let back: Pair = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
