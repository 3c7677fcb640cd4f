//! Settlement proposals emitted by the matching core.
//!
//! A [`SettlementProposal`] is speculative until the ledger collaborator
//! acknowledges it; the core keeps a shadow reservation for the proposed
//! quantities while the acknowledgement is outstanding.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{OrderId, PairId, ProposalId};
use crate::numeric;
use crate::order::Order;

/// A proposed cross between one buy and one sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementProposal {
    pub id: ProposalId,
    pub pair_id: PairId,
    pub buy_id: OrderId,
    pub sell_id: OrderId,
    /// Executed quantity in base-token smallest units.
    pub fill_qty: u64,
    /// Midpoint execution price in basis points.
    pub exec_price: u64,
    /// Base-token amount transferred to the buyer (= `fill_qty`).
    pub base_amount: u64,
    /// Quote-token amount transferred to the seller:
    /// `⌊fill_qty · exec_price / 10_000⌋`.
    pub quote_amount: u64,
    /// Matcher fee: `⌊quote_amount · matcher_fee_bps / 10_000⌋`.
    pub matcher_fee: u64,
    /// Millisecond timestamp; refreshed on every retry attempt.
    pub proposed_at: u64,
}

impl SettlementProposal {
    /// Assemble a proposal for a validated candidate, computing the derived
    /// amounts with checked arithmetic.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::AmountOverflow`] if any derived amount
    /// does not fit in `u64`.
    pub fn build(
        buy: &Order,
        sell: &Order,
        fill_qty: u64,
        exec_price: u64,
        matcher_fee_bps: u64,
        attempt: u32,
        proposed_at: u64,
    ) -> Result<Self> {
        let quote_amount = numeric::quote_value(fill_qty, exec_price)?;
        let matcher_fee = numeric::fee(quote_amount, matcher_fee_bps)?;
        Ok(Self {
            id: ProposalId::deterministic(buy.id, sell.id, attempt),
            pair_id: buy.pair_id,
            buy_id: buy.id,
            sell_id: sell.id,
            fill_qty,
            exec_price,
            base_amount: fill_qty,
            quote_amount,
            matcher_fee,
            proposed_at,
        })
    }

    /// The fee-relevant notional value.
    #[must_use]
    pub fn notional(&self) -> u64 {
        self.quote_amount
    }
}

impl std::fmt::Display for SettlementProposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Proposal[{}] {} {}x{} qty {} @ {} = {} (fee {})",
            self.id,
            self.pair_id,
            self.buy_id,
            self.sell_id,
            self.fill_qty,
            self.exec_price,
            self.quote_amount,
            self.matcher_fee,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    #[test]
    fn build_computes_scenario_a_amounts() {
        let buy = Order::dummy(1, 1, Side::Buy, 1490, 1510, 150_000, 1000);
        let sell = Order::dummy(2, 2, Side::Sell, 1495, 1505, 149_500, 1000);
        let p = SettlementProposal::build(&buy, &sell, 1000, 149_750, 5, 0, 99).unwrap();
        assert_eq!(p.base_amount, 1000);
        assert_eq!(p.quote_amount, 14_975);
        assert_eq!(p.matcher_fee, 7);
        assert_eq!(p.proposed_at, 99);
    }

    #[test]
    fn build_id_varies_with_attempt() {
        let buy = Order::dummy(1, 1, Side::Buy, 1490, 1510, 150_000, 1000);
        let sell = Order::dummy(2, 2, Side::Sell, 1495, 1505, 149_500, 1000);
        let a = SettlementProposal::build(&buy, &sell, 1000, 149_750, 5, 0, 0).unwrap();
        let b = SettlementProposal::build(&buy, &sell, 1000, 149_750, 5, 1, 0).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn proposal_serde_roundtrip() {
        let buy = Order::dummy(1, 1, Side::Buy, 1490, 1510, 150_000, 1000);
        let sell = Order::dummy(2, 2, Side::Sell, 1495, 1505, 149_500, 1000);
        let p = SettlementProposal::build(&buy, &sell, 400, 149_750, 5, 0, 7).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: SettlementProposal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
