//! The per-candidate settlement state machine.
//!
//! ```text
//!          ┌──────────┐
//!          │ Proposed │  candidate from the scanner
//!          └────┬─────┘
//!               │ re-validate under current state
//!          ┌────▼─────┐  ┌───────────┐
//!          │ Reserved │──▶ Cancelled │  stale / invariant fail
//!          └────┬─────┘  └───────────┘
//!               │ submit to the ledger
//!          ┌────▼────────┐
//!          │ AwaitingAck │
//!          └────┬────────┘
//!          ┌────┴─────┬────────────┐
//!     ack  │          │ nack       │ timeout
//!          ▼          ▼            ▼
//!      Committed  ReleasedBack  ReleasedBack
//! ```
//!
//! Reservation holds quantity in shadow only; the persisted `filled`
//! counters move exclusively on `ack`, so a nack or timeout leaves the
//! orders exactly as they were.

use veilmatch_types::{
    numeric, CoreConfig, CoreError, MatchRejection, Order, OrderId, OrderStatus, Pair, Result,
    SettlementProposal,
};

use veilmatch_ingress::EscrowLedger;
use veilmatch_matchcore::{validator, MatchCandidate, OrderStore, TickIndex};

use crate::ledger::Ledger;
use crate::reservation::{PendingSettlement, ReservationBook, SettlementState};
use crate::suppression::SuppressionList;

/// Disposition of a ledger rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    /// Released; the candidate may be re-proposed on a later scan.
    Retriable { attempt: u32 },
    /// Retries exhausted; the candidate is suppressed for a window.
    Suppressed,
    /// No reservation was in flight for this key (replay or restart).
    NoPending,
}

/// Drives candidates from proposal through acknowledgement.
#[derive(Debug)]
pub struct SettlementEngine {
    config: CoreConfig,
    reservations: ReservationBook,
    suppression: SuppressionList,
}

impl SettlementEngine {
    #[must_use]
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            reservations: ReservationBook::new(),
            suppression: SuppressionList::new(),
        }
    }

    /// Quantity of an order promised to in-flight proposals.
    #[must_use]
    pub fn reserved_for(&self, id: &OrderId) -> u64 {
        self.reservations.reserved_qty(id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.reservations.len()
    }

    #[must_use]
    pub fn is_suppressed(&self, key: &(OrderId, OrderId), now: u64) -> bool {
        self.suppression.is_suppressed(key, now)
    }

    /// Take a scanner candidate through `Proposed → Reserved → AwaitingAck`.
    ///
    /// Returns `Ok(None)` when the candidate is skipped: already in flight,
    /// suppressed, stale, no longer crossing, fully reserved, or without
    /// adequate escrow. Skipped candidates simply surface again on a later
    /// scan if they still apply; terminal rejections never will.
    ///
    /// # Errors
    /// Propagates arithmetic overflow; submission failures are treated as
    /// nacks, not errors.
    pub fn propose(
        &mut self,
        candidate: &MatchCandidate,
        pair: &Pair,
        store: &OrderStore,
        escrow: &EscrowLedger,
        ledger: &mut dyn Ledger,
        now: u64,
    ) -> Result<Option<SettlementProposal>> {
        let key = (candidate.buy_id, candidate.sell_id);
        if self.reservations.has_pending(&key) || self.suppression.is_suppressed(&key, now) {
            return Ok(None);
        }

        let (Some(buy), Some(sell)) = (
            store.get_opt(&candidate.buy_id),
            store.get_opt(&candidate.sell_id),
        ) else {
            tracing::debug!(buy = %candidate.buy_id, sell = %candidate.sell_id,
                "Candidate stale: order left the store");
            return Ok(None);
        };

        // Re-validate under current state; the scanner's snapshot may be old.
        if let Err(rejection) = validator::check_match(buy, sell, pair) {
            self.log_revalidation_failure(buy, sell, rejection);
            return Ok(None);
        }

        let fill_qty = self.open_qty(buy).min(self.open_qty(sell));
        if fill_qty == 0 {
            return Ok(None);
        }

        let exec_price = numeric::midpoint_price(buy.limit_price, sell.limit_price);
        let quote_amount = numeric::quote_value(fill_qty, exec_price)?;

        // The escrow ledger is the sole authority for collateral adequacy.
        if escrow.committed(sell.owner, pair.base_token_id) < fill_qty
            || escrow.committed(buy.owner, pair.quote_token_id) < quote_amount
        {
            tracing::warn!(buy = %buy.id, sell = %sell.id,
                "Candidate lacks escrow backing; returned to scan queue");
            return Ok(None);
        }

        let attempt = self.suppression.attempt_count(&key);
        let proposal = SettlementProposal::build(
            buy,
            sell,
            fill_qty,
            exec_price,
            self.config.matcher_fee_bps,
            attempt,
            now,
        )?;

        self.reservations.reserve(PendingSettlement {
            proposal: proposal.clone(),
            state: SettlementState::Reserved,
            attempt,
            submitted_at: now,
        });

        if let Err(err) = ledger.submit_proposal(&proposal) {
            self.reservations.release(&key);
            let suppressed = self.suppression.record_rejection(
                key,
                now,
                self.config.max_retries,
                self.config.suppress_window_ms,
            );
            tracing::warn!(proposal = %proposal, %err, suppressed,
                "Proposal submission failed; reservation released");
            return Ok(None);
        }
        if let Some(pending) = self.reservations.get_mut(&key) {
            pending.state = SettlementState::AwaitingAck;
        }

        tracing::debug!(proposal = %proposal, attempt, "Proposal submitted");
        Ok(Some(proposal))
    }

    /// Apply a ledger acknowledgement: consume the reservation, move the
    /// persisted fills, release the matched escrow, and retire orders that
    /// reached `Filled`.
    ///
    /// A commit with no live reservation is applied anyway — that is the
    /// replay path after a restart.
    ///
    /// # Errors
    /// Overfills and escrow shortfalls are invariant violations; the facade
    /// treats them as fatal.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_commit(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        fill_qty: u64,
        exec_price: u64,
        pair: &Pair,
        store: &mut OrderStore,
        index: &mut TickIndex,
        escrow: &mut EscrowLedger,
    ) -> Result<()> {
        let key = (buy_id, sell_id);
        if self.reservations.release(&key).is_none() {
            tracing::debug!(buy = %buy_id, sell = %sell_id,
                "Commit without live reservation (replay or restart)");
        }
        self.suppression.clear(&key);

        let quote_amount = numeric::quote_value(fill_qty, exec_price)?;
        Self::settle_leg(&buy_id, fill_qty, quote_amount, pair, store, index, escrow)?;
        Self::settle_leg(&sell_id, fill_qty, fill_qty, pair, store, index, escrow)?;

        tracing::debug!(
            buy = %buy_id,
            sell = %sell_id,
            fill_qty,
            exec_price,
            quote_amount,
            "Settlement committed"
        );
        Ok(())
    }

    /// Apply a ledger rejection: hand the shadow reservation back and count
    /// the failure against the candidate's retry budget.
    pub fn handle_reject(
        &mut self,
        buy_id: OrderId,
        sell_id: OrderId,
        reason: &str,
        now: u64,
    ) -> RejectOutcome {
        let key = (buy_id, sell_id);
        if self.reservations.release(&key).is_none() {
            tracing::debug!(buy = %buy_id, sell = %sell_id, reason,
                "Rejection without live reservation");
            return RejectOutcome::NoPending;
        }
        let suppressed = self.suppression.record_rejection(
            key,
            now,
            self.config.max_retries,
            self.config.suppress_window_ms,
        );
        tracing::warn!(buy = %buy_id, sell = %sell_id, reason, suppressed,
            "Proposal rejected by ledger");
        if suppressed {
            RejectOutcome::Suppressed
        } else {
            RejectOutcome::Retriable {
                attempt: self.suppression.attempt_count(&key),
            }
        }
    }

    /// Release reservations whose acknowledgement deadline has passed.
    /// A timeout counts as a retriable rejection.
    pub fn check_timeouts(&mut self, now: u64) -> Vec<(OrderId, OrderId)> {
        self.suppression.purge_expired(now);
        let Some(cutoff) = now.checked_sub(self.config.ack_timeout_ms) else {
            return Vec::new();
        };
        let expired = self.reservations.expired_keys(cutoff);
        for key in &expired {
            self.reservations.release(key);
            let suppressed = self.suppression.record_rejection(
                *key,
                now,
                self.config.max_retries,
                self.config.suppress_window_ms,
            );
            tracing::warn!(buy = %key.0, sell = %key.1, suppressed,
                "Proposal ack timed out; reservation released");
        }
        expired
    }

    /// Drop every in-flight settlement an order participates in (cancel
    /// path). The ledger nacks the orphaned proposals on its side.
    pub fn evict_order(&mut self, id: &OrderId) {
        for pending in self.reservations.evict_order(id) {
            tracing::debug!(proposal = %pending.proposal, order = %id,
                "Pending settlement cancelled with its order");
        }
    }

    fn open_qty(&self, order: &Order) -> u64 {
        order
            .remaining()
            .saturating_sub(self.reservations.reserved_qty(&order.id))
    }

    fn log_revalidation_failure(&self, buy: &Order, sell: &Order, rejection: MatchRejection) {
        if rejection.is_terminal() {
            tracing::warn!(buy = %buy.id, sell = %sell.id, %rejection,
                "Candidate failed re-validation terminally; evicted");
        } else {
            tracing::debug!(buy = %buy.id, sell = %sell.id, %rejection,
                "Candidate failed re-validation; returned to scan queue");
        }
    }

    /// Move one leg's persisted state for a committed fill.
    fn settle_leg(
        id: &OrderId,
        fill_qty: u64,
        escrow_spent: u64,
        pair: &Pair,
        store: &mut OrderStore,
        index: &mut TickIndex,
        escrow: &mut EscrowLedger,
    ) -> Result<()> {
        let Some(order) = store.get_opt(id) else {
            // The order was cancelled while the proposal was in flight; the
            // on-chain cancel reached the ledger first, so nothing to move.
            tracing::warn!(order = %id, "Commit for an order no longer in the store; ignored");
            return Ok(());
        };
        let order = order.clone();

        let new_filled = numeric::checked_add(order.filled, fill_qty, "fill accumulation")?;
        if new_filled > order.quantity {
            return Err(CoreError::IndexInvariantViolated {
                reason: format!(
                    "{id} overfilled by commit: {new_filled} > {}",
                    order.quantity
                ),
            });
        }
        let new_escrow = order.escrow_amount.checked_sub(escrow_spent).ok_or_else(|| {
            CoreError::IndexInvariantViolated {
                reason: format!(
                    "{id} escrow shortfall: spent {escrow_spent} of {}",
                    order.escrow_amount
                ),
            }
        })?;

        let new_status = OrderStatus::for_fill(new_filled, order.quantity);
        let token = order.escrow_token(pair);
        // A filled order returns whatever floor-division dust its escrow
        // still holds.
        let (released, remaining_escrow) = if new_status == OrderStatus::Filled {
            (order.escrow_amount, 0)
        } else {
            (escrow_spent, new_escrow)
        };

        escrow.release(order.owner, token, released)?;
        store.mutate(id, |o| {
            o.filled = new_filled;
            o.escrow_amount = remaining_escrow;
            o.status = new_status;
        })?;

        if new_status == OrderStatus::Filled {
            let terminal = store.remove(id)?;
            index.remove_order(&terminal)?;
            tracing::debug!(order = %terminal, "Order filled and retired");
        }
        Ok(())
    }
}
