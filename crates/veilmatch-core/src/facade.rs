//! The single-threaded coordination point of one matching core.
//!
//! Every state-mutating operation funnels through [`CoreFacade`], which owns
//! all component state and injects it into the pure/leaf components. Commands
//! are linearised in arrival order; ledger events are applied in stream order
//! with an idempotency window; fatal errors trip a sticky halt that refuses
//! further commands until a supervisor resets.

use std::collections::HashMap;

use veilmatch_types::{
    CoreConfig, CoreError, LedgerEvent, Order, OrderId, OrderStatus, OwnerId, Pair, PairId,
    Result, SettlementProposal, Side, Tick, TokenId,
};

use veilmatch_ingress::{EscrowLedger, PairRegistry};
use veilmatch_matchcore::{scan_pair, validator, OrderStore, TickIndex};
use veilmatch_settlement::{Ledger, SequenceCheck, SequenceWindow, SettlementEngine};

use crate::clock::Clock;

/// An order-submission command.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SubmitOrder {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub pair_id: PairId,
    pub side: Side,
    pub tick_lower: Tick,
    pub tick_upper: Tick,
    pub limit_price: u64,
    pub quantity: u64,
    /// Escrow the submitter attests is booked on chain for this order.
    pub escrow_amount: u64,
}

/// One pair-core instance: all state, one writer.
pub struct CoreFacade<L: Ledger, C: Clock> {
    config: CoreConfig,
    clock: C,
    ledger: L,
    registry: PairRegistry,
    store: OrderStore,
    index: TickIndex,
    escrow: EscrowLedger,
    engine: SettlementEngine,
    sequence: SequenceWindow,
    cursor: u64,
    /// High-water mark keeping `created_at` monotonically non-decreasing.
    last_ts: u64,
    halted: Option<String>,
}

impl<L: Ledger, C: Clock> CoreFacade<L, C> {
    #[must_use]
    pub fn new(config: CoreConfig, ledger: L, clock: C) -> Self {
        let sequence = SequenceWindow::new(config.sequence_window);
        let engine = SettlementEngine::new(config.clone());
        Self {
            config,
            clock,
            ledger,
            registry: PairRegistry::new(),
            store: OrderStore::new(),
            index: TickIndex::new(),
            escrow: EscrowLedger::new(),
            engine,
            sequence,
            cursor: 0,
            last_ts: 0,
            halted: None,
        }
    }

    // =================================================================
    // Commands
    // =================================================================

    /// Admit a new order. On success the order is indexed and its escrow
    /// booked; the returned id is the caller's receipt.
    ///
    /// # Errors
    /// Any validator error, `DuplicateOrder`, `InsufficientEscrow`,
    /// `OwnerDesynced`, or `CoreHalted`.
    pub fn submit(&mut self, cmd: SubmitOrder) -> Result<OrderId> {
        let result = self.submit_inner(cmd);
        self.guard(result)
    }

    fn submit_inner(&mut self, cmd: SubmitOrder) -> Result<OrderId> {
        self.ensure_running()?;
        let pair = *self.registry.require_active(cmd.pair_id)?;
        validator::check_submission(
            &pair,
            cmd.side,
            cmd.tick_lower,
            cmd.tick_upper,
            cmd.limit_price,
            cmd.quantity,
        )?;
        if self.store.contains(&cmd.order_id) {
            return Err(CoreError::DuplicateOrder(cmd.order_id));
        }
        let required = Order::required_escrow(cmd.side, cmd.limit_price, cmd.quantity)?;
        if cmd.escrow_amount < required {
            return Err(CoreError::InsufficientEscrow {
                required,
                attested: cmd.escrow_amount,
            });
        }

        let order = Order {
            id: cmd.order_id,
            owner: cmd.owner,
            pair_id: cmd.pair_id,
            side: cmd.side,
            tick_lower: cmd.tick_lower,
            tick_upper: cmd.tick_upper,
            limit_price: cmd.limit_price,
            quantity: cmd.quantity,
            filled: 0,
            escrow_amount: cmd.escrow_amount,
            created_at: self.next_timestamp(),
            status: OrderStatus::Active,
        };
        self.escrow
            .commit(order.owner, order.escrow_token(&pair), order.escrow_amount)?;
        self.store.insert(order.clone())?;
        self.index.insert_order(&order)?;
        tracing::debug!(order = %order, "Order admitted");
        Ok(order.id)
    }

    /// Cancel a live order: un-index it, release its remaining escrow, and
    /// retire the record. In-flight proposals on the order are evicted; the
    /// ledger nacks them on its side because the on-chain cancel lands first.
    ///
    /// # Errors
    /// `UnknownOrder`, `NotOwner`, `AlreadyTerminal`, `OwnerDesynced`, or
    /// `CoreHalted`.
    pub fn cancel(&mut self, order_id: OrderId, caller: OwnerId) -> Result<()> {
        let result = self.cancel_inner(order_id, caller);
        self.guard(result)
    }

    fn cancel_inner(&mut self, order_id: OrderId, caller: OwnerId) -> Result<()> {
        self.ensure_running()?;
        let order = self.store.get(&order_id)?.clone();
        if order.owner != caller {
            return Err(CoreError::NotOwner(order_id));
        }
        if order.status.is_terminal() {
            return Err(CoreError::AlreadyTerminal(order_id));
        }
        self.retire_order(&order)?;
        tracing::debug!(order = %order_id, "Order cancelled");
        Ok(())
    }

    /// Replace a live order's parameters in place. The new quantity may not
    /// undercut volume that is already filled or promised to in-flight
    /// proposals; escrow is recomputed and the delta committed or released.
    /// On any validation failure the order is untouched.
    ///
    /// # Errors
    /// Any validator error, `UnknownOrder`, `NotOwner`, `AlreadyTerminal`,
    /// `QuantityBelowCommitted`, `OwnerDesynced`, or `CoreHalted`.
    pub fn update(
        &mut self,
        order_id: OrderId,
        caller: OwnerId,
        new_tick_lower: Tick,
        new_tick_upper: Tick,
        new_limit_price: u64,
        new_quantity: u64,
    ) -> Result<()> {
        let result = self.update_inner(
            order_id,
            caller,
            new_tick_lower,
            new_tick_upper,
            new_limit_price,
            new_quantity,
        );
        self.guard(result)
    }

    fn update_inner(
        &mut self,
        order_id: OrderId,
        caller: OwnerId,
        new_tick_lower: Tick,
        new_tick_upper: Tick,
        new_limit_price: u64,
        new_quantity: u64,
    ) -> Result<()> {
        self.ensure_running()?;
        let order = self.store.get(&order_id)?.clone();
        if order.owner != caller {
            return Err(CoreError::NotOwner(order_id));
        }
        if order.status.is_terminal() {
            return Err(CoreError::AlreadyTerminal(order_id));
        }
        let pair = *self.registry.require_active(order.pair_id)?;
        validator::check_submission(
            &pair,
            order.side,
            new_tick_lower,
            new_tick_upper,
            new_limit_price,
            new_quantity,
        )?;
        let reserved = self.engine.reserved_for(&order_id);
        let committed_volume = order.filled.saturating_add(reserved);
        if new_quantity < committed_volume {
            return Err(CoreError::QuantityBelowCommitted {
                requested: new_quantity,
                committed: committed_volume,
            });
        }

        // Escrow covers the open remainder at the new price.
        let open = new_quantity - order.filled;
        let new_escrow = Order::required_escrow(order.side, new_limit_price, open)?;
        let token = order.escrow_token(&pair);
        if new_escrow > order.escrow_amount {
            self.escrow
                .commit(order.owner, token, new_escrow - order.escrow_amount)?;
        } else if new_escrow < order.escrow_amount {
            self.escrow
                .release(order.owner, token, order.escrow_amount - new_escrow)?;
        }

        let range_changed =
            (new_tick_lower, new_tick_upper) != (order.tick_lower, order.tick_upper);
        if range_changed {
            self.index.remove_order(&order)?;
        }
        let updated = self
            .store
            .mutate(&order_id, |o| {
                o.tick_lower = new_tick_lower;
                o.tick_upper = new_tick_upper;
                o.limit_price = new_limit_price;
                o.quantity = new_quantity;
                o.escrow_amount = new_escrow;
                o.status = OrderStatus::for_fill(o.filled, new_quantity);
            })?
            .clone();

        if updated.status == OrderStatus::Filled {
            // Shrunk to exactly its filled volume: nothing left to match.
            if !range_changed {
                self.index.remove_order(&updated)?;
            }
            let terminal = self.store.remove(&order_id)?;
            tracing::debug!(order = %terminal, "Order filled by shrinking update");
        } else if range_changed {
            self.index.insert_order(&updated)?;
        }
        tracing::debug!(order = %order_id, "Order updated");
        Ok(())
    }

    /// Run one scan cycle: release timed-out reservations, enumerate
    /// candidates by descending profitability, and hand them to the
    /// settlement engine until `budget` proposals are in flight.
    ///
    /// # Errors
    /// `PairNotFound` / `PairInactive` / `CoreHalted`; engine-level fatal
    /// errors abort the cycle and trip the halt.
    pub fn scan_and_match(
        &mut self,
        pair_id: PairId,
        budget: usize,
    ) -> Result<Vec<SettlementProposal>> {
        self.ensure_running()?;
        let pair = *self.registry.require_active(pair_id)?;
        let now = self.clock.now_ms();

        let released = self.engine.check_timeouts(now);
        if !released.is_empty() {
            tracing::debug!(count = released.len(), "Timed-out reservations released");
        }

        let engine = &self.engine;
        let candidates = scan_pair(&pair, &self.index, &self.store, |id| engine.reserved_for(id));

        let mut proposals = Vec::new();
        for candidate in candidates {
            if proposals.len() >= budget {
                break;
            }
            match self.engine.propose(
                &candidate,
                &pair,
                &self.store,
                &self.escrow,
                &mut self.ledger,
                now,
            ) {
                Ok(Some(proposal)) => proposals.push(proposal),
                Ok(None) => {}
                Err(err) => {
                    self.halt_if_fatal(&err);
                    return Err(err);
                }
            }
        }

        tracing::info!(
            pair = %pair_id,
            proposals = proposals.len(),
            pending = self.engine.pending_count(),
            "Scan-and-match cycle complete"
        );
        Ok(proposals)
    }

    // =================================================================
    // Ledger reconciliation
    // =================================================================

    /// Apply one event from the ledger's stream. Duplicate sequences are
    /// skipped idempotently; a sequence replayed with different contents is
    /// fatal. The cursor advances only after the event fully applied.
    ///
    /// Events keep flowing while the core is halted — they are the ledger's
    /// authoritative state, not commands.
    pub fn apply_ledger_event(&mut self, sequence: u64, event: &LedgerEvent) -> Result<()> {
        let digest = event.digest();
        match self.sequence.check(sequence, &digest) {
            SequenceCheck::Duplicate => {
                tracing::debug!(sequence, kind = event.kind(), "Duplicate ledger event skipped");
                return Ok(());
            }
            SequenceCheck::Conflicting => {
                let err = CoreError::DuplicateLedgerEvent { sequence };
                self.halt_if_fatal(&err);
                return Err(err);
            }
            SequenceCheck::Fresh => {}
        }

        let result = self.dispatch_event(event);
        match result {
            Ok(()) => {
                self.sequence.record(sequence, digest);
                self.cursor = self.cursor.max(sequence);
                Ok(())
            }
            Err(err) => {
                self.halt_if_fatal(&err);
                Err(err)
            }
        }
    }

    fn dispatch_event(&mut self, event: &LedgerEvent) -> Result<()> {
        match event {
            LedgerEvent::PairRegistered {
                pair_id,
                base_token_id,
                quote_token_id,
                tick_size,
                max_tick_range,
            } => self.registry.upsert(Pair {
                pair_id: *pair_id,
                base_token_id: *base_token_id,
                quote_token_id: *quote_token_id,
                tick_size: *tick_size,
                max_tick_range: *max_tick_range,
                active: true,
            }),
            LedgerEvent::PairDeactivated { pair_id } => self.registry.set_active(*pair_id, false),
            LedgerEvent::PairReactivated { pair_id } => self.registry.set_active(*pair_id, true),
            LedgerEvent::OrderObserved {
                order_id,
                owner,
                pair_id,
                side,
                tick_lower,
                tick_upper,
                limit_price,
                quantity,
                escrow_amount,
                created_at,
            } => self.observe_order(
                *order_id,
                *owner,
                *pair_id,
                *side,
                *tick_lower,
                *tick_upper,
                *limit_price,
                *quantity,
                *escrow_amount,
                *created_at,
            ),
            LedgerEvent::OrderCancelledOnChain { order_id } => self.cancel_on_chain(*order_id),
            LedgerEvent::SettlementCommitted {
                buy_id,
                sell_id,
                fill_qty,
                exec_price,
                block_height,
            } => {
                let Some(pair) = self.pair_for_settlement(buy_id, sell_id)? else {
                    tracing::warn!(buy = %buy_id, sell = %sell_id, block_height,
                        "Commit references no known order; ignored");
                    return Ok(());
                };
                self.engine.handle_commit(
                    *buy_id,
                    *sell_id,
                    *fill_qty,
                    *exec_price,
                    &pair,
                    &mut self.store,
                    &mut self.index,
                    &mut self.escrow,
                )
            }
            LedgerEvent::SettlementRejected {
                buy_id,
                sell_id,
                reason,
            } => {
                let now = self.clock.now_ms();
                let outcome = self.engine.handle_reject(*buy_id, *sell_id, reason, now);
                tracing::debug!(buy = %buy_id, sell = %sell_id, ?outcome, "Rejection applied");
                Ok(())
            }
            LedgerEvent::EscrowSync {
                owner,
                token_id,
                external_committed,
            } => self.escrow.sync(*owner, *token_id, *external_committed),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn observe_order(
        &mut self,
        order_id: OrderId,
        owner: OwnerId,
        pair_id: PairId,
        side: Side,
        tick_lower: Tick,
        tick_upper: Tick,
        limit_price: u64,
        quantity: u64,
        escrow_amount: u64,
        created_at: u64,
    ) -> Result<()> {
        if self.store.contains(&order_id) {
            tracing::debug!(order = %order_id, "Order already known; observation skipped");
            return Ok(());
        }
        let pair = *self.registry.require_active(pair_id)?;
        validator::check_submission(&pair, side, tick_lower, tick_upper, limit_price, quantity)?;
        let order = Order {
            id: order_id,
            owner,
            pair_id,
            side,
            tick_lower,
            tick_upper,
            limit_price,
            quantity,
            filled: 0,
            escrow_amount,
            created_at,
            status: OrderStatus::Active,
        };
        self.last_ts = self.last_ts.max(created_at);
        self.escrow
            .commit(owner, order.escrow_token(&pair), escrow_amount)?;
        self.store.insert(order.clone())?;
        self.index.insert_order(&order)?;
        tracing::debug!(order = %order, "On-chain order observed");
        Ok(())
    }

    fn cancel_on_chain(&mut self, order_id: OrderId) -> Result<()> {
        let Some(order) = self.store.get_opt(&order_id) else {
            tracing::debug!(order = %order_id, "Cancel for unknown order; skipped");
            return Ok(());
        };
        let order = order.clone();
        self.retire_order(&order)?;
        tracing::debug!(order = %order_id, "On-chain cancellation applied");
        Ok(())
    }

    /// Shared teardown for both cancel paths: evict in-flight proposals,
    /// release remaining escrow, un-index, and drop the record.
    fn retire_order(&mut self, order: &Order) -> Result<()> {
        let pair = self
            .registry
            .get(order.pair_id)
            .copied()
            .ok_or(CoreError::UnknownPair(order.pair_id))?;
        self.escrow
            .release(order.owner, order.escrow_token(&pair), order.escrow_amount)?;
        self.engine.evict_order(&order.id);
        self.index.remove_order(order)?;
        self.store.remove(&order.id)?;
        Ok(())
    }

    /// Resolve the pair of a settlement event through whichever leg is still
    /// in the store.
    fn pair_for_settlement(
        &self,
        buy_id: &OrderId,
        sell_id: &OrderId,
    ) -> Result<Option<Pair>> {
        let order = self
            .store
            .get_opt(buy_id)
            .or_else(|| self.store.get_opt(sell_id));
        match order {
            None => Ok(None),
            Some(o) => self
                .registry
                .get(o.pair_id)
                .copied()
                .map(Some)
                .ok_or(CoreError::UnknownPair(o.pair_id)),
        }
    }

    // =================================================================
    // Supervision
    // =================================================================

    /// Supervisor override after an escrow desync: adopt the ledger's
    /// external amount, lift the owner's quarantine, and un-halt.
    pub fn reset_after_desync(&mut self, owner: OwnerId, token: TokenId, external: u64) {
        self.escrow.resync(owner, token, external);
        if self.halted.take().is_some() {
            tracing::info!(owner = %owner, "Core resumed after escrow resync");
        }
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    fn ensure_running(&self) -> Result<()> {
        match &self.halted {
            Some(reason) => Err(CoreError::CoreHalted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn halt_if_fatal(&mut self, err: &CoreError) {
        if err.is_fatal() && self.halted.is_none() {
            tracing::error!(%err, "Fatal error; core halted pending supervisor reset");
            self.halted = Some(err.to_string());
        }
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(ref err) = result {
            self.halt_if_fatal(err);
        }
        result
    }

    fn next_timestamp(&mut self) -> u64 {
        let ts = self.clock.now_ms().max(self.last_ts);
        self.last_ts = ts;
        ts
    }

    // =================================================================
    // Introspection
    // =================================================================

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<&Order> {
        self.store.get_opt(id)
    }

    #[must_use]
    pub fn pair(&self, id: PairId) -> Option<&Pair> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn escrow_committed(&self, owner: OwnerId, token: TokenId) -> u64 {
        self.escrow.committed(owner, token)
    }

    #[must_use]
    pub fn reserved_for(&self, id: &OrderId) -> u64 {
        self.engine.reserved_for(id)
    }

    #[must_use]
    pub fn open_orders(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Audit every universal invariant of the working set: index
    /// completeness, fill/status coherence, reservation bounds, and escrow
    /// conservation in both directions.
    ///
    /// # Errors
    /// Returns the first violation found as `IndexInvariantViolated`.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected: HashMap<(OwnerId, TokenId), u64> = HashMap::new();
        for order in self.store.iter() {
            if !order.is_live() {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("terminal order {} still stored", order.id),
                });
            }
            let coherent = match order.status {
                OrderStatus::Active => order.filled == 0,
                OrderStatus::PartiallyFilled => {
                    order.filled > 0 && order.filled < order.quantity
                }
                OrderStatus::Filled | OrderStatus::Cancelled => false,
            };
            if !coherent {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("{} status/fill mismatch", order.id),
                });
            }
            if !self.index.contains(order) {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("{} missing from part of its tick range", order.id),
                });
            }
            if self.engine.reserved_for(&order.id) > order.remaining() {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("{} over-reserved", order.id),
                });
            }
            let pair = self
                .registry
                .get(order.pair_id)
                .ok_or(CoreError::UnknownPair(order.pair_id))?;
            let slot = expected
                .entry((order.owner, order.escrow_token(pair)))
                .or_insert(0);
            *slot = slot.checked_add(order.escrow_amount).ok_or_else(|| {
                CoreError::AmountOverflow {
                    context: "escrow audit sum".into(),
                }
            })?;
        }
        for ((owner, token), amount) in self.escrow.entries() {
            if expected.get(&(owner, token)).copied().unwrap_or(0) != amount {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("escrow ledger entry {owner}/{token} unbacked by live orders"),
                });
            }
        }
        for ((owner, token), amount) in &expected {
            if self.escrow.committed(*owner, *token) != *amount {
                return Err(CoreError::IndexInvariantViolated {
                    reason: format!("live orders of {owner}/{token} exceed escrow ledger"),
                });
            }
        }
        Ok(())
    }
}
