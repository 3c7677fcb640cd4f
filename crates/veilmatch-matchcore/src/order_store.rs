//! Content-addressable store of active orders.
//!
//! The store holds only live orders; terminal records are removed at the
//! moment they turn terminal and handed back for event emission. Matching
//! priority is not the store's concern — that is determined by the tick
//! index ordering.

use std::collections::HashMap;

use veilmatch_types::{CoreError, Order, OrderId, OrderStatus, PairId, Result};

/// Id-keyed store of the core's working set.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<OrderId, Order>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`CoreError::DuplicateOrder`] if the id is already present.
    pub fn insert(&mut self, order: Order) -> Result<()> {
        if self.orders.contains_key(&order.id) {
            return Err(CoreError::DuplicateOrder(order.id));
        }
        self.orders.insert(order.id, order);
        Ok(())
    }

    /// # Errors
    /// Returns [`CoreError::UnknownOrder`] if absent.
    pub fn get(&self, id: &OrderId) -> Result<&Order> {
        self.orders.get(id).ok_or(CoreError::UnknownOrder(*id))
    }

    #[must_use]
    pub fn get_opt(&self, id: &OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        self.orders.contains_key(id)
    }

    /// Apply a mutation and re-check the fill/status coherence invariants.
    ///
    /// # Errors
    /// [`CoreError::UnknownOrder`] if absent;
    /// [`CoreError::IndexInvariantViolated`] if the mutation left the order
    /// with `filled > quantity` or a status inconsistent with its fill level.
    pub fn mutate<F>(&mut self, id: &OrderId, f: F) -> Result<&Order>
    where
        F: FnOnce(&mut Order),
    {
        let order = self
            .orders
            .get_mut(id)
            .ok_or(CoreError::UnknownOrder(*id))?;
        f(order);
        Self::check_coherence(order)?;
        Ok(order)
    }

    /// Remove a record that reached a terminal state, returning it for event
    /// emission.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownOrder`] if absent.
    pub fn remove(&mut self, id: &OrderId) -> Result<Order> {
        self.orders.remove(id).ok_or(CoreError::UnknownOrder(*id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Live orders of one pair.
    pub fn pair_orders(&self, pair_id: PairId) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(move |o| o.pair_id == pair_id)
    }

    fn check_coherence(order: &Order) -> Result<()> {
        let ok = order.filled <= order.quantity
            && match order.status {
                OrderStatus::Active => order.filled == 0,
                OrderStatus::PartiallyFilled => {
                    order.filled > 0 && order.filled < order.quantity
                }
                OrderStatus::Filled => order.filled == order.quantity,
                OrderStatus::Cancelled => order.filled < order.quantity,
            };
        if ok {
            Ok(())
        } else {
            Err(CoreError::IndexInvariantViolated {
                reason: format!(
                    "{} incoherent after mutation: filled {} / quantity {} status {}",
                    order.id, order.filled, order.quantity, order.status
                ),
            })
        }
    }
}
