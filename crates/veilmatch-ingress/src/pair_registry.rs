//! Token-pair metadata, sourced exclusively from ledger events.
//!
//! The core never fabricates pairs. `upsert` is idempotent under event
//! replay, and deactivation flips a flag instead of deleting so historical
//! orders keep resolving their pair.

use std::collections::HashMap;

use veilmatch_types::{CoreError, Pair, PairId, Result};

/// Registry of every pair this core has seen registered.
#[derive(Debug, Default)]
pub struct PairRegistry {
    pairs: HashMap<PairId, Pair>,
}

impl PairRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `pair_registered` event. Replaces any previous entry for the
    /// same id (replay idempotence).
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidPair`] when `tick_size` or
    /// `max_tick_range` is zero.
    pub fn upsert(&mut self, pair: Pair) -> Result<()> {
        if pair.tick_size == 0 {
            return Err(CoreError::InvalidPair {
                reason: format!("{} has zero tick_size", pair.pair_id),
            });
        }
        if pair.max_tick_range == 0 {
            return Err(CoreError::InvalidPair {
                reason: format!("{} has zero max_tick_range", pair.pair_id),
            });
        }
        self.pairs.insert(pair.pair_id, pair);
        Ok(())
    }

    /// Toggle a pair's active flag. Idempotent.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownPair`] if absent.
    pub fn set_active(&mut self, pair_id: PairId, active: bool) -> Result<()> {
        let pair = self
            .pairs
            .get_mut(&pair_id)
            .ok_or(CoreError::UnknownPair(pair_id))?;
        pair.active = active;
        Ok(())
    }

    /// Resolve a pair that must be active for order admission.
    ///
    /// # Errors
    /// `PairNotFound` if absent, `PairInactive` if deactivated.
    pub fn require_active(&self, pair_id: PairId) -> Result<&Pair> {
        let pair = self
            .pairs
            .get(&pair_id)
            .ok_or(CoreError::PairNotFound(pair_id))?;
        if !pair.active {
            return Err(CoreError::PairInactive(pair_id));
        }
        Ok(pair)
    }

    #[must_use]
    pub fn get(&self, pair_id: PairId) -> Option<&Pair> {
        self.pairs.get(&pair_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
