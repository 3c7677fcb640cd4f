//! Retry accounting and livelock suppression for failing candidates.
//!
//! The first `max_retries` rejections of a `(buy, sell)` candidate are
//! retriable; each rejection past that suppresses the candidate for a
//! window so a consistently failing pair cannot hot-loop the scanner.

use std::collections::HashMap;

use veilmatch_types::OrderId;

/// Per-candidate rejection counters and active suppressions.
#[derive(Debug, Default)]
pub struct SuppressionList {
    attempts: HashMap<(OrderId, OrderId), u32>,
    suppressed_until: HashMap<(OrderId, OrderId), u64>,
}

impl SuppressionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejections recorded so far for this candidate. Doubles as the next
    /// proposal's attempt number.
    #[must_use]
    pub fn attempt_count(&self, key: &(OrderId, OrderId)) -> u32 {
        self.attempts.get(key).copied().unwrap_or(0)
    }

    /// Record a retriable rejection (nack or ack timeout). Returns `true`
    /// when the candidate has exhausted its retries and is now suppressed
    /// until `now + window_ms`.
    pub fn record_rejection(
        &mut self,
        key: (OrderId, OrderId),
        now: u64,
        max_retries: u32,
        window_ms: u64,
    ) -> bool {
        let attempts = self.attempts.entry(key).or_insert(0);
        *attempts += 1;
        if *attempts > max_retries {
            self.suppressed_until
                .insert(key, now.saturating_add(window_ms));
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_suppressed(&self, key: &(OrderId, OrderId), now: u64) -> bool {
        self.suppressed_until.get(key).is_some_and(|until| now < *until)
    }

    /// Forget a candidate entirely (called when it finally commits).
    pub fn clear(&mut self, key: &(OrderId, OrderId)) {
        self.attempts.remove(key);
        self.suppressed_until.remove(key);
    }

    /// Drop expired suppression windows. Attempt counters survive, so a
    /// candidate that keeps failing re-suppresses on its next rejection.
    pub fn purge_expired(&mut self, now: u64) {
        self.suppressed_until.retain(|_, until| now < *until);
    }

    #[must_use]
    pub fn suppressed_count(&self) -> usize {
        self.suppressed_until.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u64, s: u64) -> (OrderId, OrderId) {
        (OrderId::from_low(b), OrderId::from_low(s))
    }

    #[test]
    fn first_rejections_are_retriable() {
        let mut list = SuppressionList::new();
        let k = key(1, 2);
        assert!(!list.record_rejection(k, 100, 3, 30_000));
        assert!(!list.record_rejection(k, 200, 3, 30_000));
        assert!(!list.record_rejection(k, 300, 3, 30_000));
        assert!(!list.is_suppressed(&k, 400));
        assert_eq!(list.attempt_count(&k), 3);
    }

    #[test]
    fn rejection_past_max_retries_suppresses() {
        let mut list = SuppressionList::new();
        let k = key(1, 2);
        for t in 0..3 {
            list.record_rejection(k, t, 3, 30_000);
        }
        assert!(list.record_rejection(k, 1000, 3, 30_000));
        assert!(list.is_suppressed(&k, 1000));
        assert!(list.is_suppressed(&k, 30_999));
        assert!(!list.is_suppressed(&k, 31_000));
    }

    #[test]
    fn counters_survive_window_expiry() {
        let mut list = SuppressionList::new();
        let k = key(1, 2);
        for t in 0..4 {
            list.record_rejection(k, t, 3, 30_000);
        }
        list.purge_expired(40_000);
        assert_eq!(list.suppressed_count(), 0);

        // The very next rejection re-suppresses immediately.
        assert!(list.record_rejection(k, 50_000, 3, 30_000));
    }

    #[test]
    fn clear_resets_candidate() {
        let mut list = SuppressionList::new();
        let k = key(1, 2);
        for t in 0..4 {
            list.record_rejection(k, t, 3, 30_000);
        }
        list.clear(&k);
        assert_eq!(list.attempt_count(&k), 0);
        assert!(!list.is_suppressed(&k, 5));
    }

    #[test]
    fn candidates_are_independent() {
        let mut list = SuppressionList::new();
        for t in 0..4 {
            list.record_rejection(key(1, 2), t, 3, 30_000);
        }
        assert!(list.is_suppressed(&key(1, 2), 10));
        assert!(!list.is_suppressed(&key(1, 3), 10));
        assert_eq!(list.attempt_count(&key(1, 3)), 0);
    }
}
