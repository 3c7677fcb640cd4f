//! Ledger-event idempotency window.
//!
//! Every applied event's sequence number is remembered together with a
//! digest of its payload. A replayed sequence whose digest matches is a
//! harmless duplicate (the event stream is restartable); a replayed
//! sequence with a *different* payload means the stream forked, which is
//! fatal for the core.
//!
//! The window is a bounded LRU so memory stays predictable in long-running
//! cores.

use std::collections::{HashMap, VecDeque};

/// Outcome of observing one `(sequence, digest)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Never seen; apply the event.
    Fresh,
    /// Seen with identical contents; skip idempotently.
    Duplicate,
    /// Seen with different contents; fatal.
    Conflicting,
}

/// Bounded memory of recently applied event sequences.
#[derive(Debug)]
pub struct SequenceWindow {
    seen: HashMap<u64, [u8; 32]>,
    /// Insertion order for LRU eviction (front = oldest).
    order: VecDeque<u64>,
    max_size: usize,
}

impl SequenceWindow {
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "SequenceWindow max_size must be > 0");
        Self {
            seen: HashMap::with_capacity(max_size.min(4096)),
            order: VecDeque::with_capacity(max_size.min(4096)),
            max_size,
        }
    }

    /// Classify a sequence/digest pair without recording it.
    #[must_use]
    pub fn check(&self, sequence: u64, digest: &[u8; 32]) -> SequenceCheck {
        match self.seen.get(&sequence) {
            None => SequenceCheck::Fresh,
            Some(existing) if existing == digest => SequenceCheck::Duplicate,
            Some(_) => SequenceCheck::Conflicting,
        }
    }

    /// Record a fresh sequence, evicting the oldest entry at capacity.
    /// Call only after the event applied successfully, so a failed apply can
    /// be replayed.
    pub fn record(&mut self, sequence: u64, digest: [u8; 32]) {
        if self.seen.contains_key(&sequence) {
            return;
        }
        if self.seen.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(sequence, digest);
        self.order.push_back(sequence);
    }

    /// Check-and-record in one step.
    pub fn observe(&mut self, sequence: u64, digest: [u8; 32]) -> SequenceCheck {
        let check = self.check(sequence, &digest);
        if check == SequenceCheck::Fresh {
            self.record(sequence, digest);
        }
        check
    }

    #[must_use]
    pub fn contains(&self, sequence: u64) -> bool {
        self.seen.contains_key(&sequence)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
