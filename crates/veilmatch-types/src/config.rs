//! Configuration for a matching-core instance.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunables for one pair-core. Defaults come from [`constants`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// How long a proposal may await ledger acknowledgement before its shadow
    /// reservation is released (milliseconds).
    pub ack_timeout_ms: u64,
    /// Retriable rejections tolerated per `(buy, sell)` candidate before
    /// suppression.
    pub max_retries: u32,
    /// How long a suppressed candidate stays out of scanning (milliseconds).
    pub suppress_window_ms: u64,
    /// Matcher fee in basis points of the quote amount.
    pub matcher_fee_bps: u64,
    /// Trading fee in basis points; deducted by the ledger collaborator, the
    /// core only carries the figure.
    pub trading_fee_bps: u64,
    /// Ledger-event idempotency window size.
    pub sequence_window: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: constants::DEFAULT_ACK_TIMEOUT_MS,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            suppress_window_ms: constants::DEFAULT_SUPPRESS_WINDOW_MS,
            matcher_fee_bps: constants::DEFAULT_MATCHER_FEE_BPS,
            trading_fee_bps: constants::DEFAULT_TRADING_FEE_BPS,
            sequence_window: constants::DEFAULT_SEQUENCE_WINDOW,
        }
    }
}
