//! System-wide constants for the VeilMatch matching core.

/// Basis points in one quote unit. Prices, fees, and escrow quote amounts
/// are all expressed against this scale.
pub const BPS_SCALE: u64 = 10_000;

/// Default time a proposal may sit in `AwaitingAck` before the shadow
/// reservation is released (milliseconds).
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 60_000;

/// Default number of retriable rejections tolerated per `(buy, sell)`
/// candidate before suppression kicks in.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default suppression window for consistently failing candidates
/// (milliseconds).
pub const DEFAULT_SUPPRESS_WINDOW_MS: u64 = 30_000;

/// Default matcher fee, in basis points of the quote amount.
pub const DEFAULT_MATCHER_FEE_BPS: u64 = 5;

/// Default trading fee, in basis points of the quote amount. Accounted for
/// in configuration but deducted by the ledger collaborator, never by the
/// core.
pub const DEFAULT_TRADING_FEE_BPS: u64 = 10;

/// Default number of proposals a single `scan_and_match` cycle may emit.
pub const DEFAULT_SCAN_BUDGET: usize = 64;

/// Ledger-event idempotency window size (number of sequences remembered).
pub const DEFAULT_SEQUENCE_WINDOW: usize = 500_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "VeilMatch";
