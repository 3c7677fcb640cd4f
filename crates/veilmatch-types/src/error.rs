//! Error types for the VeilMatch matching core.
//!
//! All errors use the `VM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Submission / input errors
//! - 2xx: Order lifecycle errors
//! - 3xx: Pair errors
//! - 4xx: Escrow errors
//! - 5xx: Settlement / ledger errors
//! - 9xx: Fatal / internal errors
//!
//! Match rejections are deliberately **not** part of [`CoreError`]: they are
//! ordinary control-flow outcomes of candidate evaluation, logged but never
//! returned to callers. They live in [`MatchRejection`].

use thiserror::Error;

use crate::{OrderId, OwnerId, PairId, Tick, TokenId};

/// Central error enum for all core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    // =================================================================
    // Submission / input errors (1xx)
    // =================================================================
    /// The declared tick range is empty or inverted.
    #[error("VM_ERR_100: Invalid tick range [{lower}, {upper})")]
    InvalidTickRange { lower: Tick, upper: Tick },

    /// The declared tick range is wider than the pair allows.
    #[error("VM_ERR_101: Tick range width {width} exceeds pair maximum {max}")]
    TickRangeExceedsMax { width: u64, max: u64 },

    /// The limit price falls outside the declared tick range.
    #[error("VM_ERR_102: Limit price {price} outside tick bounds [{low}, {high}]")]
    PriceOutsideTicks { price: u64, low: u64, high: u64 },

    /// Order quantity must be strictly positive.
    #[error("VM_ERR_103: Order quantity must be positive")]
    NonPositiveQuantity,

    // =================================================================
    // Order lifecycle errors (2xx)
    // =================================================================
    /// An order with this id already exists.
    #[error("VM_ERR_200: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The requested order was not found in the store.
    #[error("VM_ERR_201: Order not found: {0}")]
    UnknownOrder(OrderId),

    /// The caller does not own the order it tried to mutate.
    #[error("VM_ERR_202: Caller is not the owner of {0}")]
    NotOwner(OrderId),

    /// The order is already in a terminal state.
    #[error("VM_ERR_203: Order {0} is already terminal")]
    AlreadyTerminal(OrderId),

    /// An update may not shrink an order below its committed volume.
    #[error("VM_ERR_204: New quantity {requested} below committed volume {committed}")]
    QuantityBelowCommitted { requested: u64, committed: u64 },

    // =================================================================
    // Pair errors (3xx)
    // =================================================================
    /// A `pair_registered` event carried invalid metadata.
    #[error("VM_ERR_300: Invalid pair: {reason}")]
    InvalidPair { reason: String },

    /// The pair is not present in the registry (activation toggles).
    #[error("VM_ERR_301: Unknown pair: {0}")]
    UnknownPair(PairId),

    /// The pair is not present in the registry (order admission).
    #[error("VM_ERR_302: Pair not found: {0}")]
    PairNotFound(PairId),

    /// The pair exists but is deactivated.
    #[error("VM_ERR_303: Pair is inactive: {0}")]
    PairInactive(PairId),

    // =================================================================
    // Escrow errors (4xx)
    // =================================================================
    /// The attested escrow does not cover the order's requirement.
    #[error("VM_ERR_400: Insufficient escrow: required {required}, attested {attested}")]
    InsufficientEscrow { required: u64, attested: u64 },

    /// A release would drive a committed balance negative.
    #[error("VM_ERR_401: Escrow underflow for {owner}/{token}: requested {requested}, committed {committed}")]
    EscrowUnderflow {
        owner: OwnerId,
        token: TokenId,
        requested: u64,
        committed: u64,
    },

    /// The core's committed view diverged from the ledger's.
    #[error("VM_ERR_402: Escrow desync for {owner}/{token}: internal {internal}, external {external}")]
    EscrowDesync {
        owner: OwnerId,
        token: TokenId,
        internal: u64,
        external: u64,
    },

    /// The owner is quarantined after a desync; mutations refused until resync.
    #[error("VM_ERR_403: Owner is desynced and quarantined: {0}")]
    OwnerDesynced(OwnerId),

    // =================================================================
    // Settlement / ledger errors (5xx)
    // =================================================================
    /// The ledger collaborator rejected a proposal.
    #[error("VM_ERR_500: Ledger nack: {reason}")]
    LedgerNack { reason: String },

    // =================================================================
    // Fatal / internal (9xx)
    // =================================================================
    /// Checked narrowing of a widened multiplication failed.
    #[error("VM_ERR_900: Amount overflow: {context}")]
    AmountOverflow { context: String },

    /// A structural invariant of the order/tick index was violated.
    #[error("VM_ERR_901: Index invariant violated: {reason}")]
    IndexInvariantViolated { reason: String },

    /// A ledger sequence number was replayed with different contents.
    #[error("VM_ERR_902: Conflicting replay of ledger sequence {sequence}")]
    DuplicateLedgerEvent { sequence: u64 },

    /// A fatal error tripped the sticky halt; commands refused until reset.
    #[error("VM_ERR_903: Core halted: {reason}")]
    CoreHalted { reason: String },
}

impl CoreError {
    /// Whether this error must trip the facade's sticky halt flag.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EscrowDesync { .. }
                | Self::IndexInvariantViolated { .. }
                | Self::DuplicateLedgerEvent { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Why a candidate `(buy, sell)` pair may not legally cross.
///
/// Terminal rejections can never heal (the same two orders will fail the same
/// way forever); retriable ones may succeed on a later scan once state moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRejection {
    /// The two orders reference different pairs.
    PairMismatch,
    /// Buyer and seller are the same principal (self-trade).
    SameOwner,
    /// `buy.limit_price < sell.limit_price`.
    PricesDoNotCross,
    /// The declared tick ranges do not intersect.
    NoTickOverlap,
    /// One side is already fully filled or no longer live.
    EitherAlreadyFilled,
    /// The midpoint price falls outside the overlap tick interval.
    OverlapPriceOutOfBounds,
}

impl MatchRejection {
    /// Terminal rejections evict the candidate; retriable ones return it to
    /// the scan queue.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SameOwner | Self::PricesDoNotCross)
    }
}

impl std::fmt::Display for MatchRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PairMismatch => "pair mismatch",
            Self::SameOwner => "self-trade",
            Self::PricesDoNotCross => "prices do not cross",
            Self::NoTickOverlap => "no tick overlap",
            Self::EitherAlreadyFilled => "either side already filled",
            Self::OverlapPriceOutOfBounds => "overlap price out of bounds",
        };
        f.write_str(s)
    }
}
