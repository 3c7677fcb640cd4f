//! Identifiers used throughout VeilMatch.
//!
//! `OrderId` and `OwnerId` are opaque 32-byte values supplied by the ledger
//! (field elements on the chain side); the core never mints them. `ProposalId`
//! is the one identifier the core generates, derived deterministically so a
//! retry of the same candidate produces a predictable id.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Opaque order identifier supplied by the submitter (a field element on
/// chain). Uniqueness is a submission precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub [u8; 32]);

impl OrderId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build an id with `n` in the low 8 bytes. Convenient for hosts that
    /// derive ids from counters, and for tests.
    #[must_use]
    pub fn from_low(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// OwnerId
// ---------------------------------------------------------------------------

/// Opaque principal identifier (the submitting account's public commitment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwnerId(pub [u8; 32]);

impl OwnerId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_low(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// PairId / TokenId / Tick
// ---------------------------------------------------------------------------

/// Identifier for a trading pair, assigned by the ledger at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PairId(pub u64);

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair:{}", self.0)
    }
}

/// Opaque token identifier (the ledger's token record id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

/// Index into a pair's price lattice. Tick `t` covers prices
/// `[t · tick_size, (t + 1) · tick_size)` in basis points.
pub type Tick = u64;

// ---------------------------------------------------------------------------
// ProposalId
// ---------------------------------------------------------------------------

/// Identifier for a settlement proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ProposalId(pub Uuid);

impl ProposalId {
    /// Deterministic `ProposalId` from the candidate pair and attempt number.
    ///
    /// A retry of the same `(buy, sell)` candidate carries a fresh attempt
    /// counter and therefore a distinct id, while a replayed submission of the
    /// same attempt is recognisable by the ledger as the same proposal.
    #[must_use]
    pub fn deterministic(buy: OrderId, sell: OrderId, attempt: u32) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"veilmatch:proposal_id:v1:");
        hasher.update(buy.as_bytes());
        hasher.update(sell.as_bytes());
        hasher.update(attempt.to_le_bytes());
        let hash = hasher.finalize();
        let bytes: [u8; 16] = hash[..16].try_into().expect("SHA-256 produces 32 bytes");
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prop:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
