//! Ledger events consumed by the matching core.
//!
//! The core never parses wire payloads; the ledger collaborator hands it
//! fully-typed events. Each event arrives with a monotonically increasing
//! sequence number; [`LedgerEvent::digest`] gives a stable fingerprint so a
//! replayed sequence can be told apart from a conflicting one.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::{OrderId, OwnerId, PairId, Tick, TokenId};
use crate::order::Side;

/// An event produced by the ledger collaborator's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    PairRegistered {
        pair_id: PairId,
        base_token_id: TokenId,
        quote_token_id: TokenId,
        tick_size: u64,
        max_tick_range: u64,
    },
    PairDeactivated {
        pair_id: PairId,
    },
    PairReactivated {
        pair_id: PairId,
    },
    OrderObserved {
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
    },
    OrderCancelledOnChain {
        order_id: OrderId,
    },
    SettlementCommitted {
        buy_id: OrderId,
        sell_id: OrderId,
        fill_qty: u64,
        exec_price: u64,
        block_height: u64,
    },
    SettlementRejected {
        buy_id: OrderId,
        sell_id: OrderId,
        reason: String,
    },
    EscrowSync {
        owner: OwnerId,
        token_id: TokenId,
        external_committed: u64,
    },
}

impl LedgerEvent {
    /// Short kind tag for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PairRegistered { .. } => "pair_registered",
            Self::PairDeactivated { .. } => "pair_deactivated",
            Self::PairReactivated { .. } => "pair_reactivated",
            Self::OrderObserved { .. } => "order_observed",
            Self::OrderCancelledOnChain { .. } => "order_cancelled_on_chain",
            Self::SettlementCommitted { .. } => "settlement_committed",
            Self::SettlementRejected { .. } => "settlement_rejected",
            Self::EscrowSync { .. } => "escrow_sync",
        }
    }

    /// Stable content fingerprint:
    /// `SHA-256(domain_sep || kind || fields in declaration order)`.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"veilmatch:event:v1:");
        hasher.update(self.kind().as_bytes());
        match self {
            Self::PairRegistered {
                pair_id,
                base_token_id,
                quote_token_id,
                tick_size,
                max_tick_range,
            } => {
                hasher.update(pair_id.0.to_le_bytes());
                hasher.update(base_token_id.0.to_le_bytes());
                hasher.update(quote_token_id.0.to_le_bytes());
                hasher.update(tick_size.to_le_bytes());
                hasher.update(max_tick_range.to_le_bytes());
            }
            Self::PairDeactivated { pair_id } | Self::PairReactivated { pair_id } => {
                hasher.update(pair_id.0.to_le_bytes());
            }
            Self::OrderObserved {
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
            } => {
                hasher.update(order_id.as_bytes());
                hasher.update(owner.as_bytes());
                hasher.update(pair_id.0.to_le_bytes());
                hasher.update([matches!(side, Side::Buy) as u8]);
                hasher.update(tick_lower.to_le_bytes());
                hasher.update(tick_upper.to_le_bytes());
                hasher.update(limit_price.to_le_bytes());
                hasher.update(quantity.to_le_bytes());
                hasher.update(escrow_amount.to_le_bytes());
                hasher.update(created_at.to_le_bytes());
            }
            Self::OrderCancelledOnChain { order_id } => {
                hasher.update(order_id.as_bytes());
            }
            Self::SettlementCommitted {
                buy_id,
                sell_id,
                fill_qty,
                exec_price,
                block_height,
            } => {
                hasher.update(buy_id.as_bytes());
                hasher.update(sell_id.as_bytes());
                hasher.update(fill_qty.to_le_bytes());
                hasher.update(exec_price.to_le_bytes());
                hasher.update(block_height.to_le_bytes());
            }
            Self::SettlementRejected {
                buy_id,
                sell_id,
                reason,
            } => {
                hasher.update(buy_id.as_bytes());
                hasher.update(sell_id.as_bytes());
                hasher.update(reason.as_bytes());
            }
            Self::EscrowSync {
                owner,
                token_id,
                external_committed,
            } => {
                hasher.update(owner.as_bytes());
                hasher.update(token_id.0.to_le_bytes());
                hasher.update(external_committed.to_le_bytes());
            }
        }
        hasher.finalize().into()
    }
}
