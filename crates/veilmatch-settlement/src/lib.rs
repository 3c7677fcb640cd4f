//! # veilmatch-settlement
//!
//! The settlement half of the VeilMatch core:
//!
//! - [`Ledger`]: the capability interface to the ledger collaborator
//! - [`ReservationBook`]: shadow reservations for in-flight proposals
//! - [`SuppressionList`]: retry counting and livelock suppression
//! - [`SequenceWindow`]: ledger-event idempotency window
//! - [`SettlementEngine`]: the per-candidate state machine
//!
//! A proposal is speculative until the ledger acknowledges it. Between
//! emission and acknowledgement the proposed quantities are held in shadow
//! reservations — invisible to persisted fills, but subtracted from every
//! subsequent scan so the same liquidity is never promised twice.

pub mod engine;
pub mod ledger;
pub mod reservation;
pub mod sequence;
pub mod suppression;

pub use engine::{RejectOutcome, SettlementEngine};
pub use ledger::Ledger;
pub use reservation::{PendingSettlement, ReservationBook, SettlementState};
pub use sequence::{SequenceCheck, SequenceWindow};
pub use suppression::SuppressionList;

#[cfg(any(test, feature = "test-helpers"))]
pub use ledger::RecordingLedger;
