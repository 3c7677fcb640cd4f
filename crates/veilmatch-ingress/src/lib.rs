//! # veilmatch-ingress
//!
//! Admission-side state of the VeilMatch core:
//!
//! - [`PairRegistry`]: event-sourced token-pair metadata
//! - [`EscrowLedger`]: per-(owner, token) committed-amount accounting
//!
//! Neither component holds real tokens or authorises anything on its own;
//! the registry only ingests pair state the ledger already decided, and the
//! escrow ledger is the core's accounting view of collateral the chain
//! custodies.

pub mod escrow;
pub mod pair_registry;

pub use escrow::EscrowLedger;
pub use pair_registry::PairRegistry;
