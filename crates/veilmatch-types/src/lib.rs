//! # veilmatch-types
//!
//! Shared types, errors, and configuration for the **VeilMatch** matching core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`OwnerId`], [`PairId`], [`TokenId`], [`ProposalId`]
//! - **Pair model**: [`Pair`] with its tick lattice
//! - **Order model**: [`Order`], [`Side`], [`OrderStatus`]
//! - **Proposal model**: [`SettlementProposal`]
//! - **Ledger events**: [`LedgerEvent`]
//! - **Configuration**: [`CoreConfig`]
//! - **Errors**: [`CoreError`] with `VM_ERR_` prefix codes, [`MatchRejection`]
//! - **Numeric helpers**: checked basis-point arithmetic in [`numeric`]
//! - **Constants**: system-wide defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod pair;
pub mod proposal;

// Re-export all primary types at crate root for ergonomic imports:
//   use veilmatch_types::{Order, Side, SettlementProposal, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use pair::*;
pub use proposal::*;

// Constants are accessed via `veilmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
