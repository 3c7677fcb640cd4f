//! # veilmatch-matchcore
//!
//! The in-memory matching structures of the VeilMatch core:
//!
//! - [`OrderStore`]: id-keyed store of active orders with checked mutation
//! - [`TickBucket`]: per-(pair, tick) ordered buy/sell sets
//! - [`TickIndex`]: two-level `pair → tick → bucket` index with overlap queries
//! - [`validator`]: pure submission and match-legality checks
//! - [`scan_pair`]: candidate enumeration ordered by projected profitability
//!
//! Everything here is synchronous and side-effect-free with respect to the
//! outside world; escrow accounting and settlement live in sibling crates.

pub mod order_store;
pub mod scanner;
pub mod tick_bucket;
pub mod tick_index;
pub mod validator;

pub use order_store::OrderStore;
pub use scanner::{scan_pair, MatchCandidate};
pub use tick_bucket::TickBucket;
pub use tick_index::TickIndex;
