//! # veilmatch-core
//!
//! The single-threaded entry point of the **VeilMatch** matching core.
//!
//! [`CoreFacade`] owns every piece of in-memory state — pair registry,
//! order store, tick index, escrow ledger, and the settlement engine's
//! reservation book — and serialises all mutations:
//!
//! ```text
//! commands ──▶ Validator ──▶ OrderStore + TickIndex + EscrowLedger
//!                                   │
//! scan_and_match ──▶ MatchScanner ──▶ SettlementEngine ──▶ Ledger
//!                                   ▲
//! ledger events ────────────────────┘  (acks, nacks, pair + escrow state)
//! ```
//!
//! There are no suspension points inside the core: the ledger capability is
//! a non-blocking sink and acknowledgements arrive as events, so one facade
//! instance per pair is free of invariant races by construction. The core
//! persists nothing — on startup [`CoreFacade::replay`] rebuilds the whole
//! working set from the ledger's event stream.

pub mod clock;
pub mod facade;
mod replay;

pub use clock::{Clock, ManualClock, SystemClock};
pub use facade::{CoreFacade, SubmitOrder};
