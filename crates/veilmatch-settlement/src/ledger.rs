//! The ledger collaborator's capability interface.
//!
//! Submission is a non-blocking sink: the core hands a proposal over and
//! carries on; acknowledgement and rejection arrive later as
//! `SettlementCommitted` / `SettlementRejected` ledger events, and a
//! proposal that never resolves is timed out by the engine. The ledger
//! guarantees at most one in-flight proposal per `(buy, sell)` pair — the
//! engine enforces the same bound on its side through the reservation book.

use veilmatch_types::{Result, SettlementProposal};

/// Capability handle to the ledger collaborator.
pub trait Ledger {
    /// Enqueue a settlement proposal for on-chain witnessing.
    ///
    /// # Errors
    /// An immediate error is treated like a nack (retriable, then
    /// suppressed); it must not leave the proposal half-submitted.
    fn submit_proposal(&mut self, proposal: &SettlementProposal) -> Result<()>;
}

/// Test double that records every submission.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
pub struct RecordingLedger {
    pub submitted: Vec<SettlementProposal>,
    /// When set, submissions fail with a `LedgerNack`.
    pub fail_submissions: bool,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent submission, if any.
    #[must_use]
    pub fn last(&self) -> Option<&SettlementProposal> {
        self.submitted.last()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Ledger for RecordingLedger {
    fn submit_proposal(&mut self, proposal: &SettlementProposal) -> Result<()> {
        if self.fail_submissions {
            return Err(veilmatch_types::CoreError::LedgerNack {
                reason: "submission refused".into(),
            });
        }
        self.submitted.push(proposal.clone());
        Ok(())
    }
}
