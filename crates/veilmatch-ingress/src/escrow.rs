//! Per-owner, per-token escrow accounting.
//!
//! The ledger custodies the actual tokens; this structure is the core's
//! accounting view and the sole authority for "sufficient collateral"
//! checks. If the ledger's view and this one ever diverge, the owner is
//! quarantined: every commit or release for them fails until a supervisor
//! resynchronises.

use std::collections::{HashMap, HashSet};

use veilmatch_types::{CoreError, OwnerId, Result, TokenId};

/// Committed-amount ledger across all owners this core serves.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    committed: HashMap<(OwnerId, TokenId), u64>,
    desynced: HashSet<OwnerId>,
}

impl EscrowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase an owner's committed balance.
    ///
    /// # Errors
    /// `OwnerDesynced` if the owner is quarantined; `AmountOverflow` if the
    /// balance would exceed `u64`.
    pub fn commit(&mut self, owner: OwnerId, token: TokenId, amount: u64) -> Result<()> {
        self.ensure_synced(owner)?;
        let entry = self.committed.entry((owner, token)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("escrow commit for {owner}/{token}"),
            })?;
        Ok(())
    }

    /// Decrease an owner's committed balance, pruning zeroed entries.
    ///
    /// # Errors
    /// `OwnerDesynced` if quarantined; `EscrowUnderflow` if `amount`
    /// exceeds the committed balance.
    pub fn release(&mut self, owner: OwnerId, token: TokenId, amount: u64) -> Result<()> {
        self.ensure_synced(owner)?;
        let committed = self.committed.get_mut(&(owner, token)).ok_or(
            CoreError::EscrowUnderflow {
                owner,
                token,
                requested: amount,
                committed: 0,
            },
        )?;
        if amount > *committed {
            return Err(CoreError::EscrowUnderflow {
                owner,
                token,
                requested: amount,
                committed: *committed,
            });
        }
        *committed -= amount;
        if *committed == 0 {
            self.committed.remove(&(owner, token));
        }
        Ok(())
    }

    /// Current committed balance; zero for unseen entries.
    #[must_use]
    pub fn committed(&self, owner: OwnerId, token: TokenId) -> u64 {
        self.committed.get(&(owner, token)).copied().unwrap_or(0)
    }

    /// Reconcile against the ledger's externally-observed committed amount.
    ///
    /// On a match, any previous quarantine for the owner is lifted. On a
    /// mismatch, the owner is quarantined and [`CoreError::EscrowDesync`] is
    /// surfaced for the facade to act on.
    pub fn sync(&mut self, owner: OwnerId, token: TokenId, external: u64) -> Result<()> {
        let internal = self.committed(owner, token);
        if internal == external {
            self.desynced.remove(&owner);
            return Ok(());
        }
        self.desynced.insert(owner);
        tracing::warn!(
            owner = %owner,
            token = %token,
            internal,
            external,
            "Escrow desync detected; owner quarantined"
        );
        Err(CoreError::EscrowDesync {
            owner,
            token,
            internal,
            external,
        })
    }

    /// Supervisor override: adopt the external amount and lift quarantine.
    pub fn resync(&mut self, owner: OwnerId, token: TokenId, external: u64) {
        if external == 0 {
            self.committed.remove(&(owner, token));
        } else {
            self.committed.insert((owner, token), external);
        }
        self.desynced.remove(&owner);
        tracing::info!(owner = %owner, token = %token, external, "Escrow resynchronised");
    }

    #[must_use]
    pub fn is_desynced(&self, owner: &OwnerId) -> bool {
        self.desynced.contains(owner)
    }

    /// All non-zero entries, for the invariant auditor.
    pub fn entries(&self) -> impl Iterator<Item = ((OwnerId, TokenId), u64)> + '_ {
        self.committed.iter().map(|(k, v)| (*k, *v))
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.committed.len()
    }

    fn ensure_synced(&self, owner: OwnerId) -> Result<()> {
        if self.desynced.contains(&owner) {
            return Err(CoreError::OwnerDesynced(owner));
        }
        Ok(())
    }
}
