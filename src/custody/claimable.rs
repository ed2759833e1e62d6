//! Claimable ledger: collateral owed but not yet delivered.
//!
//! Entries are created when a refund's direct transfer fails and are
//! drained only by their owner through an explicit claim.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, PeerId};
use crate::error::PoolError;

/// Key under which an undelivered amount is credited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ClaimKey {
    /// Credit addressed to an account (creator escrow, burn sink).
    Account(AccountId),
    /// Credit addressed to a released slot.
    Peer(PeerId),
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(account) => write!(f, "account:{account}"),
            Self::Peer(peer) => write!(f, "peer:{peer}"),
        }
    }
}

/// Claimable balance and the only account allowed to drain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimEntry {
    /// Rightful owner.
    pub owner: AccountId,
    /// Outstanding amount.
    pub amount: u128,
}

/// Fallback escrow for failed refunds.
#[derive(Debug, Default)]
pub struct ClaimableLedger {
    entries: HashMap<ClaimKey, ClaimEntry>,
}

impl ClaimableLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to `owner` under `key` and returns the key used.
    ///
    /// A peer key already owed to a different account is left untouched;
    /// the credit then lands on the owner's account key instead.
    pub fn credit(&mut self, key: ClaimKey, owner: &AccountId, amount: u128) -> ClaimKey {
        let key = match self.entries.get(&key) {
            Some(entry) if entry.owner != *owner => ClaimKey::Account(owner.clone()),
            _ => key,
        };
        let entry = self.entries.entry(key.clone()).or_insert_with(|| ClaimEntry {
            owner: owner.clone(),
            amount: 0,
        });
        entry.amount = entry.amount.saturating_add(amount);
        key
    }

    /// Outstanding entry under `key`.
    #[must_use]
    pub fn get(&self, key: &ClaimKey) -> Option<&ClaimEntry> {
        self.entries.get(key)
    }

    /// Removes the entry under `key` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NothingToClaim`] if the balance is zero or
    /// absent, and [`PoolError::Forbidden`] if `caller` is not the owner.
    pub fn take(&mut self, key: &ClaimKey, caller: &AccountId) -> Result<ClaimEntry, PoolError> {
        let Some(entry) = self.entries.get(key) else {
            return Err(PoolError::NothingToClaim(key.to_string()));
        };
        if entry.owner != *caller {
            return Err(PoolError::Forbidden(format!(
                "{caller} does not own claimable balance {key}"
            )));
        }
        if entry.amount == 0 {
            return Err(PoolError::NothingToClaim(key.to_string()));
        }
        self.entries
            .remove(key)
            .ok_or_else(|| PoolError::NothingToClaim(key.to_string()))
    }

    /// Puts back an entry taken by [`Self::take`] whose payout failed.
    pub fn restore(&mut self, key: ClaimKey, entry: ClaimEntry) {
        let _ = self.credit(key, &entry.owner, entry.amount);
    }

    /// Total owed across all entries.
    #[must_use]
    pub fn total(&self) -> u128 {
        self.entries
            .values()
            .fold(0u128, |acc, e| acc.saturating_add(e.amount))
    }
}
