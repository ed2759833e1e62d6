//! Admin controls: forfeiture, claims, and emergency recovery.

use super::pool_service::PoolService;
use crate::custody::ClaimKey;
use crate::domain::{AccountId, PoolEvent};
use crate::error::PoolError;

impl PoolService {
    /// Sets or clears the forfeiture flag of `account`.
    ///
    /// Returns `true` if the flag changed; an unchanged flag emits no
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`] or [`PoolError::Forbidden`].
    pub fn set_forfeit_flag(
        &self,
        caller: &AccountId,
        account: &AccountId,
        forfeited: bool,
    ) -> Result<bool, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        self.require_pool_admin(caller)?;

        let changed = if forfeited {
            guard.forfeited.insert(account.clone())
        } else {
            guard.forfeited.remove(account)
        };
        drop(guard);

        if changed {
            let _ = self.event_bus.publish(PoolEvent::ForfeitureUpdated {
                account: account.clone(),
                forfeited,
                timestamp: now,
            });
            tracing::warn!(%account, forfeited, by = %caller, "forfeiture flag updated");
        }
        Ok(changed)
    }

    /// Pays out the claimable balance under `key` to its owner.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::NothingToClaim`],
    /// [`PoolError::Forbidden`] when `caller` does not own the entry, or
    /// [`PoolError::TransferFailed`] (the entry is kept).
    pub fn claim_tokens(&self, caller: &AccountId, key: &ClaimKey) -> Result<u128, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let amount = self.custody.claim(&mut guard.claimable, key, caller)?;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::TokensClaimed {
            owner: caller.clone(),
            key: key.to_string(),
            amount: amount.to_string(),
            timestamp: now,
        });
        tracing::info!(owner = %caller, %key, amount, "claimable tokens paid out");
        Ok(amount)
    }

    /// Sweeps up to `amount` of the custody balance to the burn sink.
    ///
    /// Returns the amount actually swept (clamped to the balance). Slot
    /// snapshots and claimable entries are not adjusted.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forbidden`], or
    /// [`PoolError::TransferFailed`].
    pub fn emergency_recover_tokens(
        &self,
        caller: &AccountId,
        amount: u128,
    ) -> Result<u128, PoolError> {
        let now = self.clock.now();
        let guard = self.begin()?;
        self.require_admin(caller)?;
        let swept = self.custody.sweep(amount)?;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::EmergencyRecovery {
            admin: caller.clone(),
            amount: swept.to_string(),
            timestamp: now,
        });
        tracing::warn!(admin = %caller, requested = amount, swept, "emergency token recovery");
        Ok(swept)
    }
}
