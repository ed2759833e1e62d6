//! Global peer identity registry.
//!
//! Maps each peer id to the account that owns it and, once committed,
//! the single pool it belongs to. Bindings are never silently overwritten.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::ids::{AccountId, PeerId, PoolId};
use crate::error::PoolError;

/// Owner and pool of a bound peer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PeerBinding {
    /// Owning account.
    pub account: AccountId,
    /// Pool the peer id is committed to, if any.
    pub pool_id: Option<PoolId>,
}

/// Peer id → (account, pool) map shared by every pool.
#[derive(Debug, Default)]
pub struct PeerIdentityRegistry {
    bindings: HashMap<PeerId, PeerBinding>,
}

impl PeerIdentityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates that `peer` may be bound to `account` in `pool_id`
    /// without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PeerBound`] if `peer` belongs to another
    /// account, or is committed to a different pool.
    pub fn check(
        &self,
        peer: &PeerId,
        account: &AccountId,
        pool_id: Option<PoolId>,
    ) -> Result<(), PoolError> {
        let Some(existing) = self.bindings.get(peer) else {
            return Ok(());
        };
        let same_account = existing.account == *account;
        let pool_compatible = match (existing.pool_id, pool_id) {
            (None, _) => true,
            (Some(bound), Some(requested)) => bound == requested,
            (Some(_), None) => false,
        };
        if same_account && pool_compatible {
            Ok(())
        } else {
            Err(PoolError::PeerBound {
                peer_id: peer.clone(),
            })
        }
    }

    /// Binds `peer` to `account` (and `pool_id`, when given).
    ///
    /// Returns `true` if the binding did not exist before. Re-binding by
    /// the same account to the same pool, or committing an unpooled
    /// binding to a pool, is allowed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::check`].
    pub fn bind(
        &mut self,
        peer: &PeerId,
        account: &AccountId,
        pool_id: Option<PoolId>,
    ) -> Result<bool, PoolError> {
        self.check(peer, account, pool_id)?;
        let fresh = !self.bindings.contains_key(peer);
        let entry = self
            .bindings
            .entry(peer.clone())
            .or_insert_with(|| PeerBinding {
                account: account.clone(),
                pool_id: None,
            });
        if pool_id.is_some() {
            entry.pool_id = pool_id;
        }
        Ok(fresh)
    }

    /// Clears the binding of `peer`.
    pub fn unbind(&mut self, peer: &PeerId) -> Option<PeerBinding> {
        self.bindings.remove(peer)
    }

    /// Current binding of `peer`.
    #[must_use]
    pub fn get(&self, peer: &PeerId) -> Option<&PeerBinding> {
        self.bindings.get(peer)
    }
}
