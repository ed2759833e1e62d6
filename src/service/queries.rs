//! Read-only views over the core state.
//!
//! Queries are not gated by the pause switch but still enter the
//! serialized core, so a token-ledger callback cannot observe a
//! half-applied mutation.

use super::pool_service::PoolService;
use crate::custody::ClaimKey;
use crate::domain::{
    AccountId, JoinRequestView, MemberSlots, PeerBinding, PeerId, PoolId, PoolSummary,
};
use crate::error::PoolError;

impl PoolService {
    /// Summary of one pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn pool(&self, pool_id: PoolId) -> Result<PoolSummary, PoolError> {
        let core = self.read()?;
        Ok(PoolSummary::from(core.pools.get(pool_id)?))
    }

    /// Summaries of all pools, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn list_pools(&self) -> Result<Vec<PoolSummary>, PoolError> {
        Ok(self.read()?.pools.list())
    }

    /// Member accounts of a pool with their slots, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn pool_members(&self, pool_id: PoolId) -> Result<Vec<MemberSlots>, PoolError> {
        let core = self.read()?;
        Ok(core.pools.get(pool_id)?.member_slots())
    }

    /// Pending join requests of a pool, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn pending_requests(&self, pool_id: PoolId) -> Result<Vec<JoinRequestView>, PoolError> {
        let core = self.read()?;
        let pool = core.pools.get(pool_id)?;
        Ok(pool
            .pending_requests()
            .iter()
            .filter_map(|peer| core.requests.get(peer))
            .map(JoinRequestView::from)
            .collect())
    }

    /// The live join request of `peer` in `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::JoinRequestNotFound`] or [`PoolError::Reentrant`].
    pub fn join_request(&self, pool_id: PoolId, peer: &PeerId) -> Result<JoinRequestView, PoolError> {
        let core = self.read()?;
        Ok(JoinRequestView::from(core.requests.get_in_pool(pool_id, peer)?))
    }

    /// Whether `peer` holds a slot in `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn is_peer_member(&self, pool_id: PoolId, peer: &PeerId) -> Result<bool, PoolError> {
        let core = self.read()?;
        Ok(core.pools.get(pool_id)?.is_peer_member(peer))
    }

    /// Collateral snapshot of `peer`'s slot (0 if none).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn locked_tokens(&self, pool_id: PoolId, peer: &PeerId) -> Result<u128, PoolError> {
        let core = self.read()?;
        Ok(core.pools.get(pool_id)?.locked_tokens(peer))
    }

    /// Occupied slot count of a pool (members only, no pending requests).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] or [`PoolError::Reentrant`].
    pub fn total_members(&self, pool_id: PoolId) -> Result<u64, PoolError> {
        let core = self.read()?;
        Ok(core.pools.get(pool_id)?.member_count)
    }

    /// Whether `account` is a member of any pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn is_member_of_any_pool(&self, account: &AccountId) -> Result<bool, PoolError> {
        let core = self.read()?;
        Ok(core.pools.iter().any(|pool| pool.is_member(account)))
    }

    /// Outstanding claimable amount under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn claimable(&self, key: &ClaimKey) -> Result<u128, PoolError> {
        let core = self.read()?;
        Ok(core.claimable.get(key).map_or(0, |entry| entry.amount))
    }

    /// Whether `account` is forfeited.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn is_forfeited(&self, account: &AccountId) -> Result<bool, PoolError> {
        Ok(self.read()?.is_forfeited(account))
    }

    /// Current identity binding of `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn peer_binding(&self, peer: &PeerId) -> Result<Option<PeerBinding>, PoolError> {
        Ok(self.read()?.peers.get(peer).cloned())
    }

    /// Token balance held by the custody account.
    #[must_use]
    pub fn custody_balance(&self) -> u128 {
        self.custody.balance()
    }

    /// Token balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.custody.balance_of(account)
    }

    /// Allowance `account` granted to the custody account.
    #[must_use]
    pub fn allowance_of(&self, account: &AccountId) -> u128 {
        self.custody.allowance_of(account)
    }

    /// Total outstanding claimable balance.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`].
    pub fn total_claimable(&self) -> Result<u128, PoolError> {
        Ok(self.read()?.claimable.total())
    }
}
