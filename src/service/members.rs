//! Slot removal: single peers and batch eviction.

use chrono::{DateTime, Utc};

use super::pool_service::{CoreState, PoolService, claimable_event};
use crate::custody::{ClaimKey, RefundOutcome};
use crate::domain::{AccountId, PeerId, PoolEvent, PoolId};
use crate::error::PoolError;

impl PoolService {
    /// Releases one membership slot and refunds its collateral snapshot.
    ///
    /// Allowed for the slot owner, the pool creator, or a privileged
    /// account. A failed refund does not abort the removal; it is
    /// reported in the returned outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::PoolNotFound`],
    /// [`PoolError::PeerNotMember`], or [`PoolError::Forbidden`].
    pub fn remove_member_peer(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        peer: &PeerId,
    ) -> Result<RefundOutcome, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        let pool = core.pools.get(pool_id)?;
        let Some(owner) = pool.member_of_peer(peer) else {
            return Err(PoolError::PeerNotMember {
                pool_id,
                peer_id: peer.clone(),
            });
        };
        if owner != caller && pool.creator != *caller && !self.roles.is_privileged(caller) {
            return Err(PoolError::Forbidden(format!(
                "{caller} may not remove peer {peer}"
            )));
        }

        let mut events = Vec::new();
        let outcome = self.evict_peer(core, pool_id, peer, now, &mut events)?;
        drop(guard);

        self.event_bus.publish_all(events);
        Ok(outcome)
    }

    /// Evicts up to `count` member accounts, most recently indexed first,
    /// releasing every slot they hold.
    ///
    /// When the caller is the pool creator the creator is never evicted
    /// and at least one member always remains. Returns the evicted
    /// accounts in eviction order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::PoolNotFound`], or
    /// [`PoolError::Forbidden`] unless the caller is the creator or
    /// privileged.
    pub fn remove_members_batch(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        count: usize,
    ) -> Result<Vec<AccountId>, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        let pool = core.pools.get(pool_id)?;
        let by_creator = pool.creator == *caller;
        if !by_creator && !self.roles.is_privileged(caller) {
            return Err(PoolError::Forbidden(format!(
                "{caller} may not batch-remove members of pool {pool_id}"
            )));
        }

        let members = pool.members();
        let limit = if by_creator {
            count.min(members.len().saturating_sub(1))
        } else {
            count
        };
        let victims: Vec<AccountId> = members
            .iter()
            .rev()
            .filter(|account| !(by_creator && **account == pool.creator))
            .take(limit)
            .cloned()
            .collect();

        let mut events = Vec::new();
        for account in &victims {
            let peers = core.pools.get(pool_id)?.peers_of(account).to_vec();
            for peer in &peers {
                // Reported through the MemberRemoved event.
                let _outcome = self.evict_peer(core, pool_id, peer, now, &mut events)?;
            }
        }
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(%pool_id, by = %caller, evicted = victims.len(), "batch removal");
        Ok(victims)
    }

    /// Releases `peer`'s slot, frees its identity binding, and refunds the
    /// snapshot (burned for a forfeited owner).
    pub(super) fn evict_peer(
        &self,
        core: &mut CoreState,
        pool_id: PoolId,
        peer: &PeerId,
        now: DateTime<Utc>,
        events: &mut Vec<PoolEvent>,
    ) -> Result<RefundOutcome, PoolError> {
        let pool = core.pools.get_mut(pool_id)?;
        let Some(slot) = pool.remove_peer(peer) else {
            return Err(PoolError::PeerNotMember {
                pool_id,
                peer_id: peer.clone(),
            });
        };
        pool.updated_at = now;
        core.peers.unbind(peer);

        let forfeited = core.forfeited.contains(&slot.account);
        let outcome = self.custody.refund(
            &mut core.claimable,
            ClaimKey::Peer(peer.clone()),
            &slot.account,
            slot.locked_tokens,
            forfeited,
        );
        tracing::info!(
            %pool_id,
            account = %slot.account,
            peer_id = %peer,
            amount = slot.locked_tokens,
            forfeited,
            "member slot released"
        );
        events.extend(claimable_event(Some(pool_id), &outcome, now));
        events.push(PoolEvent::MemberRemoved {
            pool_id,
            account: slot.account,
            peer_id: slot.peer_id,
            forfeited,
            refund: outcome.clone(),
            timestamp: now,
        });
        Ok(outcome)
    }
}
