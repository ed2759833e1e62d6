//! Membership ledger: slot admission and removal on a [`Pool`].
//!
//! `member_count` counts occupied *slots*. An account holding two peer
//! ids occupies two slots but appears once in the member list.

use super::ids::{AccountId, PeerId};
use super::indexed_set::IndexedSet;
use super::pool::Pool;
use crate::error::PoolError;

/// A slot released by [`Pool::remove_peer`], carrying what must be refunded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSlot {
    /// Owner of the released slot.
    pub account: AccountId,
    /// Peer id that occupied the slot.
    pub peer_id: PeerId,
    /// Collateral snapshot recorded at admission.
    pub locked_tokens: u128,
    /// `true` if the account held no other slot and left the member list.
    pub account_removed: bool,
}

impl Pool {
    /// Slots counted against `max_members`: members plus live requests.
    #[must_use]
    pub fn occupied_slots(&self) -> u64 {
        self.member_count
            .saturating_add(self.pending.len() as u64)
    }

    /// Checks that one more slot fits under `max_members`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CapacityReached`] when the pool is full.
    pub fn ensure_capacity(&self) -> Result<(), PoolError> {
        let max = self.params.max_members;
        if max != 0 && self.occupied_slots() >= max {
            return Err(PoolError::CapacityReached {
                pool_id: self.id,
                max_members: max,
            });
        }
        Ok(())
    }

    /// Returns `true` if `peer` occupies a slot in this pool.
    #[must_use]
    pub fn is_peer_member(&self, peer: &PeerId) -> bool {
        self.peer_to_member.contains_key(peer)
    }

    /// Returns `true` if `account` holds at least one slot.
    #[must_use]
    pub fn is_member(&self, account: &AccountId) -> bool {
        self.members.contains(account)
    }

    /// Admits `peer` as a slot owned by `account` with a collateral snapshot.
    ///
    /// Capacity and identity checks are the caller's responsibility; this
    /// only guards the pool-local uniqueness of `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PeerAlreadyMember`] if `peer` is already bound
    /// in this pool.
    pub fn add_member(
        &mut self,
        account: &AccountId,
        peer: &PeerId,
        locked_tokens: u128,
    ) -> Result<(), PoolError> {
        if self.peer_to_member.contains_key(peer) {
            return Err(PoolError::PeerAlreadyMember {
                pool_id: self.id,
                peer_id: peer.clone(),
            });
        }

        self.peer_to_member.insert(peer.clone(), account.clone());
        self.member_peers
            .entry(account.clone())
            .or_insert_with(IndexedSet::new)
            .insert(peer.clone());
        self.members.insert(account.clone());
        self.member_count = self.member_count.saturating_add(1);
        self.locked_tokens.insert(peer.clone(), locked_tokens);
        Ok(())
    }

    /// Releases the slot of `peer`. Returns `None` if `peer` holds no slot.
    pub fn remove_peer(&mut self, peer: &PeerId) -> Option<RemovedSlot> {
        let account = self.peer_to_member.remove(peer)?;
        let locked_tokens = self.locked_tokens.remove(peer).unwrap_or(0);

        let mut account_removed = false;
        if let Some(peers) = self.member_peers.get_mut(&account) {
            peers.remove(peer);
            if peers.is_empty() {
                self.member_peers.remove(&account);
                self.members.remove(&account);
                account_removed = true;
            }
        }
        self.member_count = self.member_count.saturating_sub(1);

        Some(RemovedSlot {
            account,
            peer_id: peer.clone(),
            locked_tokens,
            account_removed,
        })
    }
}
