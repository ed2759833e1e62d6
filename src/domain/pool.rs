//! Pool entity combining membership state with pool policy.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ids::{AccountId, PeerId, PoolId};
use super::indexed_set::IndexedSet;

/// Creation-time and admin-mutable policy of a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    /// Display name.
    pub name: String,
    /// Display region.
    pub region: String,
    /// Collateral locked per membership slot.
    pub required_tokens: u128,
    /// Maximum occupied slots (0 = unlimited).
    pub max_members: u64,
    /// Opaque liveness policy parameter.
    pub min_ping_time: u64,
    /// Opaque challenge policy parameter.
    pub max_challenge_response_period: u64,
}

/// Aggregate holding one pool's policy, members, and pending requests.
///
/// Every collection here is kept index-consistent by the methods in
/// [`super::membership`]; fields are crate-visible so that the service
/// can read them, but only those methods mutate them.
#[derive(Debug, Clone)]
pub struct Pool {
    /// Sequential pool identifier.
    pub id: PoolId,
    /// Account that created the pool.
    pub creator: AccountId,
    /// Pool policy.
    pub params: PoolParams,
    /// Occupied membership slots (one per bound peer id, not per account).
    pub member_count: u64,
    /// Collateral the creator locked without a creator peer, refunded on delete.
    pub creator_escrow: u128,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state mutation.
    pub updated_at: DateTime<Utc>,
    pub(crate) members: IndexedSet<AccountId>,
    pub(crate) member_peers: HashMap<AccountId, IndexedSet<PeerId>>,
    pub(crate) peer_to_member: HashMap<PeerId, AccountId>,
    pub(crate) locked_tokens: HashMap<PeerId, u128>,
    pub(crate) pending: IndexedSet<PeerId>,
}

impl Pool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(id: PoolId, creator: AccountId, params: PoolParams, now: DateTime<Utc>) -> Self {
        Self {
            id,
            creator,
            params,
            member_count: 0,
            creator_escrow: 0,
            created_at: now,
            updated_at: now,
            members: IndexedSet::new(),
            member_peers: HashMap::new(),
            peer_to_member: HashMap::new(),
            locked_tokens: HashMap::new(),
            pending: IndexedSet::new(),
        }
    }

    /// Member accounts in enumeration order.
    #[must_use]
    pub fn members(&self) -> &[AccountId] {
        self.members.as_slice()
    }

    /// Peer ids bound to `account` in this pool.
    #[must_use]
    pub fn peers_of(&self, account: &AccountId) -> &[PeerId] {
        self.member_peers
            .get(account)
            .map_or(&[], IndexedSet::as_slice)
    }

    /// Account owning `peer` in this pool.
    #[must_use]
    pub fn member_of_peer(&self, peer: &PeerId) -> Option<&AccountId> {
        self.peer_to_member.get(peer)
    }

    /// Collateral attributed to the slot of `peer`.
    #[must_use]
    pub fn locked_tokens(&self, peer: &PeerId) -> u128 {
        self.locked_tokens.get(peer).copied().unwrap_or(0)
    }

    /// Peer ids with a live join request against this pool.
    #[must_use]
    pub fn pending_requests(&self) -> &[PeerId] {
        self.pending.as_slice()
    }

    /// Position of `account` in the member list.
    #[must_use]
    pub fn member_index(&self, account: &AccountId) -> Option<usize> {
        self.members.position(account)
    }
}

/// Lightweight pool descriptor for list and lookup endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolSummary {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Creator account.
    pub creator: AccountId,
    /// Display name.
    pub name: String,
    /// Display region.
    pub region: String,
    /// Collateral per slot (string-encoded u128).
    pub required_tokens: String,
    /// Slot limit (0 = unlimited).
    pub max_members: u64,
    /// Occupied membership slots.
    pub member_count: u64,
    /// Live join requests.
    pub pending_requests: u64,
    /// Opaque liveness policy parameter.
    pub min_ping_time: u64,
    /// Opaque challenge policy parameter.
    pub max_challenge_response_period: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Pool> for PoolSummary {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.id,
            creator: pool.creator.clone(),
            name: pool.params.name.clone(),
            region: pool.params.region.clone(),
            required_tokens: pool.params.required_tokens.to_string(),
            max_members: pool.params.max_members,
            member_count: pool.member_count,
            pending_requests: pool.pending.len() as u64,
            min_ping_time: pool.params.min_ping_time,
            max_challenge_response_period: pool.params.max_challenge_response_period,
            created_at: pool.created_at,
        }
    }
}

/// One member account with its slots.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberSlots {
    /// Member account.
    pub account: AccountId,
    /// Bound peer ids and their locked collateral (string-encoded u128).
    pub peers: Vec<SlotInfo>,
}

/// One occupied slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotInfo {
    /// Peer id occupying the slot.
    pub peer_id: PeerId,
    /// Collateral snapshot taken at admission (string-encoded u128).
    pub locked_tokens: String,
}

impl Pool {
    /// Snapshot of every member and slot, in member-list order.
    #[must_use]
    pub fn member_slots(&self) -> Vec<MemberSlots> {
        self.members
            .iter()
            .map(|account| MemberSlots {
                account: account.clone(),
                peers: self
                    .peers_of(account)
                    .iter()
                    .map(|peer| SlotInfo {
                        peer_id: peer.clone(),
                        locked_tokens: self.locked_tokens(peer).to_string(),
                    })
                    .collect(),
            })
            .collect()
    }
}
