//! Join-request and member DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::custody::RefundOutcome;
use crate::domain::{AccountId, JoinRequestStatus, PeerId, PoolId};

/// Request body for `POST /pools/{id}/join-requests`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitJoinRequest {
    /// Peer id asking for a slot.
    pub peer_id: String,
}

/// Request body for `POST /pools/{id}/join-requests/{peer_id}/votes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// Caller's member peer id in the pool.
    pub voter_peer_id: String,
    /// Approve (`true`) or reject.
    pub approve: bool,
}

/// Status of a request after a vote or an override.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRequestStatusResponse {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Peer id of the request.
    pub peer_id: PeerId,
    /// Status after the call.
    pub status: JoinRequestStatus,
}

/// Request body for `POST /pools/{id}/members`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    /// Account that will own the slot.
    pub account: String,
    /// Peer id of the slot.
    pub peer_id: String,
}

/// Response body for `DELETE /pools/{id}/members/{peer_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveMemberResponse {
    /// Released peer id.
    pub peer_id: PeerId,
    /// Where the slot collateral went.
    pub refund: RefundOutcome,
}

/// Request body for `POST /pools/{id}/members/evictions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRemoveRequest {
    /// Maximum number of member accounts to evict.
    pub count: usize,
}

/// Response body for `POST /pools/{id}/members/evictions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchRemoveResponse {
    /// Evicted accounts in eviction order.
    pub evicted: Vec<AccountId>,
}

/// Slot lookup for `GET /pools/{id}/members/{peer_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotStatusResponse {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Peer id looked up.
    pub peer_id: PeerId,
    /// Whether the peer holds a slot.
    pub is_member: bool,
    /// Collateral snapshot (string-encoded u128, `"0"` if none).
    pub locked_tokens: String,
}

/// Pool slot count for `GET /pools/{id}/members/count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberCountResponse {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Occupied slots.
    pub total_members: u64,
}
