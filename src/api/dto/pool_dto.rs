//! Pool-related DTOs for create, list, and parameter updates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::PoolSummary;

/// Request body for `POST /pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Display name (non-empty, bounded length).
    pub name: String,
    /// Display region (non-empty, bounded length).
    pub region: String,
    /// Collateral per slot as a decimal string; clamped server-side.
    pub required_tokens: String,
    /// Slot limit (0 = unlimited).
    #[serde(default)]
    pub max_members: u64,
    /// Opaque liveness parameter.
    #[serde(default)]
    pub min_ping_time: u64,
    /// Opaque challenge parameter.
    #[serde(default)]
    pub max_challenge_response_period: u64,
    /// Peer id the creator joins with.
    #[serde(default)]
    pub creator_peer_id: Option<String>,
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries.
    pub data: Vec<PoolSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `PUT /pools/{id}/max-members`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetMaxMembersRequest {
    /// New slot limit (0 = unlimited).
    pub max_members: u64,
}

/// Request body for `PUT /pools/{id}/required-tokens`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRequiredTokensRequest {
    /// New collateral per slot as a decimal string.
    pub required_tokens: String,
}
