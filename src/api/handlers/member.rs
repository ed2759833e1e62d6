//! Member handlers: list, direct add, removal, batch eviction, lookups.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AddMemberRequest, BatchRemoveRequest, BatchRemoveResponse, MemberCountResponse,
    RemoveMemberResponse, SlotStatusResponse,
};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::domain::{AccountId, MemberSlots, PeerId, PoolId};
use crate::error::{ErrorResponse, PoolError};

/// `GET /pools/{id}/members` — Member accounts and their slots.
///
/// # Errors
///
/// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/members",
    tag = "Members",
    summary = "List members",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Members with their peer ids", body = Vec<MemberSlots>),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, PoolError> {
    Ok(Json(state.pool_service.pool_members(PoolId::new(id))?))
}

/// `GET /pools/{id}/members/count` — Occupied slot count.
///
/// # Errors
///
/// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/members/count",
    tag = "Members",
    summary = "Count occupied slots",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Slot count", body = MemberCountResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn member_count(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    Ok(Json(MemberCountResponse {
        pool_id,
        total_members: state.pool_service.total_members(pool_id)?,
    }))
}

/// `POST /pools/{id}/members` — Admin direct add without escrow.
///
/// # Errors
///
/// Returns [`PoolError`] without the pool-admin capability, on identity
/// conflicts, or when the pool is full.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/members",
    tag = "Members",
    summary = "Add a member directly",
    description = "Adds a slot with a zero collateral snapshot, bypassing voting and escrow.",
    params(("id" = u64, Path, description = "Pool id")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = SlotStatusResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse),
        (status = 409, description = "Peer bound or pool full", body = ErrorResponse),
    )
)]
pub async fn add_member(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let account = AccountId::parse(req.account)?;
    let peer = PeerId::parse(req.peer_id)?;
    state
        .pool_service
        .add_member_direct(&caller, pool_id, &account, &peer)?;
    Ok((
        StatusCode::CREATED,
        Json(SlotStatusResponse {
            pool_id,
            peer_id: peer,
            is_member: true,
            locked_tokens: "0".to_string(),
        }),
    ))
}

/// `GET /pools/{id}/members/{peer_id}` — Slot lookup.
///
/// # Errors
///
/// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/members/{peer_id}",
    tag = "Members",
    summary = "Look up a slot",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Peer id"),
    ),
    responses(
        (status = 200, description = "Slot status", body = SlotStatusResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_slot(
    State(state): State<AppState>,
    Path((id, peer_id)): Path<(u64, String)>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let peer = PeerId::parse(peer_id)?;
    let is_member = state.pool_service.is_peer_member(pool_id, &peer)?;
    let locked = state.pool_service.locked_tokens(pool_id, &peer)?;
    Ok(Json(SlotStatusResponse {
        pool_id,
        peer_id: peer,
        is_member,
        locked_tokens: locked.to_string(),
    }))
}

/// `DELETE /pools/{id}/members/{peer_id}` — Release one slot.
///
/// # Errors
///
/// Returns [`PoolError`] if the peer holds no slot or the caller may not
/// remove it. A failed refund is not an error; see `refund`.
#[utoipa::path(
    delete,
    path = "/api/v1/pools/{id}/members/{peer_id}",
    tag = "Members",
    summary = "Remove a member peer",
    description = "Allowed for the slot owner, the pool creator, or an admin. The collateral snapshot is refunded, burned for forfeited owners, or credited as claimable.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Peer id"),
    ),
    responses(
        (status = 200, description = "Slot released", body = RemoveMemberResponse),
        (status = 403, description = "Caller may not remove", body = ErrorResponse),
        (status = 404, description = "Peer is not a member", body = ErrorResponse),
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, peer_id)): Path<(u64, String)>,
) -> Result<impl IntoResponse, PoolError> {
    let peer = PeerId::parse(peer_id)?;
    let refund = state
        .pool_service
        .remove_member_peer(&caller, PoolId::new(id), &peer)?;
    Ok(Json(RemoveMemberResponse {
        peer_id: peer,
        refund,
    }))
}

/// `POST /pools/{id}/members/evictions` — Batch eviction.
///
/// # Errors
///
/// Returns [`PoolError`] unless the caller is the creator or privileged.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/members/evictions",
    tag = "Members",
    summary = "Evict members in bulk",
    description = "Evicts up to `count` accounts, most recently indexed first. The creator never evicts itself.",
    params(("id" = u64, Path, description = "Pool id")),
    request_body = BatchRemoveRequest,
    responses(
        (status = 200, description = "Evicted accounts", body = BatchRemoveResponse),
        (status = 403, description = "Caller may not evict", body = ErrorResponse),
    )
)]
pub async fn evict_members(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<BatchRemoveRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let evicted = state
        .pool_service
        .remove_members_batch(&caller, PoolId::new(id), req.count)?;
    Ok(Json(BatchRemoveResponse { evicted }))
}

/// Member routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/members", get(list_members).post(add_member))
        .route("/pools/{id}/members/count", get(member_count))
        .route("/pools/{id}/members/evictions", post(evict_members))
        .route(
            "/pools/{id}/members/{peer_id}",
            get(get_slot).delete(remove_member),
        )
}
