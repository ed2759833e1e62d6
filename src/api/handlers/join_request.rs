//! Join-request handlers: submit, list, vote, approve, cancel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{JoinRequestStatusResponse, SubmitJoinRequest, VoteRequest};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::domain::{JoinRequestView, PeerId, PoolId};
use crate::error::{ErrorResponse, PoolError};

/// `POST /pools/{id}/join-requests` — Ask for a slot.
///
/// # Errors
///
/// Returns [`PoolError`] if the peer id is taken, the pool is full, the
/// caller is forfeited, or the collateral cannot be escrowed.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/join-requests",
    tag = "Join requests",
    summary = "Submit a join request",
    description = "Escrows the pool's current `required_tokens` from the caller and opens a pending request for the peer id.",
    params(("id" = u64, Path, description = "Pool id")),
    request_body = SubmitJoinRequest,
    responses(
        (status = 201, description = "Request pending", body = JoinRequestView),
        (status = 409, description = "Peer bound, duplicate request, or pool full", body = ErrorResponse),
        (status = 422, description = "Collateral could not be escrowed", body = ErrorResponse),
    )
)]
pub async fn submit_join_request(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<SubmitJoinRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let peer = PeerId::parse(req.peer_id)?;
    state
        .pool_service
        .submit_join_request(&caller, pool_id, &peer)?;
    let view = state.pool_service.join_request(pool_id, &peer)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /pools/{id}/join-requests` — List pending requests.
///
/// # Errors
///
/// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/join-requests",
    tag = "Join requests",
    summary = "List pending join requests",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Pending requests", body = Vec<JoinRequestView>),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn list_join_requests(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, PoolError> {
    Ok(Json(state.pool_service.pending_requests(PoolId::new(id))?))
}

/// `GET /pools/{id}/join-requests/{peer_id}` — Get one pending request.
///
/// # Errors
///
/// Returns [`PoolError::JoinRequestNotFound`] if there is none.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/join-requests/{peer_id}",
    tag = "Join requests",
    summary = "Get a pending join request",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Requested peer id"),
    ),
    responses(
        (status = 200, description = "Pending request", body = JoinRequestView),
        (status = 404, description = "No pending request", body = ErrorResponse),
    )
)]
pub async fn get_join_request(
    State(state): State<AppState>,
    Path((id, peer_id)): Path<(u64, String)>,
) -> Result<impl IntoResponse, PoolError> {
    let peer = PeerId::parse(peer_id)?;
    Ok(Json(state.pool_service.join_request(PoolId::new(id), &peer)?))
}

/// `POST /pools/{id}/join-requests/{peer_id}/votes` — Vote as a member.
///
/// # Errors
///
/// Returns [`PoolError`] if the voter peer is not the caller's member
/// slot or has already voted.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/join-requests/{peer_id}/votes",
    tag = "Join requests",
    summary = "Vote on a join request",
    description = "Approves or rejects with one of the caller's member peer ids. The request resolves as soon as a threshold is reached.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Requested peer id"),
    ),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = JoinRequestStatusResponse),
        (status = 403, description = "Voter peer not owned by caller", body = ErrorResponse),
        (status = 409, description = "Already voted", body = ErrorResponse),
    )
)]
pub async fn vote(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, peer_id)): Path<(u64, String)>,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let peer = PeerId::parse(peer_id)?;
    let voter = PeerId::parse(req.voter_peer_id)?;
    let status = state
        .pool_service
        .vote_on_join_request(&caller, pool_id, &peer, &voter, req.approve)?;
    Ok(Json(JoinRequestStatusResponse {
        pool_id,
        peer_id: peer,
        status,
    }))
}

/// `POST /pools/{id}/join-requests/{peer_id}/approve` — Admin override.
///
/// # Errors
///
/// Returns [`PoolError`] without the pool-admin capability or if there
/// is no pending request.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/join-requests/{peer_id}/approve",
    tag = "Join requests",
    summary = "Approve a join request directly",
    description = "Admits the requester without votes. A forfeited requester is rejected and its escrow burned.",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Requested peer id"),
    ),
    responses(
        (status = 200, description = "Request resolved", body = JoinRequestStatusResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse),
        (status = 404, description = "No pending request", body = ErrorResponse),
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, peer_id)): Path<(u64, String)>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let peer = PeerId::parse(peer_id)?;
    let status = state
        .pool_service
        .approve_join_request(&caller, pool_id, &peer)?;
    Ok(Json(JoinRequestStatusResponse {
        pool_id,
        peer_id: peer,
        status,
    }))
}

/// `DELETE /pools/{id}/join-requests/{peer_id}` — Cancel a request.
///
/// # Errors
///
/// Returns [`PoolError`] if the caller is neither the requester, the
/// creator, nor privileged, or if there is no pending request.
#[utoipa::path(
    delete,
    path = "/api/v1/pools/{id}/join-requests/{peer_id}",
    tag = "Join requests",
    summary = "Cancel a join request",
    params(
        ("id" = u64, Path, description = "Pool id"),
        ("peer_id" = String, Path, description = "Requested peer id"),
    ),
    responses(
        (status = 204, description = "Request cancelled and escrow returned"),
        (status = 403, description = "Caller may not cancel", body = ErrorResponse),
        (status = 404, description = "No pending request", body = ErrorResponse),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((id, peer_id)): Path<(u64, String)>,
) -> Result<impl IntoResponse, PoolError> {
    let peer = PeerId::parse(peer_id)?;
    state
        .pool_service
        .cancel_join_request(&caller, PoolId::new(id), &peer)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Join-request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/pools/{id}/join-requests",
            post(submit_join_request).get(list_join_requests),
        )
        .route(
            "/pools/{id}/join-requests/{peer_id}",
            get(get_join_request).delete(cancel),
        )
        .route("/pools/{id}/join-requests/{peer_id}/votes", post(vote))
        .route("/pools/{id}/join-requests/{peer_id}/approve", post(approve))
}
