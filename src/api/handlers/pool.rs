//! Pool handlers: create, list, get, delete, and parameter updates.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    CreatePoolRequest, PaginationParams, PoolListResponse, SetMaxMembersRequest,
    SetRequiredTokensRequest, parse_amount,
};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::domain::{PeerId, PoolId, PoolSummary};
use crate::error::{ErrorResponse, PoolError};
use crate::service::NewPool;

/// `POST /pools` — Create a storage pool.
///
/// # Errors
///
/// Returns [`PoolError`] on invalid input, cool-down, identity conflicts,
/// or when the creation collateral cannot be locked.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a storage pool",
    description = "Creates a pool owned by the caller. Non-privileged callers lock the creation collateral; with `creator_peer_id` the creator becomes the first member.",
    request_body = CreatePoolRequest,
    responses(
        (status = 201, description = "Pool created", body = PoolSummary),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Collateral could not be locked", body = ErrorResponse),
        (status = 429, description = "Cool-down not elapsed", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let creator_peer_id = req.creator_peer_id.map(PeerId::parse).transpose()?;
    let new_pool = NewPool {
        required_tokens: parse_amount("required_tokens", &req.required_tokens)?,
        name: req.name,
        region: req.region,
        max_members: req.max_members,
        min_ping_time: req.min_ping_time,
        max_challenge_response_period: req.max_challenge_response_period,
        creator_peer_id,
    };

    let pool_id = state.pool_service.create_pool(&caller, new_pool)?;
    let summary = state.pool_service.pool(pool_id)?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /pools` — List pools in id order.
///
/// # Errors
///
/// Returns [`PoolError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns a paginated list of all pools ordered by id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, PoolError> {
    let (data, pagination) = params.paginate(state.pool_service.list_pools()?);
    Ok(Json(PoolListResponse { data, pagination }))
}

/// `GET /pools/{id}` — Get a pool descriptor.
///
/// # Errors
///
/// Returns [`PoolError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool details",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 200, description = "Pool details", body = PoolSummary),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, PoolError> {
    Ok(Json(state.pool_service.pool(PoolId::new(id))?))
}

/// `DELETE /pools/{id}` — Delete a pool.
///
/// # Errors
///
/// Returns [`PoolError`] if the caller may not delete the pool or it
/// still has members or pending requests.
#[utoipa::path(
    delete,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Delete a pool",
    description = "The creator may delete a pool whose only member is itself; an admin may delete an empty pool. Remaining creator collateral is refunded.",
    params(("id" = u64, Path, description = "Pool id")),
    responses(
        (status = 204, description = "Pool deleted"),
        (status = 403, description = "Caller may not delete", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool still has members or requests", body = ErrorResponse),
    )
)]
pub async fn delete_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, PoolError> {
    state.pool_service.delete_pool(&caller, PoolId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /pools/{id}/max-members` — Change the slot limit.
///
/// # Errors
///
/// Returns [`PoolError`] without the pool-admin capability or when the
/// limit is below the occupied-slot count.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}/max-members",
    tag = "Pools",
    summary = "Set the slot limit",
    params(("id" = u64, Path, description = "Pool id")),
    request_body = SetMaxMembersRequest,
    responses(
        (status = 200, description = "Updated pool", body = PoolSummary),
        (status = 403, description = "Missing capability", body = ErrorResponse),
        (status = 409, description = "Limit below occupied slots", body = ErrorResponse),
    )
)]
pub async fn set_max_members(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<SetMaxMembersRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    state
        .pool_service
        .set_max_members(&caller, pool_id, req.max_members)?;
    Ok(Json(state.pool_service.pool(pool_id)?))
}

/// `PUT /pools/{id}/required-tokens` — Change the per-slot collateral.
///
/// # Errors
///
/// Returns [`PoolError`] without the pool-admin capability or when
/// raising the amount while requests are pending.
#[utoipa::path(
    put,
    path = "/api/v1/pools/{id}/required-tokens",
    tag = "Pools",
    summary = "Set the per-slot collateral",
    description = "The value is clamped to the creation lock amount. Existing slots keep their snapshot.",
    params(("id" = u64, Path, description = "Pool id")),
    request_body = SetRequiredTokensRequest,
    responses(
        (status = 200, description = "Updated pool", body = PoolSummary),
        (status = 403, description = "Missing capability", body = ErrorResponse),
        (status = 409, description = "Requests pending", body = ErrorResponse),
    )
)]
pub async fn set_required_tokens(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<u64>,
    Json(req): Json<SetRequiredTokensRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let pool_id = PoolId::new(id);
    let amount = parse_amount("required_tokens", &req.required_tokens)?;
    state
        .pool_service
        .set_required_tokens(&caller, pool_id, amount)?;
    Ok(Json(state.pool_service.pool(pool_id)?))
}

/// Pool management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/{id}", get(get_pool).delete(delete_pool))
        .route("/pools/{id}/max-members", put(set_max_members))
        .route("/pools/{id}/required-tokens", put(set_required_tokens))
}
