//! Account, peer identity, claim, and admin handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    AccountStatusResponse, ClaimRequest, ClaimResponse, CustodyResponse, PeerStatusResponse,
    RecoverRequest, RecoverResponse, SetForfeitRequest, SetForfeitResponse, parse_amount,
};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::custody::ClaimKey;
use crate::domain::{AccountId, PeerId};
use crate::error::{ErrorResponse, PoolError};

/// `GET /accounts/{account}` — Account overview.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRequest`] for a blank account.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account}",
    tag = "Accounts",
    summary = "Get account status",
    params(("account" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account status", body = AccountStatusResponse),
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<impl IntoResponse, PoolError> {
    Ok(Json(account_status(&state, AccountId::parse(account)?)?))
}

/// Builds the account overview shared with the ledger endpoints.
pub(crate) fn account_status(
    state: &AppState,
    account: AccountId,
) -> Result<AccountStatusResponse, PoolError> {
    let service = &state.pool_service;
    Ok(AccountStatusResponse {
        forfeited: service.is_forfeited(&account)?,
        member_of_any_pool: service.is_member_of_any_pool(&account)?,
        balance: service.balance_of(&account).to_string(),
        allowance: service.allowance_of(&account).to_string(),
        account,
    })
}

/// `PUT /accounts/{account}/forfeiture` — Set or clear forfeiture.
///
/// # Errors
///
/// Returns [`PoolError::Forbidden`] without the pool-admin capability.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{account}/forfeiture",
    tag = "Accounts",
    summary = "Set the forfeiture flag",
    description = "Forfeited accounts cannot create pools or submit requests, and their collateral is burned when released.",
    params(("account" = String, Path, description = "Account id")),
    request_body = SetForfeitRequest,
    responses(
        (status = 200, description = "Flag updated", body = SetForfeitResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse),
    )
)]
pub async fn set_forfeiture(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(account): Path<String>,
    Json(req): Json<SetForfeitRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let account = AccountId::parse(account)?;
    let changed = state
        .pool_service
        .set_forfeit_flag(&caller, &account, req.forfeited)?;
    Ok(Json(SetForfeitResponse {
        account,
        forfeited: req.forfeited,
        changed,
    }))
}

/// `GET /peers/{peer_id}` — Peer identity binding.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRequest`] for a blank peer id.
#[utoipa::path(
    get,
    path = "/api/v1/peers/{peer_id}",
    tag = "Accounts",
    summary = "Get a peer id binding",
    params(("peer_id" = String, Path, description = "Peer id")),
    responses(
        (status = 200, description = "Binding, if any", body = PeerStatusResponse),
    )
)]
pub async fn get_peer(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
) -> Result<impl IntoResponse, PoolError> {
    let peer = PeerId::parse(peer_id)?;
    let binding = state.pool_service.peer_binding(&peer)?;
    Ok(Json(PeerStatusResponse {
        peer_id: peer,
        binding,
    }))
}

/// `GET /claims/account/{id}` — Claimable balance under an account key.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRequest`] for a blank id.
#[utoipa::path(
    get,
    path = "/api/v1/claims/account/{id}",
    tag = "Claims",
    summary = "Claimable amount under an account key",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Claimable amount", body = ClaimResponse),
    )
)]
pub async fn get_account_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PoolError> {
    claim_view(&state, ClaimKey::Account(AccountId::parse(id)?))
}

/// `GET /claims/peer/{id}` — Claimable balance under a peer key.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRequest`] for a blank id.
#[utoipa::path(
    get,
    path = "/api/v1/claims/peer/{id}",
    tag = "Claims",
    summary = "Claimable amount under a peer key",
    params(("id" = String, Path, description = "Peer id")),
    responses(
        (status = 200, description = "Claimable amount", body = ClaimResponse),
    )
)]
pub async fn get_peer_claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PoolError> {
    claim_view(&state, ClaimKey::Peer(PeerId::parse(id)?))
}

fn claim_view(state: &AppState, key: ClaimKey) -> Result<Json<ClaimResponse>, PoolError> {
    let amount = state.pool_service.claimable(&key)?;
    Ok(Json(ClaimResponse {
        key,
        amount: amount.to_string(),
    }))
}

/// `POST /claims` — Pay out a claimable balance to its owner.
///
/// # Errors
///
/// Returns [`PoolError`] if nothing is claimable, the caller is not the
/// owner, or the transfer fails (the balance is kept).
#[utoipa::path(
    post,
    path = "/api/v1/claims",
    tag = "Claims",
    summary = "Claim tokens",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Amount paid out", body = ClaimResponse),
        (status = 403, description = "Caller does not own the entry", body = ErrorResponse),
        (status = 404, description = "Nothing to claim", body = ErrorResponse),
        (status = 422, description = "Transfer failed", body = ErrorResponse),
    )
)]
pub async fn claim(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<ClaimRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let amount = state.pool_service.claim_tokens(&caller, &req.key)?;
    Ok(Json(ClaimResponse {
        key: req.key,
        amount: amount.to_string(),
    }))
}

/// `GET /custody` — Custody balance and outstanding claims.
///
/// # Errors
///
/// Returns [`PoolError::Reentrant`] only on internal misuse.
#[utoipa::path(
    get,
    path = "/api/v1/custody",
    tag = "Admin",
    summary = "Custody overview",
    responses(
        (status = 200, description = "Custody balance", body = CustodyResponse),
    )
)]
pub async fn get_custody(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let service = &state.pool_service;
    Ok(Json(CustodyResponse {
        custody_account: service.config().custody_account.clone(),
        burn_account: service.config().burn_account.clone(),
        balance: service.custody_balance().to_string(),
        claimable_total: service.total_claimable()?.to_string(),
    }))
}

/// `POST /admin/recover` — Emergency sweep to the burn sink.
///
/// # Errors
///
/// Returns [`PoolError::Forbidden`] without the admin capability.
#[utoipa::path(
    post,
    path = "/api/v1/admin/recover",
    tag = "Admin",
    summary = "Emergency token recovery",
    description = "Sweeps up to `amount` of the custody balance to the burn sink. Slot snapshots and claimable balances are not adjusted.",
    request_body = RecoverRequest,
    responses(
        (status = 200, description = "Amount swept", body = RecoverResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse),
    )
)]
pub async fn recover(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<RecoverRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let amount = parse_amount("amount", &req.amount)?;
    let swept = state
        .pool_service
        .emergency_recover_tokens(&caller, amount)?;
    Ok(Json(RecoverResponse {
        swept: swept.to_string(),
    }))
}

/// Account, claim, and admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{account}", get(get_account))
        .route("/accounts/{account}/forfeiture", put(set_forfeiture))
        .route("/peers/{peer_id}", get(get_peer))
        .route("/claims", post(claim))
        .route("/claims/account/{id}", get(get_account_claim))
        .route("/claims/peer/{id}", get(get_peer_claim))
        .route("/custody", get(get_custody))
        .route("/admin/recover", post(recover))
}
