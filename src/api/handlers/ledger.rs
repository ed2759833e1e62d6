//! Development token-ledger handlers.
//!
//! Only mounted when the gateway runs against [`InMemoryTokenLedger`];
//! a real deployment approves custody on the token ledger itself.
//!
//! [`InMemoryTokenLedger`]: crate::custody::InMemoryTokenLedger

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::account::account_status;
use crate::api::dto::{AccountStatusResponse, ApproveRequest, MintRequest, parse_amount};
use crate::api::extract::Caller;
use crate::app_state::AppState;
use crate::custody::{InMemoryTokenLedger, TokenError};
use crate::domain::AccountId;
use crate::error::{ErrorResponse, PoolError};
use crate::governance::Capability;

fn dev_ledger(state: &AppState) -> Result<Arc<InMemoryTokenLedger>, PoolError> {
    state
        .dev_ledger
        .as_ref()
        .map(Arc::clone)
        .ok_or_else(|| PoolError::InvalidState("development ledger is not enabled".to_string()))
}

fn ledger_error(err: TokenError) -> PoolError {
    PoolError::TransferFailed(err.to_string())
}

/// `POST /ledger/approve` — Grant custody an allowance from the caller.
///
/// # Errors
///
/// Returns [`PoolError`] if the development ledger is disabled or the
/// amount is invalid.
#[utoipa::path(
    post,
    path = "/api/v1/ledger/approve",
    tag = "Ledger",
    summary = "Approve custody",
    description = "Sets the caller's allowance for the custody account on the development ledger.",
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Caller status after approval", body = AccountStatusResponse),
        (status = 409, description = "Development ledger disabled", body = ErrorResponse),
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, PoolError> {
    let ledger = dev_ledger(&state)?;
    let amount = parse_amount("amount", &req.amount)?;
    ledger
        .approve(&caller, ledger.custody(), amount)
        .map_err(ledger_error)?;
    tracing::debug!(account = %caller, amount, "custody allowance set");
    Ok(Json(account_status(&state, caller)?))
}

/// `POST /ledger/mint` — Mint development tokens (admin only).
///
/// # Errors
///
/// Returns [`PoolError::Forbidden`] without the admin capability.
#[utoipa::path(
    post,
    path = "/api/v1/ledger/mint",
    tag = "Ledger",
    summary = "Mint development tokens",
    request_body = MintRequest,
    responses(
        (status = 201, description = "Recipient status after minting", body = AccountStatusResponse),
        (status = 403, description = "Missing capability", body = ErrorResponse),
        (status = 409, description = "Development ledger disabled", body = ErrorResponse),
    )
)]
pub async fn mint(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<MintRequest>,
) -> Result<impl IntoResponse, PoolError> {
    if !state.pool_service.has_capability(Capability::Admin, &caller) {
        return Err(PoolError::Forbidden(format!(
            "{caller} lacks the admin capability"
        )));
    }
    let ledger = dev_ledger(&state)?;
    let account = AccountId::parse(req.account)?;
    let amount = parse_amount("amount", &req.amount)?;
    ledger.mint(&account, amount).map_err(ledger_error)?;
    tracing::info!(%account, amount, by = %caller, "development tokens minted");
    Ok((StatusCode::CREATED, Json(account_status(&state, account)?)))
}

/// Development ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/approve", post(approve))
        .route("/ledger/mint", post(mint))
}
