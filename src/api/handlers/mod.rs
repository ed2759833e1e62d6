//! REST endpoint handlers organized by resource.

pub mod account;
pub mod join_request;
pub mod ledger;
pub mod member;
pub mod pool;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pool::routes())
        .merge(join_request::routes())
        .merge(member::routes())
        .merge(account::routes())
        .merge(ledger::routes())
}
