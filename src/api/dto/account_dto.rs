//! Account, claim, custody, and development-ledger DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::custody::ClaimKey;
use crate::domain::{AccountId, PeerBinding, PeerId};

/// Account overview for `GET /accounts/{account}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountStatusResponse {
    /// Account looked up.
    pub account: AccountId,
    /// Forfeiture flag.
    pub forfeited: bool,
    /// Whether the account holds a slot in any pool.
    pub member_of_any_pool: bool,
    /// Token balance (string-encoded u128).
    pub balance: String,
    /// Allowance granted to custody (string-encoded u128).
    pub allowance: String,
}

/// Request body for `PUT /accounts/{account}/forfeiture`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetForfeitRequest {
    /// New flag value.
    pub forfeited: bool,
}

/// Response body for `PUT /accounts/{account}/forfeiture`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SetForfeitResponse {
    /// Affected account.
    pub account: AccountId,
    /// Current flag value.
    pub forfeited: bool,
    /// Whether the call changed the flag.
    pub changed: bool,
}

/// Peer identity lookup for `GET /peers/{peer_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PeerStatusResponse {
    /// Peer id looked up.
    pub peer_id: PeerId,
    /// Current binding, if any.
    pub binding: Option<PeerBinding>,
}

/// Request body for `POST /claims`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClaimRequest {
    /// Claimable ledger key.
    pub key: ClaimKey,
}

/// Claimable amount under one key.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimResponse {
    /// Claimable ledger key.
    pub key: ClaimKey,
    /// Amount (string-encoded u128).
    pub amount: String,
}

/// Request body for `POST /admin/recover`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecoverRequest {
    /// Requested sweep amount as a decimal string.
    pub amount: String,
}

/// Response body for `POST /admin/recover`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecoverResponse {
    /// Amount actually swept (string-encoded u128).
    pub swept: String,
}

/// Custody overview for `GET /custody`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustodyResponse {
    /// Custody account.
    pub custody_account: AccountId,
    /// Burn sink.
    pub burn_account: AccountId,
    /// Custody balance (string-encoded u128).
    pub balance: String,
    /// Outstanding claimable total (string-encoded u128).
    pub claimable_total: String,
}

/// Request body for `POST /ledger/approve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    /// Allowance granted to custody, as a decimal string.
    pub amount: String,
}

/// Request body for `POST /ledger/mint`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MintRequest {
    /// Recipient.
    pub account: String,
    /// Amount as a decimal string.
    pub amount: String,
}
