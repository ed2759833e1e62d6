//! Error taxonomy with stable codes and HTTP status mapping.
//!
//! [`PoolError`] is the single error type of the crate. Every variant
//! belongs to one [`ErrorCategory`]; all of them abort the operation with
//! no state change. Refund delivery failures are deliberately absent:
//! they are reported as [`crate::custody::RefundOutcome`] values instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AccountId, PeerId, PoolId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4101,
///     "message": "pool 3 is full (max 3 slots)",
///     "details": "capacity"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed input, missing or duplicate entity.
    Validation,
    /// Missing capability, not creator/owner, paused, forfeited.
    Authorization,
    /// Slot limit reached.
    Capacity,
    /// Operation invalid for the current entity state.
    State,
    /// Insufficient allowance or balance for a required escrow.
    Economic,
    /// Cool-down not yet elapsed.
    RateLimit,
    /// Infrastructure failure.
    Internal,
}

impl ErrorCategory {
    /// Lower-case category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Capacity => "capacity",
            Self::State => "state",
            Self::Economic => "economic",
            Self::RateLimit => "rate_limit",
            Self::Internal => "internal",
        }
    }
}

/// Error enum with code and HTTP status mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                    | HTTP Status       |
/// |-----------|-----------------------------|-------------------|
/// | 1000–1999 | Validation                  | 400 Bad Request   |
/// | 2000–2099 | Not Found                   | 404 Not Found     |
/// | 2100–2199 | Duplicate / State / Re-entry| 409 Conflict      |
/// | 3000–3999 | Server                      | 500               |
/// | 4000–4099 | Economic                    | 422               |
/// | 4100–4199 | Capacity                    | 409 Conflict      |
/// | 5000–5999 | Authorization               | 403 / 503         |
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Pool with the given id was not found.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    /// No live join request for the peer in the pool.
    #[error("no pending join request for peer {peer_id} in pool {pool_id}")]
    JoinRequestNotFound {
        /// Pool searched.
        pool_id: PoolId,
        /// Peer searched.
        peer_id: PeerId,
    },

    /// Peer holds no slot in the pool.
    #[error("peer {peer_id} is not a member of pool {pool_id}")]
    PeerNotMember {
        /// Pool searched.
        pool_id: PoolId,
        /// Peer searched.
        peer_id: PeerId,
    },

    /// Claimable balance is zero or absent.
    #[error("nothing to claim for {0}")]
    NothingToClaim(String),

    /// Peer already holds a slot in the pool.
    #[error("peer {peer_id} is already a member of pool {pool_id}")]
    PeerAlreadyMember {
        /// Pool.
        pool_id: PoolId,
        /// Peer.
        peer_id: PeerId,
    },

    /// Peer already has a live join request.
    #[error("peer {peer_id} already has a pending join request")]
    JoinRequestExists {
        /// Peer.
        peer_id: PeerId,
    },

    /// Peer is bound to another account or committed to another pool.
    #[error("peer {peer_id} is bound to another account or pool")]
    PeerBound {
        /// Peer.
        peer_id: PeerId,
    },

    /// Voter already voted on this request.
    #[error("peer {voter} has already voted on this request")]
    AlreadyVoted {
        /// Voting peer.
        voter: PeerId,
    },

    /// Operation is not valid in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A guarded entry point was called from inside another one.
    #[error("reentrant call rejected")]
    Reentrant,

    /// Pool has no free slot.
    #[error("pool {pool_id} is full (max {max_members} slots)")]
    CapacityReached {
        /// Pool.
        pool_id: PoolId,
        /// Configured slot limit.
        max_members: u64,
    },

    /// Allowance granted to custody is too small.
    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance {
        /// Amount required.
        required: u128,
        /// Amount approved.
        available: u128,
    },

    /// Token balance is too small.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Amount required.
        required: u128,
        /// Amount held.
        available: u128,
    },

    /// The token ledger refused a transfer that the operation depends on.
    #[error("token transfer failed: {0}")]
    TransferFailed(String),

    /// Caller lacks the capability or ownership required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Account is forfeited.
    #[error("account {0} is forfeited")]
    Forfeited(AccountId),

    /// Mutations are paused.
    #[error("operations are paused")]
    Paused,

    /// Cool-down between two uses of the same action has not elapsed.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the caller may retry.
        retry_after_ms: u64,
    },

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PoolError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::PoolNotFound(_) => 2001,
            Self::JoinRequestNotFound { .. } => 2002,
            Self::PeerNotMember { .. } => 2003,
            Self::NothingToClaim(_) => 2004,
            Self::PeerAlreadyMember { .. } => 2101,
            Self::JoinRequestExists { .. } => 2102,
            Self::PeerBound { .. } => 2103,
            Self::AlreadyVoted { .. } => 2104,
            Self::InvalidState(_) => 2105,
            Self::Reentrant => 2106,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InsufficientAllowance { .. } => 4001,
            Self::InsufficientBalance { .. } => 4002,
            Self::TransferFailed(_) => 4003,
            Self::CapacityReached { .. } => 4101,
            Self::Forbidden(_) => 5001,
            Self::Forfeited(_) => 5002,
            Self::Paused => 5003,
            Self::RateLimited { .. } => 429,
        }
    }

    /// Returns the failure category of this variant.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest(_)
            | Self::PoolNotFound(_)
            | Self::JoinRequestNotFound { .. }
            | Self::PeerNotMember { .. }
            | Self::NothingToClaim(_)
            | Self::PeerAlreadyMember { .. }
            | Self::JoinRequestExists { .. }
            | Self::PeerBound { .. } => ErrorCategory::Validation,
            Self::AlreadyVoted { .. } | Self::InvalidState(_) | Self::Reentrant => {
                ErrorCategory::State
            }
            Self::CapacityReached { .. } => ErrorCategory::Capacity,
            Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::TransferFailed(_) => ErrorCategory::Economic,
            Self::Forbidden(_) | Self::Forfeited(_) | Self::Paused => {
                ErrorCategory::Authorization
            }
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::PersistenceError(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_)
            | Self::JoinRequestNotFound { .. }
            | Self::PeerNotMember { .. }
            | Self::NothingToClaim(_) => StatusCode::NOT_FOUND,
            Self::PeerAlreadyMember { .. }
            | Self::JoinRequestExists { .. }
            | Self::PeerBound { .. }
            | Self::AlreadyVoted { .. }
            | Self::InvalidState(_)
            | Self::Reentrant
            | Self::CapacityReached { .. } => StatusCode::CONFLICT,
            Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::TransferFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Forbidden(_) | Self::Forfeited(_) => StatusCode::FORBIDDEN,
            Self::Paused => StatusCode::SERVICE_UNAVAILABLE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PoolError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: Some(self.category().as_str().to_string()),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_maps_to_conflict() {
        let err = PoolError::CapacityReached {
            pool_id: PoolId::new(1),
            max_members: 3,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.category(), ErrorCategory::Capacity);
        assert_eq!(err.error_code(), 4101);
    }

    #[test]
    fn economic_errors_are_unprocessable() {
        let err = PoolError::InsufficientAllowance {
            required: 100,
            available: 0,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.category(), ErrorCategory::Economic);
    }

    #[test]
    fn into_response_sets_status() {
        let response = PoolError::Paused.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
