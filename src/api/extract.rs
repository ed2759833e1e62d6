//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::AccountId;
use crate::error::PoolError;

/// Header carrying the caller's account.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Authenticated caller, taken from the `x-account-id` header.
///
/// Identity is asserted by whatever sits in front of the gateway; the
/// extractor only checks that the header is present and non-blank.
#[derive(Debug, Clone)]
pub struct Caller(pub AccountId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = PoolError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_HEADER)
            .ok_or_else(|| PoolError::Forbidden(format!("missing {ACCOUNT_HEADER} header")))?
            .to_str()
            .map_err(|_| PoolError::InvalidRequest(format!("{ACCOUNT_HEADER} is not ASCII")))?;
        AccountId::parse(raw.trim()).map(Self)
    }
}
