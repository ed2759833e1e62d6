//! Type-safe identifiers for pools, accounts, and peers.
//!
//! [`PoolId`] wraps the sequential numeric pool id. [`AccountId`] and
//! [`PeerId`] wrap opaque strings so that an account can never be passed
//! where a peer identifier is expected (and vice versa).

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PoolError;

/// Unique identifier for a storage pool.
///
/// Assigned sequentially starting at 1 by [`super::PoolRegistry`] and
/// immutable thereafter. `0` is never a valid pool id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct PoolId(u64);

impl PoolId {
    /// Creates a `PoolId` from its raw numeric value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PoolId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Account that owns collateral and submits operations.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Creates an `AccountId`, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidRequest`] if `raw` is blank.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PoolError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PoolError::InvalidRequest("account id must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    /// Returns the account id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Opaque external peer identity, bound to at most one account and pool.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Creates a `PeerId`, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidRequest`] if `raw` is blank.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PoolError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PoolError::InvalidRequest("peer id must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    /// Returns the peer id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
