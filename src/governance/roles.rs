//! Capability checks delegated to the external role authority.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::AccountId;

/// Named capabilities the core asks the role authority about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Full administrative capability.
    Admin,
    /// Pool administration: parameters, direct admission, forfeiture.
    PoolAdmin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::PoolAdmin => f.write_str("pool_admin"),
        }
    }
}

/// External role authority.
pub trait RoleAuthority: Send + Sync + fmt::Debug {
    /// Returns `true` if `account` holds `capability`.
    fn has_capability(&self, capability: Capability, account: &AccountId) -> bool;

    /// Returns `true` if `account` holds admin or pool-admin capability.
    fn is_privileged(&self, account: &AccountId) -> bool {
        self.has_capability(Capability::Admin, account)
            || self.has_capability(Capability::PoolAdmin, account)
    }
}

/// Role authority backed by a fixed grant table.
#[derive(Debug, Default, Clone)]
pub struct StaticRoleAuthority {
    grants: HashMap<Capability, HashSet<AccountId>>,
}

impl StaticRoleAuthority {
    /// Creates an authority with no grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `capability` to `account`.
    #[must_use]
    pub fn with_grant(mut self, capability: Capability, account: AccountId) -> Self {
        self.grants.entry(capability).or_default().insert(account);
        self
    }

    /// Grants `capability` to every account in `accounts`.
    #[must_use]
    pub fn with_grants(
        self,
        capability: Capability,
        accounts: impl IntoIterator<Item = AccountId>,
    ) -> Self {
        accounts
            .into_iter()
            .fold(self, |auth, account| auth.with_grant(capability, account))
    }
}

impl RoleAuthority for StaticRoleAuthority {
    fn has_capability(&self, capability: Capability, account: &AccountId) -> bool {
        self.grants
            .get(&capability)
            .is_some_and(|accounts| accounts.contains(account))
    }
}
