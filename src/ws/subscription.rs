//! Per-connection subscription manager.
//!
//! Tracks which pool IDs a WebSocket client is subscribed to and
//! provides server-side event filtering. Events not tied to a pool
//! (forfeiture, claims, recovery) only reach wildcard subscribers.

use std::collections::HashSet;

use crate::domain::PoolId;

/// Manages the set of pool subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed pool IDs. If `subscribe_all` is true, this set is ignored.
    pool_ids: HashSet<PoolId>,
    /// Whether the client subscribes to all pools (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds pool IDs to the subscription set. `wildcard` enables `"*"`.
    pub fn subscribe(&mut self, ids: &[PoolId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.pool_ids.extend(ids.iter().copied());
    }

    /// Removes pool IDs from the subscription set. `wildcard` clears `"*"`.
    pub fn unsubscribe(&mut self, ids: &[PoolId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.pool_ids.remove(id);
        }
    }

    /// Returns `true` if an event for `pool_id` passes the filter.
    #[must_use]
    pub fn matches(&self, pool_id: Option<PoolId>) -> bool {
        match pool_id {
            Some(id) => self.subscribe_all || self.pool_ids.contains(&id),
            None => self.subscribe_all,
        }
    }

    /// Returns the number of explicitly subscribed pool IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pool_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
