//! Pool storage with sequential ids and an enumerable id index.
//!
//! [`PoolRegistry`] owns every [`Pool`]. Ids start at 1 and are never
//! reused. The id list supports O(1) deletion through
//! [`IndexedSet`] swap-with-last removal, so list order is not stable
//! across deletions; [`PoolRegistry::list`] sorts by id.

use std::collections::HashMap;

use super::indexed_set::IndexedSet;
use super::pool::{Pool, PoolSummary};
use super::PoolId;
use crate::error::PoolError;

/// Central store for all pools.
#[derive(Debug)]
pub struct PoolRegistry {
    pools: HashMap<PoolId, Pool>,
    ids: IndexedSet<PoolId>,
    next_id: u64,
}

impl PoolRegistry {
    /// Creates an empty registry whose first id will be 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            ids: IndexedSet::new(),
            next_id: 1,
        }
    }

    /// Id that the next [`Self::insert`] will assign.
    #[must_use]
    pub fn peek_next_id(&self) -> PoolId {
        PoolId::new(self.next_id)
    }

    /// Stores `build(id)` under the next sequential id.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Internal`] if the id space is exhausted.
    pub fn insert(&mut self, build: impl FnOnce(PoolId) -> Pool) -> Result<PoolId, PoolError> {
        let pool_id = PoolId::new(self.next_id);
        let next = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| PoolError::Internal("pool id space exhausted".to_string()))?;
        self.pools.insert(pool_id, build(pool_id));
        self.ids.insert(pool_id);
        self.next_id = next;
        Ok(pool_id)
    }

    /// Returns the pool with `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool exists.
    pub fn get(&self, pool_id: PoolId) -> Result<&Pool, PoolError> {
        self.pools
            .get(&pool_id)
            .ok_or(PoolError::PoolNotFound(pool_id))
    }

    /// Mutable variant of [`Self::get`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool exists.
    pub fn get_mut(&mut self, pool_id: PoolId) -> Result<&mut Pool, PoolError> {
        self.pools
            .get_mut(&pool_id)
            .ok_or(PoolError::PoolNotFound(pool_id))
    }

    /// Removes a pool and its enumeration entry, returning the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolNotFound`] if no such pool exists.
    pub fn remove(&mut self, pool_id: PoolId) -> Result<Pool, PoolError> {
        let pool = self
            .pools
            .remove(&pool_id)
            .ok_or(PoolError::PoolNotFound(pool_id))?;
        self.ids.remove(&pool_id);
        Ok(pool)
    }

    /// Ids in enumeration (dense-array) order.
    #[must_use]
    pub fn ids(&self) -> &[PoolId] {
        self.ids.as_slice()
    }

    /// Iterates over every pool in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.ids.iter().filter_map(|id| self.pools.get(id))
    }

    /// Summaries of all pools ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<PoolSummary> {
        let mut summaries: Vec<PoolSummary> = self.iter().map(PoolSummary::from).collect();
        summaries.sort_by_key(|s| s.pool_id);
        summaries
    }

    /// Number of pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns `true` if the registry contains no pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
