//! PostgreSQL implementation of the event log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::StoredEvent;
use crate::domain::{PoolEvent, PoolId};
use crate::error::PoolError;

type EventRow = (i64, Option<i64>, String, serde_json::Value, DateTime<Utc>);

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

fn db_error(err: sqlx::Error) -> PoolError {
    PoolError::PersistenceError(err.to_string())
}

/// Pool ids are stored as `BIGINT`; values beyond `i64::MAX` are clamped.
fn pool_key(pool_id: PoolId) -> i64 {
    i64::try_from(pool_id.get()).unwrap_or(i64::MAX)
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PoolError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PoolError::PersistenceError(e.to_string()))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        pool_id: Option<PoolId>,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, PoolError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO pool_events (pool_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(pool_id.map(pool_key))
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    /// Serializes and appends a domain event.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError::PersistenceError`] if serialization or the
    /// insert fails.
    pub async fn record(&self, event: &PoolEvent) -> Result<i64, PoolError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| PoolError::PersistenceError(e.to_string()))?;
        self.save_event(event.pool_id(), event.event_type_str(), &payload)
            .await
    }

    /// Loads events after the given timestamp, optionally filtered by pool ID.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, PoolError> {
        let rows = if let Some(pid) = pool_id {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, pool_id, event_type, payload, created_at FROM pool_events \
                 WHERE created_at > $1 AND pool_id = $2 ORDER BY id ASC",
            )
            .bind(after)
            .bind(pool_key(pid))
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, EventRow>(
                "SELECT id, pool_id, event_type, payload, created_at FROM pool_events \
                 WHERE created_at > $1 ORDER BY id ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, pool_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    pool_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`PoolError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, PoolError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM pool_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
