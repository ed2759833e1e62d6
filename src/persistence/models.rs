//! Database models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored event row from the `pool_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Pool that generated the event; `None` for account-level events.
    pub pool_id: Option<i64>,
    /// Event type discriminator (e.g. `"member_added"`).
    pub event_type: String,
    /// JSONB payload with the serialized event.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}
