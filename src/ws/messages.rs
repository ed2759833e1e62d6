//! WebSocket message types: envelope, commands, and pool-id parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PoolId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific pools.
    Subscribe {
        /// Pool IDs to subscribe to. Use `["*"]` for all pools and
        /// account-level events.
        pool_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific pools.
    Unsubscribe {
        /// Pool IDs to unsubscribe from; `"*"` drops the wildcard.
        pool_ids: Vec<String>,
    },
}

/// Pool-id list parsed from a subscribe/unsubscribe command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PoolSelection {
    /// Numeric pool ids.
    pub ids: Vec<PoolId>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
    /// Entries that were neither `"*"` nor a pool id.
    pub rejected: Vec<String>,
}

impl PoolSelection {
    /// Parses raw command entries.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut selection = Self::default();
        for entry in raw {
            let entry = entry.trim();
            if entry == "*" {
                selection.wildcard = true;
            } else if let Ok(id) = entry.parse::<u64>() {
                selection.ids.push(PoolId::new(id));
            } else {
                selection.rejected.push(entry.to_string());
            }
        }
        selection
    }
}
