//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching subscription commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{PoolSelection, WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::PoolEvent;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<PoolEvent>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    tracing::debug!("ws connection opened");

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if !subs.matches(pool_event.pool_id()) {
                            continue;
                        }
                        let Some(json) = event_message(&pool_event) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Wraps an event in the envelope and serializes it.
fn event_message(event: &PoolEvent) -> Option<String> {
    let payload = serde_json::to_value(event).ok()?;
    let msg = WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        payload,
    );
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };
    if msg.msg_type != WsMessageType::Command {
        return serde_json::to_string(&WsMessage::error(msg.id, 400, "expected a command")).ok();
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let payload = match command {
        WsCommand::Subscribe { pool_ids } => {
            let selection = PoolSelection::parse(&pool_ids);
            subs.subscribe(&selection.ids, selection.wildcard);
            serde_json::json!({
                "subscribed": selection.ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "rejected": selection.rejected,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { pool_ids } => {
            let selection = PoolSelection::parse(&pool_ids);
            subs.unsubscribe(&selection.ids, selection.wildcard);
            serde_json::json!({
                "unsubscribed": selection.ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
    };
    serde_json::to_string(&WsMessage::new(msg.id, WsMessageType::Response, payload)).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PoolId;

    fn command(payload: serde_json::Value) -> String {
        let msg = WsMessage::new("c1".to_string(), WsMessageType::Command, payload);
        serde_json::to_string(&msg).unwrap_or_default()
    }

    #[test]
    fn subscribe_updates_filter() {
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({ "command": "subscribe", "pool_ids": ["5"] }));
        let Some(reply) = handle_text_message(&text, &mut subs) else {
            panic!("reply expected");
        };
        assert!(reply.contains("\"response\""));
        assert!(subs.matches(Some(PoolId::new(5))));
    }

    #[test]
    fn malformed_json_is_an_error_reply() {
        let mut subs = SubscriptionManager::new();
        let Some(reply) = handle_text_message("{not json", &mut subs) else {
            panic!("reply expected");
        };
        assert!(reply.contains("malformed JSON"));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({ "command": "teleport" }));
        let Some(reply) = handle_text_message(&text, &mut subs) else {
            panic!("reply expected");
        };
        assert!(reply.contains("unknown command"));
    }
}
