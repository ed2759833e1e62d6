//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams committed membership events
//! to clients, filtered by the pools they subscribed to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
