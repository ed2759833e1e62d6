//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every committed
//! operation publishes its [`PoolEvent`]s through the bus; WebSocket
//! connections and the event-log writer subscribe to it.

use tokio::sync::broadcast;

use super::PoolEvent;

/// Broadcast bus for [`PoolEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: PoolEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Publishes a batch in order, returning the number of deliveries.
    pub fn publish_all(&self, events: impl IntoIterator<Item = PoolEvent>) -> usize {
        events
            .into_iter()
            .map(|event| self.publish(event))
            .sum()
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, PoolId};
    use chrono::Utc;

    fn make_event(pool_id: PoolId) -> PoolEvent {
        PoolEvent::PoolDeleted {
            pool_id,
            deleted_by: AccountId::from("alice"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        let count = bus.publish(make_event(PoolId::new(1)));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_batch_in_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let delivered = bus.publish_all(vec![make_event(PoolId::new(1)), make_event(PoolId::new(2))]);
        assert_eq!(delivered, 2);

        let Ok(first) = rx.recv().await else {
            panic!("expected first event");
        };
        let Ok(second) = rx.recv().await else {
            panic!("expected second event");
        };
        assert_eq!(first.pool_id(), Some(PoolId::new(1)));
        assert_eq!(second.pool_id(), Some(PoolId::new(2)));
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
