//! Background task appending bus events to the event log.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::postgres::PostgresPersistence;
use crate::domain::EventBus;

/// Subscribes to `event_bus` and appends every event to `persistence`
/// until the bus closes.
///
/// Write failures are logged and skipped; the in-memory state stays
/// authoritative.
#[must_use]
pub fn spawn_event_writer(persistence: PostgresPersistence, event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(err) = persistence.record(&event).await {
                        tracing::error!(
                            event_type = event.event_type_str(),
                            error = %err,
                            "failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event writer lagged; events not persisted");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::info!("event writer stopped");
    })
}
