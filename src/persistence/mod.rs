//! Persistence layer: append-only PostgreSQL event log.
//!
//! The in-memory core is authoritative. When persistence is enabled, a
//! background writer drains the [`EventBus`](crate::domain::EventBus)
//! and appends every committed [`PoolEvent`](crate::domain::PoolEvent)
//! to the `pool_events` table through `sqlx::PgPool`.

pub mod models;
pub mod postgres;
pub mod writer;

pub use models::StoredEvent;
pub use postgres::PostgresPersistence;
pub use writer::spawn_event_writer;
