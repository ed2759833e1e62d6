//! Service layer: business logic orchestration.
//!
//! [`PoolService`] composes the domain aggregates, token custody, and the
//! governance collaborators into atomic operations, and emits events
//! through the [`super::domain::EventBus`].

mod admin;
mod join_requests;
mod members;
pub mod pool_service;
mod queries;
pub mod reentrancy;

pub use pool_service::{Collaborators, NewPool, PoolService};
pub use reentrancy::{Entered, Serialized};
