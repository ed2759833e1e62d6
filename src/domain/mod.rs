//! Domain layer: identifiers, pools, membership, join requests, and events.
//!
//! Everything here is plain data plus invariant-preserving mutators. No
//! type in this module talks to the token ledger or the role authority;
//! the service layer composes them into atomic operations.

pub mod event_bus;
pub mod ids;
pub mod indexed_set;
pub mod join_request;
pub mod membership;
pub mod peer_registry;
pub mod pool;
pub mod pool_event;
pub mod pool_registry;

pub use event_bus::EventBus;
pub use ids::{AccountId, PeerId, PoolId};
pub use indexed_set::IndexedSet;
pub use join_request::{
    JoinRequest, JoinRequestBook, JoinRequestStatus, JoinRequestView, RejectionRule, VoteOutcome,
    VoteThresholds,
};
pub use membership::RemovedSlot;
pub use peer_registry::{PeerBinding, PeerIdentityRegistry};
pub use pool::{MemberSlots, Pool, PoolParams, PoolSummary, SlotInfo};
pub use pool_event::{PoolEvent, PoolParameter};
pub use pool_registry::PoolRegistry;
