//! # storage-pools
//!
//! Membership ledger for decentralized storage pools.
//!
//! Accounts create pools, ask to join them by escrowing collateral tokens
//! under a peer id, and are admitted or refused by member votes or by an
//! administrator. Leaving a pool returns the collateral that was locked
//! for that slot; refunds that cannot be delivered are kept as claimable
//! balances instead of failing the operation.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PoolService (service/)        serialized core, re-entry latch
//!     ├── EventBus (domain/)
//!     │
//!     ├── PoolRegistry, PeerIdentityRegistry, JoinRequestBook (domain/)
//!     ├── TokenCustody, ClaimableLedger (custody/)
//!     ├── RoleAuthority, PauseGate, Clock (governance/)
//!     │
//!     └── PostgreSQL event log (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod custody;
pub mod domain;
pub mod error;
pub mod governance;
pub mod persistence;
pub mod service;
pub mod ws;
