//! Data Transfer Objects for REST request/response serialization.
//!
//! All token amounts are serialized as JSON strings to prevent
//! precision loss on u128 values.

pub mod account_dto;
pub mod common_dto;
pub mod membership_dto;
pub mod pool_dto;

pub use account_dto::*;
pub use common_dto::*;
pub use membership_dto::*;
pub use pool_dto::*;
