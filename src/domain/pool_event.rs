//! Notifications emitted after every committed state transition.
//!
//! Events are published through the [`super::EventBus`] only after the
//! operation that produced them has fully committed. Amounts are
//! string-encoded to preserve u128 precision in JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{AccountId, PeerId, PoolId};
use super::join_request::JoinRequestStatus;
use crate::custody::RefundOutcome;

/// Which pool parameter an admin changed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolParameter {
    /// `max_members`.
    MaxMembers,
    /// `required_tokens`.
    RequiredTokens,
}

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A pool was created.
    PoolCreated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Creator account.
        creator: AccountId,
        /// Display name.
        name: String,
        /// Display region.
        region: String,
        /// Collateral per slot.
        required_tokens: String,
        /// Slot limit (0 = unlimited).
        max_members: u64,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pool was deleted.
    PoolDeleted {
        /// Pool identifier.
        pool_id: PoolId,
        /// Account that deleted it.
        deleted_by: AccountId,
        /// Deletion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A join request was submitted and its collateral escrowed.
    JoinRequestSubmitted {
        /// Pool identifier.
        pool_id: PoolId,
        /// Requesting account.
        account: AccountId,
        /// Requested peer id.
        peer_id: PeerId,
        /// Escrowed amount.
        escrowed: String,
        /// Submission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A member cast a vote on a pending request.
    VoteCast {
        /// Pool identifier.
        pool_id: PoolId,
        /// Peer id the request is for.
        peer_id: PeerId,
        /// Voting member's peer id.
        voter_peer_id: PeerId,
        /// Approve (`true`) or reject.
        approve: bool,
        /// Approvals after this vote.
        approvals: u32,
        /// Rejections after this vote.
        rejections: u32,
        /// Vote timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A join request reached a terminal status and was deleted.
    JoinRequestResolved {
        /// Pool identifier.
        pool_id: PoolId,
        /// Requesting account.
        account: AccountId,
        /// Requested peer id.
        peer_id: PeerId,
        /// Terminal status.
        status: JoinRequestStatus,
        /// What happened to the escrow when it was not admitted.
        refund: Option<RefundOutcome>,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A peer id was admitted as a membership slot.
    MemberAdded {
        /// Pool identifier.
        pool_id: PoolId,
        /// Owning account.
        account: AccountId,
        /// Admitted peer id.
        peer_id: PeerId,
        /// Collateral snapshot for the slot.
        locked_tokens: String,
        /// Admission timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A membership slot was released.
    MemberRemoved {
        /// Pool identifier.
        pool_id: PoolId,
        /// Owning account.
        account: AccountId,
        /// Released peer id.
        peer_id: PeerId,
        /// Whether the owner was forfeited at removal time.
        forfeited: bool,
        /// Where the slot collateral went.
        refund: RefundOutcome,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A forfeiture flag was set or cleared.
    ForfeitureUpdated {
        /// Affected account.
        account: AccountId,
        /// New flag value.
        forfeited: bool,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pool parameter changed.
    PoolParametersUpdated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Changed parameter.
        parameter: PoolParameter,
        /// Previous value.
        old_value: String,
        /// New value.
        new_value: String,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A direct transfer failed and the amount was credited as claimable.
    TokensClaimable {
        /// Pool the refund originated from, if any.
        pool_id: Option<PoolId>,
        /// Account entitled to claim.
        owner: AccountId,
        /// Claim key (account or peer id).
        key: String,
        /// Credited amount.
        amount: String,
        /// Credit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A claimable balance was paid out.
    TokensClaimed {
        /// Claiming account.
        owner: AccountId,
        /// Claim key (account or peer id).
        key: String,
        /// Paid amount.
        amount: String,
        /// Claim timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Custody balance was swept to the burn sink.
    EmergencyRecovery {
        /// Admin that triggered the sweep.
        admin: AccountId,
        /// Swept amount after clamping.
        amount: String,
        /// Sweep timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool associated with this event, if any.
    #[must_use]
    pub fn pool_id(&self) -> Option<PoolId> {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::PoolDeleted { pool_id, .. }
            | Self::JoinRequestSubmitted { pool_id, .. }
            | Self::VoteCast { pool_id, .. }
            | Self::JoinRequestResolved { pool_id, .. }
            | Self::MemberAdded { pool_id, .. }
            | Self::MemberRemoved { pool_id, .. }
            | Self::PoolParametersUpdated { pool_id, .. } => Some(*pool_id),
            Self::TokensClaimable { pool_id, .. } => *pool_id,
            Self::ForfeitureUpdated { .. }
            | Self::TokensClaimed { .. }
            | Self::EmergencyRecovery { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::PoolDeleted { .. } => "pool_deleted",
            Self::JoinRequestSubmitted { .. } => "join_request_submitted",
            Self::VoteCast { .. } => "vote_cast",
            Self::JoinRequestResolved { .. } => "join_request_resolved",
            Self::MemberAdded { .. } => "member_added",
            Self::MemberRemoved { .. } => "member_removed",
            Self::ForfeitureUpdated { .. } => "forfeiture_updated",
            Self::PoolParametersUpdated { .. } => "pool_parameters_updated",
            Self::TokensClaimable { .. } => "tokens_claimable",
            Self::TokensClaimed { .. } => "tokens_claimed",
            Self::EmergencyRecovery { .. } => "emergency_recovery",
        }
    }
}
