//! Join requests and the vote-threshold rules that resolve them.
//!
//! A request is live only while `Pending`. Reaching any terminal status
//! deletes it from the [`JoinRequestBook`]; terminal statuses exist only
//! in notifications.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{AccountId, PeerId, PoolId};
use crate::error::PoolError;

/// Lifecycle status of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    /// Awaiting votes.
    Pending,
    /// Admitted as a member.
    Approved,
    /// Refused by vote, override, or forfeiture.
    Rejected,
    /// Withdrawn by the requester, creator, or an admin.
    Cancelled,
}

/// A live admission attempt for one peer id.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    /// Requesting account.
    pub account: AccountId,
    /// Target pool.
    pub pool_id: PoolId,
    /// Peer id asking for a slot.
    pub peer_id: PeerId,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Always `Pending` while stored.
    pub status: JoinRequestStatus,
    /// Approval votes cast.
    pub approvals: u32,
    /// Rejection votes cast.
    pub rejections: u32,
    /// Collateral escrowed at submission; becomes the slot snapshot.
    pub escrowed: u128,
    /// Whether submission created the peer binding (undone on refusal).
    pub fresh_binding: bool,
    votes: HashSet<PeerId>,
}

impl JoinRequest {
    /// Creates a pending request with no votes.
    #[must_use]
    pub fn new(
        account: AccountId,
        pool_id: PoolId,
        peer_id: PeerId,
        escrowed: u128,
        fresh_binding: bool,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account,
            pool_id,
            peer_id,
            submitted_at,
            status: JoinRequestStatus::Pending,
            approvals: 0,
            rejections: 0,
            escrowed,
            fresh_binding,
            votes: HashSet::new(),
        }
    }

    /// Returns `true` if `voter` already voted on this request.
    #[must_use]
    pub fn has_voted(&self, voter: &PeerId) -> bool {
        self.votes.contains(voter)
    }

    /// Records one vote from `voter`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::AlreadyVoted`] if `voter` has voted before.
    pub fn record_vote(&mut self, voter: &PeerId, approve: bool) -> Result<(), PoolError> {
        if !self.votes.insert(voter.clone()) {
            return Err(PoolError::AlreadyVoted {
                voter: voter.clone(),
            });
        }
        if approve {
            self.approvals = self.approvals.saturating_add(1);
        } else {
            self.rejections = self.rejections.saturating_add(1);
        }
        Ok(())
    }

    /// Decides whether the current tally resolves the request.
    ///
    /// Forfeiture wins over any approval count.
    #[must_use]
    pub fn evaluate(
        &self,
        thresholds: &VoteThresholds,
        member_count: u64,
        requester_forfeited: bool,
    ) -> VoteOutcome {
        if requester_forfeited {
            return VoteOutcome::Reject;
        }
        if u64::from(self.approvals) >= thresholds.approval(member_count) {
            return VoteOutcome::Approve;
        }
        if u64::from(self.rejections) >= thresholds.rejection(member_count) {
            return VoteOutcome::Reject;
        }
        VoteOutcome::Pending
    }
}

/// Read-only projection of a live request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinRequestView {
    /// Target pool.
    pub pool_id: PoolId,
    /// Requesting account.
    pub account: AccountId,
    /// Peer id asking for a slot.
    pub peer_id: PeerId,
    /// Current status.
    pub status: JoinRequestStatus,
    /// Approval votes cast.
    pub approvals: u32,
    /// Rejection votes cast.
    pub rejections: u32,
    /// Escrowed amount (string-encoded u128).
    pub escrowed: String,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl From<&JoinRequest> for JoinRequestView {
    fn from(req: &JoinRequest) -> Self {
        Self {
            pool_id: req.pool_id,
            account: req.account.clone(),
            peer_id: req.peer_id.clone(),
            status: req.status,
            approvals: req.approvals,
            rejections: req.rejections,
            escrowed: req.escrowed.to_string(),
            submitted_at: req.submitted_at,
        }
    }
}

/// Result of evaluating a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Threshold not reached.
    Pending,
    /// Admit the requester.
    Approve,
    /// Refuse the requester and refund (or divert) the escrow.
    Reject,
}

/// Formula used for the rejection threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionRule {
    /// Same one-third-ceiling formula as approvals.
    #[default]
    Symmetric,
    /// Strict majority: `floor(n/2) + 1`.
    Majority,
}

impl FromStr for RejectionRule {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symmetric" => Ok(Self::Symmetric),
            "majority" => Ok(Self::Majority),
            other => Err(PoolError::InvalidRequest(format!(
                "unknown rejection rule: {other}"
            ))),
        }
    }
}

impl fmt::Display for RejectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symmetric => f.write_str("symmetric"),
            Self::Majority => f.write_str("majority"),
        }
    }
}

/// Vote counts needed to auto-resolve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteThresholds {
    /// Upper bound on either threshold.
    pub cap: u64,
    /// Rejection formula.
    pub rejection_rule: RejectionRule,
}

impl VoteThresholds {
    /// `n <= 2 ? 1 : ceil(n / 3)`, capped.
    #[must_use]
    pub fn approval(&self, member_count: u64) -> u64 {
        let raw = if member_count <= 2 {
            1
        } else {
            member_count.div_ceil(3)
        };
        raw.min(self.cap).max(1)
    }

    /// Rejection threshold under the configured rule, capped.
    #[must_use]
    pub fn rejection(&self, member_count: u64) -> u64 {
        match self.rejection_rule {
            RejectionRule::Symmetric => self.approval(member_count),
            RejectionRule::Majority => (member_count / 2)
                .saturating_add(1)
                .min(self.cap)
                .max(1),
        }
    }
}

impl Default for VoteThresholds {
    fn default() -> Self {
        Self {
            cap: 10,
            rejection_rule: RejectionRule::Symmetric,
        }
    }
}

/// All live join requests, keyed by peer id across every pool.
#[derive(Debug, Default)]
pub struct JoinRequestBook {
    requests: HashMap<PeerId, JoinRequest>,
}

impl JoinRequestBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live request for `peer`.
    #[must_use]
    pub fn get(&self, peer: &PeerId) -> Option<&JoinRequest> {
        self.requests.get(peer)
    }

    /// Returns the live request for `peer` in `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::JoinRequestNotFound`] if there is none.
    pub fn get_in_pool(&self, pool_id: PoolId, peer: &PeerId) -> Result<&JoinRequest, PoolError> {
        self.requests
            .get(peer)
            .filter(|req| req.pool_id == pool_id)
            .ok_or_else(|| PoolError::JoinRequestNotFound {
                pool_id,
                peer_id: peer.clone(),
            })
    }

    /// Mutable variant of [`Self::get_in_pool`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::JoinRequestNotFound`] if there is none.
    pub fn get_in_pool_mut(
        &mut self,
        pool_id: PoolId,
        peer: &PeerId,
    ) -> Result<&mut JoinRequest, PoolError> {
        self.requests
            .get_mut(peer)
            .filter(|req| req.pool_id == pool_id)
            .ok_or_else(|| PoolError::JoinRequestNotFound {
                pool_id,
                peer_id: peer.clone(),
            })
    }

    /// Returns `true` if `peer` has a live request anywhere.
    #[must_use]
    pub fn contains(&self, peer: &PeerId) -> bool {
        self.requests.contains_key(peer)
    }

    /// Stores a new request.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::JoinRequestExists`] if `peer` already has one.
    pub fn insert(&mut self, request: JoinRequest) -> Result<(), PoolError> {
        if self.requests.contains_key(&request.peer_id) {
            return Err(PoolError::JoinRequestExists {
                peer_id: request.peer_id,
            });
        }
        self.requests.insert(request.peer_id.clone(), request);
        Ok(())
    }

    /// Deletes and returns the request for `peer`.
    pub fn remove(&mut self, peer: &PeerId) -> Option<JoinRequest> {
        self.requests.remove(peer)
    }
}
