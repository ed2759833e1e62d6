//! Join-request lifecycle: submission, voting, cancellation, overrides.

use chrono::{DateTime, Utc};

use super::pool_service::{CoreState, PoolService, claimable_event};
use crate::custody::ClaimKey;
use crate::domain::{
    AccountId, JoinRequest, JoinRequestStatus, PeerId, PoolEvent, PoolId, VoteOutcome,
};
use crate::error::PoolError;

impl PoolService {
    /// Opens a join request for `peer` in `pool_id`, escrowing the pool's
    /// current `required_tokens` from `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forfeited`],
    /// [`PoolError::PoolNotFound`], [`PoolError::PeerAlreadyMember`],
    /// [`PoolError::JoinRequestExists`], [`PoolError::PeerBound`],
    /// [`PoolError::CapacityReached`], or an economic error.
    pub fn submit_join_request(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        peer: &PeerId,
    ) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        if core.is_forfeited(caller) {
            return Err(PoolError::Forfeited(caller.clone()));
        }
        let pool = core.pools.get(pool_id)?;
        if pool.is_peer_member(peer) {
            return Err(PoolError::PeerAlreadyMember {
                pool_id,
                peer_id: peer.clone(),
            });
        }
        if core.requests.contains(peer) {
            return Err(PoolError::JoinRequestExists {
                peer_id: peer.clone(),
            });
        }
        core.peers.check(peer, caller, Some(pool_id))?;
        pool.ensure_capacity()?;
        let escrowed = pool.params.required_tokens;

        self.custody.lock(caller, escrowed)?;

        let fresh_binding = core.peers.bind(peer, caller, Some(pool_id))?;
        core.requests.insert(JoinRequest::new(
            caller.clone(),
            pool_id,
            peer.clone(),
            escrowed,
            fresh_binding,
            now,
        ))?;
        let pool = core.pools.get_mut(pool_id)?;
        pool.pending.insert(peer.clone());
        pool.updated_at = now;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::JoinRequestSubmitted {
            pool_id,
            account: caller.clone(),
            peer_id: peer.clone(),
            escrowed: escrowed.to_string(),
            timestamp: now,
        });
        tracing::info!(%pool_id, account = %caller, peer_id = %peer, escrowed, "join request submitted");
        Ok(())
    }

    /// Records a member's vote and resolves the request once a threshold
    /// is reached (or at once if the requester is forfeited).
    ///
    /// `voter_peer` must be a current member slot of the pool owned by
    /// `caller`. Returns the request status after the vote.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::PoolNotFound`],
    /// [`PoolError::JoinRequestNotFound`], [`PoolError::PeerNotMember`],
    /// [`PoolError::Forbidden`], or [`PoolError::AlreadyVoted`].
    pub fn vote_on_join_request(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        peer: &PeerId,
        voter_peer: &PeerId,
        approve: bool,
    ) -> Result<JoinRequestStatus, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        let pool = core.pools.get(pool_id)?;
        match pool.member_of_peer(voter_peer) {
            None => {
                return Err(PoolError::PeerNotMember {
                    pool_id,
                    peer_id: voter_peer.clone(),
                });
            }
            Some(owner) if owner != caller => {
                return Err(PoolError::Forbidden(format!(
                    "peer {voter_peer} is not owned by {caller}"
                )));
            }
            Some(_) => {}
        }
        let member_count = pool.member_count;
        let thresholds = self.config.thresholds();

        let request = core.requests.get_in_pool_mut(pool_id, peer)?;
        request.record_vote(voter_peer, approve)?;
        let (approvals, rejections) = (request.approvals, request.rejections);
        let requester = request.account.clone();
        let forfeited = core.forfeited.contains(&requester);
        let outcome = core
            .requests
            .get_in_pool(pool_id, peer)?
            .evaluate(&thresholds, member_count, forfeited);

        let mut events = vec![PoolEvent::VoteCast {
            pool_id,
            peer_id: peer.clone(),
            voter_peer_id: voter_peer.clone(),
            approve,
            approvals,
            rejections,
            timestamp: now,
        }];
        let status = match outcome {
            VoteOutcome::Pending => JoinRequestStatus::Pending,
            VoteOutcome::Approve => {
                self.admit_request(core, pool_id, peer, now, &mut events)?;
                JoinRequestStatus::Approved
            }
            VoteOutcome::Reject => {
                self.refuse_request(
                    core,
                    pool_id,
                    peer,
                    JoinRequestStatus::Rejected,
                    now,
                    &mut events,
                )?;
                JoinRequestStatus::Rejected
            }
        };
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(
            %pool_id,
            peer_id = %peer,
            voter = %voter_peer,
            approve,
            approvals,
            rejections,
            ?status,
            "vote recorded"
        );
        Ok(status)
    }

    /// Withdraws a pending request and refunds its escrow to the
    /// requester (or burns it if the requester is forfeited).
    ///
    /// Allowed for the requester, the pool creator, or a privileged
    /// account.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::PoolNotFound`],
    /// [`PoolError::JoinRequestNotFound`], or [`PoolError::Forbidden`].
    pub fn cancel_join_request(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        peer: &PeerId,
    ) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        let creator = core.pools.get(pool_id)?.creator.clone();
        let requester = core.requests.get_in_pool(pool_id, peer)?.account.clone();
        if *caller != requester && *caller != creator && !self.roles.is_privileged(caller) {
            return Err(PoolError::Forbidden(format!(
                "{caller} may not cancel the request of peer {peer}"
            )));
        }

        let mut events = Vec::new();
        self.refuse_request(
            core,
            pool_id,
            peer,
            JoinRequestStatus::Cancelled,
            now,
            &mut events,
        )?;
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(%pool_id, peer_id = %peer, cancelled_by = %caller, "join request cancelled");
        Ok(())
    }

    /// Admin override: admits the requester without waiting for votes.
    ///
    /// A forfeited requester is rejected instead and its escrow burned.
    /// Returns the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forbidden`],
    /// [`PoolError::PoolNotFound`], or [`PoolError::JoinRequestNotFound`].
    pub fn approve_join_request(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        peer: &PeerId,
    ) -> Result<JoinRequestStatus, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        self.require_pool_admin(caller)?;
        let core = &mut *guard;

        core.pools.get(pool_id)?;
        let requester = core.requests.get_in_pool(pool_id, peer)?.account.clone();

        let mut events = Vec::new();
        let status = if core.is_forfeited(&requester) {
            self.refuse_request(
                core,
                pool_id,
                peer,
                JoinRequestStatus::Rejected,
                now,
                &mut events,
            )?;
            JoinRequestStatus::Rejected
        } else {
            self.admit_request(core, pool_id, peer, now, &mut events)?;
            JoinRequestStatus::Approved
        };
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(%pool_id, peer_id = %peer, approved_by = %caller, ?status, "join request overridden");
        Ok(status)
    }

    /// Admin shortcut: adds `peer` for `account` without escrow or votes.
    /// The slot is recorded with a zero collateral snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forbidden`],
    /// [`PoolError::PoolNotFound`], [`PoolError::Forfeited`],
    /// [`PoolError::PeerAlreadyMember`], [`PoolError::JoinRequestExists`],
    /// [`PoolError::PeerBound`], or [`PoolError::CapacityReached`].
    pub fn add_member_direct(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        account: &AccountId,
        peer: &PeerId,
    ) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        self.require_pool_admin(caller)?;
        let core = &mut *guard;

        let pool = core.pools.get(pool_id)?;
        if core.forfeited.contains(account) {
            return Err(PoolError::Forfeited(account.clone()));
        }
        if pool.is_peer_member(peer) {
            return Err(PoolError::PeerAlreadyMember {
                pool_id,
                peer_id: peer.clone(),
            });
        }
        if core.requests.contains(peer) {
            return Err(PoolError::JoinRequestExists {
                peer_id: peer.clone(),
            });
        }
        core.peers.check(peer, account, Some(pool_id))?;
        pool.ensure_capacity()?;

        let pool = core.pools.get_mut(pool_id)?;
        pool.add_member(account, peer, 0)?;
        pool.updated_at = now;
        core.peers.bind(peer, account, Some(pool_id))?;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::MemberAdded {
            pool_id,
            account: account.clone(),
            peer_id: peer.clone(),
            locked_tokens: "0".to_string(),
            timestamp: now,
        });
        tracing::info!(%pool_id, %account, peer_id = %peer, added_by = %caller, "member added directly");
        Ok(())
    }

    /// Moves a live request into the member set; its escrow becomes the
    /// slot snapshot.
    fn admit_request(
        &self,
        core: &mut CoreState,
        pool_id: PoolId,
        peer: &PeerId,
        now: DateTime<Utc>,
        events: &mut Vec<PoolEvent>,
    ) -> Result<(), PoolError> {
        let pool = core.pools.get_mut(pool_id)?;
        if pool.is_peer_member(peer) {
            return Err(PoolError::PeerAlreadyMember {
                pool_id,
                peer_id: peer.clone(),
            });
        }
        let Some(request) = core.requests.remove(peer) else {
            return Err(PoolError::JoinRequestNotFound {
                pool_id,
                peer_id: peer.clone(),
            });
        };
        pool.pending.remove(peer);
        pool.add_member(&request.account, peer, request.escrowed)?;
        pool.updated_at = now;
        core.peers.bind(peer, &request.account, Some(pool_id))?;

        events.push(PoolEvent::JoinRequestResolved {
            pool_id,
            account: request.account.clone(),
            peer_id: peer.clone(),
            status: JoinRequestStatus::Approved,
            refund: None,
            timestamp: now,
        });
        events.push(PoolEvent::MemberAdded {
            pool_id,
            account: request.account,
            peer_id: peer.clone(),
            locked_tokens: request.escrowed.to_string(),
            timestamp: now,
        });
        Ok(())
    }

    /// Deletes a live request with a terminal `status` and returns its
    /// escrow. The peer binding is released only if submission created it.
    fn refuse_request(
        &self,
        core: &mut CoreState,
        pool_id: PoolId,
        peer: &PeerId,
        status: JoinRequestStatus,
        now: DateTime<Utc>,
        events: &mut Vec<PoolEvent>,
    ) -> Result<(), PoolError> {
        let pool = core.pools.get_mut(pool_id)?;
        let Some(request) = core.requests.remove(peer) else {
            return Err(PoolError::JoinRequestNotFound {
                pool_id,
                peer_id: peer.clone(),
            });
        };
        pool.pending.remove(peer);
        pool.updated_at = now;
        if request.fresh_binding {
            core.peers.unbind(peer);
        }

        let forfeited = core.forfeited.contains(&request.account);
        let outcome = self.custody.refund(
            &mut core.claimable,
            ClaimKey::Peer(peer.clone()),
            &request.account,
            request.escrowed,
            forfeited,
        );
        events.extend(claimable_event(Some(pool_id), &outcome, now));
        events.push(PoolEvent::JoinRequestResolved {
            pool_id,
            account: request.account,
            peer_id: peer.clone(),
            status,
            refund: Some(outcome),
            timestamp: now,
        });
        Ok(())
    }
}
