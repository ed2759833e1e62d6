//! Pool service: orchestrates membership operations and emits events.
//!
//! Every mutating entry point follows the same pattern: enter the
//! serialized core, check the pause gate, validate everything, lock collateral
//! (the only step that may fail after validation), mutate, leave the
//! core, and only then publish the buffered events.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::reentrancy::{Entered, Serialized};
use crate::config::LedgerConfig;
use crate::custody::{ClaimKey, ClaimableLedger, RefundOutcome, TokenCustody, TokenLedger};
use crate::domain::{
    AccountId, EventBus, JoinRequestBook, PeerId, PeerIdentityRegistry, Pool, PoolEvent, PoolId,
    PoolParameter, PoolParams, PoolRegistry,
};
use crate::error::PoolError;
use crate::governance::{
    Capability, Clock, CooldownTracker, PauseGate, RateLimitedAction, RoleAuthority,
};

/// Mutable state of the membership core, only reachable through
/// [`Serialized::enter`].
#[derive(Debug)]
pub(super) struct CoreState {
    pub(super) pools: PoolRegistry,
    pub(super) peers: PeerIdentityRegistry,
    pub(super) requests: JoinRequestBook,
    pub(super) claimable: ClaimableLedger,
    pub(super) forfeited: HashSet<AccountId>,
    pub(super) cooldowns: CooldownTracker,
}

impl CoreState {
    fn new(config: &LedgerConfig) -> Self {
        Self {
            pools: PoolRegistry::new(),
            peers: PeerIdentityRegistry::new(),
            requests: JoinRequestBook::new(),
            claimable: ClaimableLedger::new(),
            forfeited: HashSet::new(),
            cooldowns: CooldownTracker::new(config.action_cooldown),
        }
    }

    pub(super) fn is_forfeited(&self, account: &AccountId) -> bool {
        self.forfeited.contains(account)
    }
}

/// External systems the core consults.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Token ledger holding collateral.
    pub token_ledger: Arc<dyn TokenLedger>,
    /// Capability source.
    pub roles: Arc<dyn RoleAuthority>,
    /// Global pause switch.
    pub pause: Arc<dyn PauseGate>,
    /// Time source for timestamps and cool-downs.
    pub clock: Arc<dyn Clock>,
}

/// Input of [`PoolService::create_pool`].
#[derive(Debug, Clone)]
pub struct NewPool {
    /// Display name.
    pub name: String,
    /// Display region.
    pub region: String,
    /// Requested collateral per slot; clamped to the creation lock amount.
    pub required_tokens: u128,
    /// Slot limit (0 = unlimited).
    pub max_members: u64,
    /// Opaque liveness parameter.
    pub min_ping_time: u64,
    /// Opaque challenge parameter.
    pub max_challenge_response_period: u64,
    /// Peer id the creator joins with, if any.
    pub creator_peer_id: Option<PeerId>,
}

/// Orchestration layer for all membership operations.
///
/// Owns the serialized core state and the collaborators; every mutation
/// emits its events through the [`EventBus`] after it has committed.
#[derive(Debug)]
pub struct PoolService {
    pub(super) core: Serialized<CoreState>,
    pub(super) custody: TokenCustody,
    pub(super) roles: Arc<dyn RoleAuthority>,
    pub(super) pause: Arc<dyn PauseGate>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) event_bus: EventBus,
    pub(super) config: LedgerConfig,
}

impl PoolService {
    /// Creates a new `PoolService` with empty state.
    #[must_use]
    pub fn new(config: LedgerConfig, collaborators: Collaborators, event_bus: EventBus) -> Self {
        let custody = TokenCustody::new(
            collaborators.token_ledger,
            config.custody_account.clone(),
            config.burn_account.clone(),
        );
        Self {
            core: Serialized::new(CoreState::new(&config)),
            custody,
            roles: collaborators.roles,
            pause: collaborators.pause,
            clock: collaborators.clock,
            event_bus,
            config,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the core settings.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns `true` if `account` holds `capability`.
    #[must_use]
    pub fn has_capability(&self, capability: Capability, account: &AccountId) -> bool {
        self.roles.has_capability(capability, account)
    }

    /// Creates a pool, locking the creation collateral from `caller`.
    ///
    /// Privileged callers lock nothing. `required_tokens` is clamped to
    /// the creation lock amount. When `creator_peer_id` is given the
    /// creator is admitted as the first member with the lock as its slot
    /// snapshot; otherwise the lock is held as the pool's creator escrow.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forfeited`],
    /// [`PoolError::InvalidRequest`], [`PoolError::RateLimited`],
    /// [`PoolError::PeerBound`], [`PoolError::JoinRequestExists`], or an
    /// economic error if the lock cannot be taken.
    pub fn create_pool(&self, caller: &AccountId, new_pool: NewPool) -> Result<PoolId, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        if core.is_forfeited(caller) {
            return Err(PoolError::Forfeited(caller.clone()));
        }
        self.validate_label("name", &new_pool.name)?;
        self.validate_label("region", &new_pool.region)?;
        core.cooldowns.check(RateLimitedAction::CreatePool, caller, now)?;

        if let Some(peer) = &new_pool.creator_peer_id {
            core.peers.check(peer, caller, None)?;
            if core.requests.contains(peer) {
                return Err(PoolError::JoinRequestExists {
                    peer_id: peer.clone(),
                });
            }
        }

        let lock_amount = if self.roles.is_privileged(caller) {
            0
        } else {
            self.config.pool_creation_lock_amount
        };
        let required_tokens = new_pool
            .required_tokens
            .min(self.config.pool_creation_lock_amount);

        self.custody.lock(caller, lock_amount)?;

        let params = PoolParams {
            name: new_pool.name,
            region: new_pool.region,
            required_tokens,
            max_members: new_pool.max_members,
            min_ping_time: new_pool.min_ping_time,
            max_challenge_response_period: new_pool.max_challenge_response_period,
        };
        let pool_id = core
            .pools
            .insert(|id| Pool::new(id, caller.clone(), params, now))?;
        let mut events = Vec::with_capacity(2);

        match &new_pool.creator_peer_id {
            Some(peer) => {
                core.peers.bind(peer, caller, None)?;
                core.pools.get_mut(pool_id)?.add_member(caller, peer, lock_amount)?;
                core.peers.bind(peer, caller, Some(pool_id))?;
            }
            None => core.pools.get_mut(pool_id)?.creator_escrow = lock_amount,
        }
        core.cooldowns.record(RateLimitedAction::CreatePool, caller, now);

        let pool = core.pools.get(pool_id)?;
        events.push(PoolEvent::PoolCreated {
            pool_id,
            creator: caller.clone(),
            name: pool.params.name.clone(),
            region: pool.params.region.clone(),
            required_tokens: required_tokens.to_string(),
            max_members: pool.params.max_members,
            timestamp: now,
        });
        if let Some(peer) = &new_pool.creator_peer_id {
            events.push(PoolEvent::MemberAdded {
                pool_id,
                account: caller.clone(),
                peer_id: peer.clone(),
                locked_tokens: lock_amount.to_string(),
                timestamp: now,
            });
        }
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(%pool_id, creator = %caller, lock_amount, "pool created");
        Ok(pool_id)
    }

    /// Deletes a pool.
    ///
    /// The creator may delete a pool whose only remaining member is
    /// itself; an admin may delete a pool with no members. Remaining
    /// creator slots and the creator escrow are refunded (or burned if
    /// the creator is forfeited).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::PoolNotFound`],
    /// [`PoolError::Forbidden`], [`PoolError::RateLimited`], or
    /// [`PoolError::InvalidState`] while members other than the creator
    /// or pending requests remain.
    pub fn delete_pool(&self, caller: &AccountId, pool_id: PoolId) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        let core = &mut *guard;

        let pool = core.pools.get(pool_id)?;
        let is_creator = pool.creator == *caller;
        if !is_creator && !self.roles.has_capability(Capability::Admin, caller) {
            return Err(PoolError::Forbidden(format!(
                "only the creator or an admin may delete pool {pool_id}"
            )));
        }
        core.cooldowns.check(RateLimitedAction::DeletePool, caller, now)?;
        if !pool.pending_requests().is_empty() {
            return Err(PoolError::InvalidState(format!(
                "pool {pool_id} still has pending join requests"
            )));
        }
        let only_creator_left = match pool.members() {
            [] => true,
            [only] => is_creator && *only == pool.creator,
            _ => false,
        };
        if !only_creator_left {
            return Err(PoolError::InvalidState(format!(
                "pool {pool_id} still has members"
            )));
        }

        let creator = pool.creator.clone();
        let creator_peers = pool.peers_of(&creator).to_vec();
        let creator_escrow = pool.creator_escrow;
        let mut events = Vec::new();

        for peer in &creator_peers {
            let _outcome = self.evict_peer(core, pool_id, peer, now, &mut events)?;
        }
        let forfeited = core.is_forfeited(&creator);
        let outcome = self.custody.refund(
            &mut core.claimable,
            ClaimKey::Account(creator.clone()),
            &creator,
            creator_escrow,
            forfeited,
        );
        events.extend(claimable_event(Some(pool_id), &outcome, now));
        core.pools.remove(pool_id)?;
        core.cooldowns.record(RateLimitedAction::DeletePool, caller, now);
        events.push(PoolEvent::PoolDeleted {
            pool_id,
            deleted_by: caller.clone(),
            timestamp: now,
        });
        drop(guard);

        self.event_bus.publish_all(events);
        tracing::info!(%pool_id, deleted_by = %caller, escrow = creator_escrow, "pool deleted");
        Ok(())
    }

    /// Changes a pool's slot limit. `0` means unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forbidden`],
    /// [`PoolError::PoolNotFound`], or [`PoolError::InvalidState`] when
    /// the new limit is below the occupied-slot count.
    pub fn set_max_members(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        max_members: u64,
    ) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        self.require_pool_admin(caller)?;

        let pool = guard.pools.get_mut(pool_id)?;
        let occupied = pool.occupied_slots();
        if max_members != 0 && max_members < occupied {
            return Err(PoolError::InvalidState(format!(
                "pool {pool_id} has {occupied} occupied slots; cannot shrink to {max_members}"
            )));
        }
        let old = pool.params.max_members;
        pool.params.max_members = max_members;
        pool.updated_at = now;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::PoolParametersUpdated {
            pool_id,
            parameter: PoolParameter::MaxMembers,
            old_value: old.to_string(),
            new_value: max_members.to_string(),
            timestamp: now,
        });
        tracing::info!(%pool_id, old, new = max_members, "max members updated");
        Ok(())
    }

    /// Changes a pool's per-slot collateral, clamped to the creation lock
    /// amount. Existing slots keep their snapshot.
    ///
    /// Returns the value actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Paused`], [`PoolError::Forbidden`],
    /// [`PoolError::PoolNotFound`], or [`PoolError::InvalidState`] when
    /// raising the amount while requests are pending.
    pub fn set_required_tokens(
        &self,
        caller: &AccountId,
        pool_id: PoolId,
        required_tokens: u128,
    ) -> Result<u128, PoolError> {
        let now = self.clock.now();
        let mut guard = self.begin()?;
        self.require_pool_admin(caller)?;

        let clamped = required_tokens.min(self.config.pool_creation_lock_amount);
        let pool = guard.pools.get_mut(pool_id)?;
        let old = pool.params.required_tokens;
        if clamped > old && !pool.pending_requests().is_empty() {
            return Err(PoolError::InvalidState(format!(
                "cannot raise required tokens of pool {pool_id} while requests are pending"
            )));
        }
        pool.params.required_tokens = clamped;
        pool.updated_at = now;
        drop(guard);

        let _ = self.event_bus.publish(PoolEvent::PoolParametersUpdated {
            pool_id,
            parameter: PoolParameter::RequiredTokens,
            old_value: old.to_string(),
            new_value: clamped.to_string(),
            timestamp: now,
        });
        tracing::info!(%pool_id, old, new = clamped, "required tokens updated");
        Ok(clamped)
    }

    /// Enters the core for a mutation.
    pub(super) fn begin(&self) -> Result<Entered<'_, CoreState>, PoolError> {
        let guard = self.core.enter()?;
        if self.pause.is_paused() {
            return Err(PoolError::Paused);
        }
        Ok(guard)
    }

    /// Enters the core for a read.
    pub(super) fn read(&self) -> Result<Entered<'_, CoreState>, PoolError> {
        self.core.enter()
    }

    pub(super) fn require_pool_admin(&self, caller: &AccountId) -> Result<(), PoolError> {
        if self.roles.is_privileged(caller) {
            Ok(())
        } else {
            Err(PoolError::Forbidden(format!(
                "{caller} lacks the pool-admin capability"
            )))
        }
    }

    pub(super) fn require_admin(&self, caller: &AccountId) -> Result<(), PoolError> {
        if self.roles.has_capability(Capability::Admin, caller) {
            Ok(())
        } else {
            Err(PoolError::Forbidden(format!(
                "{caller} lacks the admin capability"
            )))
        }
    }

    fn validate_label(&self, field: &str, value: &str) -> Result<(), PoolError> {
        if value.trim().is_empty() {
            return Err(PoolError::InvalidRequest(format!("{field} must not be empty")));
        }
        if value.len() > self.config.max_name_len {
            return Err(PoolError::InvalidRequest(format!(
                "{field} exceeds {} bytes",
                self.config.max_name_len
            )));
        }
        Ok(())
    }
}

/// `TokensClaimable` notification for a refund that fell back to the
/// claimable ledger.
pub(super) fn claimable_event(
    pool_id: Option<PoolId>,
    outcome: &RefundOutcome,
    now: DateTime<Utc>,
) -> Option<PoolEvent> {
    match outcome {
        RefundOutcome::CreditedClaimable { amount, owner, key } => {
            Some(PoolEvent::TokensClaimable {
                pool_id,
                owner: owner.clone(),
                key: key.to_string(),
                amount: amount.to_string(),
                timestamp: now,
            })
        }
        RefundOutcome::Nothing | RefundOutcome::Delivered { .. } | RefundOutcome::Burned { .. } => {
            None
        }
    }
}
