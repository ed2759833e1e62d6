//! End-to-end membership scenarios against the in-memory token ledger.

#![allow(clippy::panic)]

use std::sync::{Arc, Mutex, OnceLock, Weak};

use chrono::{Duration, Utc};
use tokio_test::{assert_err, assert_ok};

use storage_pools::config::LedgerConfig;
use storage_pools::custody::{ClaimKey, InMemoryTokenLedger, RefundOutcome, TokenError, TokenLedger};
use storage_pools::domain::{
    AccountId, EventBus, JoinRequestStatus, PeerId, PoolEvent, PoolId, RejectionRule,
};
use storage_pools::error::PoolError;
use storage_pools::governance::{
    Capability, Clock, ManualClock, PauseGate, PauseSwitch, StaticRoleAuthority,
};
use storage_pools::service::{Collaborators, NewPool, PoolService};

const LOCK: u128 = 1_000;

struct Harness {
    service: Arc<PoolService>,
    ledger: Arc<InMemoryTokenLedger>,
    pause: Arc<PauseSwitch>,
    clock: Arc<ManualClock>,
}

fn config() -> LedgerConfig {
    LedgerConfig {
        pool_creation_lock_amount: LOCK,
        action_cooldown: Duration::hours(1),
        ..LedgerConfig::default()
    }
}

fn roles() -> StaticRoleAuthority {
    StaticRoleAuthority::new()
        .with_grant(Capability::Admin, AccountId::from("root"))
        .with_grant(Capability::PoolAdmin, AccountId::from("ops"))
}

fn harness_from(config: LedgerConfig, token_ledger: Option<Arc<dyn TokenLedger>>) -> Harness {
    let ledger = Arc::new(InMemoryTokenLedger::new(config.custody_account.clone()));
    let pause = Arc::new(PauseSwitch::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let collaborators = Collaborators {
        token_ledger: token_ledger
            .unwrap_or_else(|| Arc::clone(&ledger) as Arc<dyn TokenLedger>),
        roles: Arc::new(roles()),
        pause: Arc::clone(&pause) as Arc<dyn PauseGate>,
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
    };
    let service = Arc::new(PoolService::new(config, collaborators, EventBus::new(256)));
    Harness {
        service,
        ledger,
        pause,
        clock,
    }
}

fn harness() -> Harness {
    harness_from(config(), None)
}

fn acct(name: &str) -> AccountId {
    AccountId::from(name)
}

fn peer(name: &str) -> PeerId {
    PeerId::from(name)
}

fn unpeered(name: &str) -> NewPool {
    NewPool {
        name: name.to_string(),
        region: "us-east".to_string(),
        required_tokens: 10,
        max_members: 0,
        min_ping_time: 0,
        max_challenge_response_period: 0,
        creator_peer_id: None,
    }
}

impl Harness {
    fn fund(&self, account: &str, amount: u128) {
        let account = acct(account);
        assert_ok!(self.ledger.mint(&account, amount));
        assert_ok!(self.ledger.approve(&account, self.ledger.custody(), amount));
    }

    fn pool(&self, creator: &str, required_tokens: u128, max_members: u64) -> PoolId {
        self.fund(creator, LOCK);
        let new_pool = NewPool {
            name: format!("{creator}-pool"),
            region: "eu-central".to_string(),
            required_tokens,
            max_members,
            min_ping_time: 30,
            max_challenge_response_period: 60,
            creator_peer_id: Some(peer(&format!("{creator}-1"))),
        };
        let Ok(pool_id) = self.service.create_pool(&acct(creator), new_pool) else {
            panic!("pool creation for {creator}");
        };
        pool_id
    }

    fn add_direct(&self, pool_id: PoolId, names: &[&str]) {
        for name in names {
            assert_ok!(self.service.add_member_direct(
                &acct("ops"),
                pool_id,
                &acct(name),
                &peer(&format!("{name}-1")),
            ));
        }
    }

    fn submit(&self, account: &str, pool_id: PoolId, peer_id: &str) -> Result<(), PoolError> {
        self.service
            .submit_join_request(&acct(account), pool_id, &peer(peer_id))
    }

    fn vote(&self, voter: &str, pool_id: PoolId, peer_id: &str, approve: bool) -> JoinRequestStatus {
        let Ok(status) = self.service.vote_on_join_request(
            &acct(voter),
            pool_id,
            &peer(peer_id),
            &peer(&format!("{voter}-1")),
            approve,
        ) else {
            panic!("vote by {voter} on {peer_id}");
        };
        status
    }

    fn balance(&self, account: &str) -> u128 {
        self.ledger.balance_of(&acct(account))
    }

    fn members(&self, pool_id: PoolId) -> u64 {
        let Ok(total) = self.service.total_members(pool_id) else {
            panic!("pool {pool_id} exists");
        };
        total
    }

    fn is_member(&self, pool_id: PoolId, peer_id: &str) -> bool {
        let Ok(member) = self.service.is_peer_member(pool_id, &peer(peer_id)) else {
            panic!("pool {pool_id} exists");
        };
        member
    }

    fn locked(&self, pool_id: PoolId, peer_id: &str) -> u128 {
        let Ok(locked) = self.service.locked_tokens(pool_id, &peer(peer_id)) else {
            panic!("pool {pool_id} exists");
        };
        locked
    }

    fn is_bound(&self, peer_id: &str) -> bool {
        let Ok(binding) = self.service.peer_binding(&peer(peer_id)) else {
            panic!("peer lookup");
        };
        binding.is_some()
    }
}

#[test]
fn fourth_submission_hits_capacity() {
    let h = harness();
    h.fund("alice", LOCK);
    let capped = NewPool {
        name: "capped".to_string(),
        region: "eu-central".to_string(),
        required_tokens: 100,
        max_members: 3,
        min_ping_time: 0,
        max_challenge_response_period: 0,
        creator_peer_id: None,
    };
    let Ok(pool_id) = h.service.create_pool(&acct("alice"), capped) else {
        panic!("pool creation");
    };
    for name in ["bob", "carol", "dave", "erin"] {
        h.fund(name, 100);
    }

    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.submit("carol", pool_id, "carol-1"));
    assert_ok!(h.submit("dave", pool_id, "dave-1"));
    let Err(err) = h.submit("erin", pool_id, "erin-1") else {
        panic!("fourth request must be refused");
    };
    assert!(matches!(
        err,
        PoolError::CapacityReached { max_members: 3, .. }
    ));
    // Nothing was escrowed for the refused request.
    assert_eq!(h.balance("erin"), 100);
    assert_eq!(h.service.custody_balance(), LOCK + 300);
}

#[test]
fn capacity_counts_members_and_pending_requests() {
    let h = harness();
    let pool_id = h.pool("alice", 100, 3);
    h.fund("bob", 100);
    h.fund("carol", 100);
    h.fund("dave", 100);

    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.submit("carol", pool_id, "carol-1"));
    assert!(matches!(
        h.submit("dave", pool_id, "dave-1"),
        Err(PoolError::CapacityReached { .. })
    ));

    // Admitting a request does not free a slot.
    assert_ok!(h.service.approve_join_request(&acct("ops"), pool_id, &peer("bob-1")));
    assert!(matches!(
        h.submit("dave", pool_id, "dave-1"),
        Err(PoolError::CapacityReached { .. })
    ));
}

#[test]
fn three_member_pool_admits_on_first_approval() {
    let h = harness();
    let pool_id = h.pool("alice", 100, 0);
    h.add_direct(pool_id, &["bob", "carol"]);
    assert_eq!(h.members(pool_id), 3);

    h.fund("dave", 100);
    assert_ok!(h.submit("dave", pool_id, "dave-1"));
    assert_eq!(h.vote("carol", pool_id, "dave-1", true), JoinRequestStatus::Approved);
    assert_eq!(h.members(pool_id), 4);
    assert_eq!(h.locked(pool_id, "dave-1"), 100);
}

#[test]
fn single_member_pool_admits_on_first_vote() {
    let h = harness();
    let pool_id = h.pool("alice", 100, 0);
    h.fund("bob", 100);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_eq!(h.balance("bob"), 0);

    assert_eq!(h.vote("alice", pool_id, "bob-1", true), JoinRequestStatus::Approved);
    assert!(h.is_member(pool_id, "bob-1"));
    assert_eq!(h.locked(pool_id, "bob-1"), 100);
    assert_eq!(h.members(pool_id), 2);
    let Ok(pending) = h.service.pending_requests(pool_id) else {
        panic!("pool exists");
    };
    assert!(pending.is_empty());
}

#[test]
fn four_members_need_two_approvals() {
    let h = harness();
    let pool_id = h.pool("alice", 50, 0);
    h.add_direct(pool_id, &["bob", "carol", "erin"]);
    assert_eq!(h.members(pool_id), 4);

    h.fund("dave", 50);
    assert_ok!(h.submit("dave", pool_id, "dave-1"));
    assert_eq!(h.vote("bob", pool_id, "dave-1", true), JoinRequestStatus::Pending);

    let again = h
        .service
        .vote_on_join_request(&acct("bob"), pool_id, &peer("dave-1"), &peer("bob-1"), true);
    assert!(matches!(again, Err(PoolError::AlreadyVoted { .. })));

    assert_eq!(h.vote("carol", pool_id, "dave-1", true), JoinRequestStatus::Approved);
}

#[test]
fn rejection_votes_refund_the_requester() {
    let h = harness();
    let pool_id = h.pool("alice", 80, 0);
    h.add_direct(pool_id, &["bob", "carol", "erin"]);
    h.fund("dave", 80);
    assert_ok!(h.submit("dave", pool_id, "dave-1"));
    assert_eq!(h.balance("dave"), 0);

    let mut rx = h.service.event_bus().subscribe();
    assert_eq!(h.vote("bob", pool_id, "dave-1", false), JoinRequestStatus::Pending);
    assert_eq!(h.vote("carol", pool_id, "dave-1", false), JoinRequestStatus::Rejected);

    let mut resolved = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PoolEvent::JoinRequestResolved { status, refund, .. } = event {
            resolved.push((status, refund));
        }
    }
    assert_eq!(
        resolved,
        vec![(
            JoinRequestStatus::Rejected,
            Some(RefundOutcome::Delivered { amount: 80 })
        )]
    );
    assert_eq!(h.balance("dave"), 80);
    assert!(!h.is_member(pool_id, "dave-1"));
    assert_err!(h.service.join_request(pool_id, &peer("dave-1")));
}

#[test]
fn majority_rule_needs_more_rejections() {
    let h = harness_from(
        LedgerConfig {
            rejection_rule: RejectionRule::Majority,
            ..config()
        },
        None,
    );
    let pool_id = h.pool("alice", 80, 0);
    h.add_direct(pool_id, &["bob", "carol", "erin"]);
    h.fund("dave", 80);
    assert_ok!(h.submit("dave", pool_id, "dave-1"));

    // Four slots: floor(4 / 2) + 1 = 3 rejections.
    assert_eq!(h.vote("bob", pool_id, "dave-1", false), JoinRequestStatus::Pending);
    assert_eq!(h.vote("carol", pool_id, "dave-1", false), JoinRequestStatus::Pending);
    assert_eq!(h.balance("dave"), 0);
    assert_eq!(h.vote("erin", pool_id, "dave-1", false), JoinRequestStatus::Rejected);
    assert_eq!(h.balance("dave"), 80);
}

#[test]
fn refused_peer_can_submit_again() {
    let h = harness();
    let pool_id = h.pool("alice", 40, 0);
    h.fund("bob", 120);

    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert!(h.is_bound("bob-1"));
    assert_eq!(h.vote("alice", pool_id, "bob-1", false), JoinRequestStatus::Rejected);
    assert!(!h.is_bound("bob-1"));

    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.service.cancel_join_request(&acct("bob"), pool_id, &peer("bob-1")));
    assert!(!h.is_bound("bob-1"));

    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_eq!(h.vote("alice", pool_id, "bob-1", true), JoinRequestStatus::Approved);
    assert_eq!(h.balance("bob"), 80);
}

#[test]
fn voter_must_own_the_member_peer() {
    let h = harness();
    let pool_id = h.pool("alice", 10, 0);
    h.fund("bob", 10);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));

    let stolen = h.service.vote_on_join_request(
        &acct("mallory"),
        pool_id,
        &peer("bob-1"),
        &peer("alice-1"),
        true,
    );
    assert!(matches!(stolen, Err(PoolError::Forbidden(_))));

    let outsider = h.service.vote_on_join_request(
        &acct("bob"),
        pool_id,
        &peer("bob-1"),
        &peer("bob-1"),
        true,
    );
    assert!(matches!(outsider, Err(PoolError::PeerNotMember { .. })));
}

#[test]
fn forfeited_requester_is_rejected_and_escrow_burned() {
    let h = harness();
    let pool_id = h.pool("alice", 200, 0);
    h.fund("bob", 200);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert!(assert_ok!(h.service.set_forfeit_flag(&acct("ops"), &acct("bob"), true)));

    assert_eq!(h.vote("alice", pool_id, "bob-1", true), JoinRequestStatus::Rejected);
    assert_eq!(h.balance("bob"), 0);
    assert_eq!(h.ledger.balance_of(&h.service.config().burn_account), 200);
    // The peer binding created by the request is released.
    assert!(!h.is_bound("bob-1"));

    // Forfeited accounts cannot try again.
    let retry = h.submit("bob", pool_id, "bob-2");
    assert!(matches!(retry, Err(PoolError::Forfeited(_))));
}

#[test]
fn admin_approval_of_forfeited_requester_rejects() {
    let h = harness();
    let pool_id = h.pool("alice", 200, 0);
    h.fund("bob", 200);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.service.set_forfeit_flag(&acct("ops"), &acct("bob"), true));

    let Ok(status) = h
        .service
        .approve_join_request(&acct("ops"), pool_id, &peer("bob-1"))
    else {
        panic!("admin approval");
    };
    assert_eq!(status, JoinRequestStatus::Rejected);
    assert!(!h.is_member(pool_id, "bob-1"));
}

#[test]
fn failed_refund_becomes_claimable_once() {
    let h = harness();
    let pool_id = h.pool("alice", 300, 0);
    h.fund("bob", 300);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.service.approve_join_request(&acct("ops"), pool_id, &peer("bob-1")));

    let mut rx = h.service.event_bus().subscribe();
    assert_ok!(h.ledger.block_recipient(&acct("bob")));
    let Ok(outcome) = h
        .service
        .remove_member_peer(&acct("bob"), pool_id, &peer("bob-1"))
    else {
        panic!("member removal");
    };
    let key = ClaimKey::Peer(peer("bob-1"));
    assert_eq!(
        outcome,
        RefundOutcome::CreditedClaimable {
            amount: 300,
            owner: acct("bob"),
            key: key.clone(),
        }
    );
    let Ok(PoolEvent::TokensClaimable { amount, .. }) = rx.try_recv() else {
        panic!("claimable notification expected first");
    };
    assert_eq!(amount, "300");
    assert!(!h.is_member(pool_id, "bob-1"));

    // Still blocked: the claim fails and the balance survives.
    assert!(matches!(
        h.service.claim_tokens(&acct("bob"), &key),
        Err(PoolError::TransferFailed(_))
    ));
    assert_eq!(assert_ok!(h.service.claimable(&key)), 300);

    // Only the owner may claim.
    assert!(matches!(
        h.service.claim_tokens(&acct("mallory"), &key),
        Err(PoolError::Forbidden(_))
    ));

    assert_ok!(h.ledger.unblock_recipient(&acct("bob")));
    assert_eq!(assert_ok!(h.service.claim_tokens(&acct("bob"), &key)), 300);
    assert_eq!(h.balance("bob"), 300);
    assert!(matches!(
        h.service.claim_tokens(&acct("bob"), &key),
        Err(PoolError::NothingToClaim(_))
    ));
}

#[test]
fn double_cancel_fails() {
    let h = harness();
    let pool_id = h.pool("alice", 100, 0);
    h.fund("bob", 100);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));

    let other = h
        .service
        .cancel_join_request(&acct("carol"), pool_id, &peer("bob-1"));
    assert!(matches!(other, Err(PoolError::Forbidden(_))));

    assert_ok!(h.service.cancel_join_request(&acct("bob"), pool_id, &peer("bob-1")));
    assert_eq!(h.balance("bob"), 100);
    let second = h
        .service
        .cancel_join_request(&acct("bob"), pool_id, &peer("bob-1"));
    assert!(matches!(second, Err(PoolError::JoinRequestNotFound { .. })));
    assert_eq!(h.balance("bob"), 100);
}

#[test]
fn refund_uses_admission_snapshot() {
    let h = harness();
    let pool_id = h.pool("alice", 400, 0);
    h.fund("bob", 400);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert_ok!(h.service.approve_join_request(&acct("ops"), pool_id, &peer("bob-1")));

    assert_eq!(
        assert_ok!(h.service.set_required_tokens(&acct("ops"), pool_id, 50)),
        50
    );
    let outcome = assert_ok!(h.service.remove_member_peer(&acct("bob"), pool_id, &peer("bob-1")));
    assert_eq!(outcome, RefundOutcome::Delivered { amount: 400 });
    assert_eq!(h.balance("bob"), 400);
}

#[test]
fn required_tokens_are_clamped_to_the_creation_lock() {
    let h = harness();
    let pool_id = h.pool("alice", LOCK * 5, 0);
    let summary = assert_ok!(h.service.pool(pool_id));
    assert_eq!(summary.required_tokens, LOCK.to_string());

    assert_eq!(
        assert_ok!(h.service.set_required_tokens(&acct("ops"), pool_id, u128::MAX)),
        LOCK
    );
}

#[test]
fn raising_required_tokens_with_pending_requests_fails() {
    let h = harness();
    let pool_id = h.pool("alice", 100, 0);
    h.fund("bob", 100);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    let raise = h.service.set_required_tokens(&acct("ops"), pool_id, 200);
    assert!(matches!(raise, Err(PoolError::InvalidState(_))));
    assert_ok!(h.service.set_required_tokens(&acct("ops"), pool_id, 10));
}

#[test]
fn peer_ids_cannot_be_rebound() {
    let h = harness();
    let first = h.pool("alice", 10, 0);
    h.clock.advance(Duration::hours(2));
    let second = h.pool("zoe", 10, 0);
    h.fund("bob", 100);
    h.fund("carol", 100);

    assert_ok!(h.submit("bob", first, "bob-1"));
    // Same peer, another pool.
    assert!(matches!(
        h.submit("bob", second, "bob-1"),
        Err(PoolError::JoinRequestExists { .. })
    ));
    assert_ok!(h.service.approve_join_request(&acct("ops"), first, &peer("bob-1")));
    assert!(matches!(
        h.submit("bob", second, "bob-1"),
        Err(PoolError::PeerBound { .. })
    ));
    // Same peer, another account.
    assert!(matches!(
        h.submit("carol", second, "bob-1"),
        Err(PoolError::PeerBound { .. })
    ));
    assert!(matches!(
        h.submit("carol", first, "bob-1"),
        Err(PoolError::PeerAlreadyMember { .. })
    ));

    // Released peers can be claimed again.
    let _refund = assert_ok!(h.service.remove_member_peer(&acct("bob"), first, &peer("bob-1")));
    assert_ok!(h.submit("carol", second, "bob-1"));
}

#[test]
fn membership_indexes_stay_consistent() {
    let h = harness();
    let pool_id = h.pool("alice", 0, 0);
    for (account, peer_id) in [("bob", "bob-1"), ("bob", "bob-2"), ("carol", "carol-1")] {
        assert_ok!(h.service.add_member_direct(
            &acct("ops"),
            pool_id,
            &acct(account),
            &peer(peer_id),
        ));
    }
    assert_eq!(h.members(pool_id), 4);

    let _refund = assert_ok!(h.service.remove_member_peer(&acct("bob"), pool_id, &peer("bob-1")));
    let members = assert_ok!(h.service.pool_members(pool_id));
    let accounts: Vec<&str> = members.iter().map(|m| m.account.as_str()).collect();
    assert_eq!(accounts, vec!["alice", "bob", "carol"]);
    assert!(assert_ok!(h.service.is_member_of_any_pool(&acct("bob"))));

    let _refund = assert_ok!(h.service.remove_member_peer(&acct("bob"), pool_id, &peer("bob-2")));
    let members = assert_ok!(h.service.pool_members(pool_id));
    let accounts: Vec<&str> = members.iter().map(|m| m.account.as_str()).collect();
    assert_eq!(accounts, vec!["alice", "carol"]);
    assert!(!assert_ok!(h.service.is_member_of_any_pool(&acct("bob"))));
    assert_eq!(h.members(pool_id), 2);
    for member in &members {
        assert!(!member.peers.is_empty());
    }
}

#[test]
fn creator_batch_removal_keeps_the_creator() {
    let h = harness();
    let pool_id = h.pool("alice", 0, 0);
    h.add_direct(pool_id, &["bob", "carol", "dave"]);

    let evicted = assert_ok!(h.service.remove_members_batch(&acct("alice"), pool_id, 10));
    assert_eq!(evicted, vec![acct("dave"), acct("carol"), acct("bob")]);
    assert_eq!(h.members(pool_id), 1);
    assert!(h.is_member(pool_id, "alice-1"));

    let outsider = h.service.remove_members_batch(&acct("bob"), pool_id, 1);
    assert!(matches!(outsider, Err(PoolError::Forbidden(_))));
}

#[test]
fn admin_batch_removal_may_evict_the_creator() {
    let h = harness();
    let pool_id = h.pool("alice", 0, 0);
    h.add_direct(pool_id, &["bob"]);

    let mut rx = h.service.event_bus().subscribe();
    let evicted = assert_ok!(h.service.remove_members_batch(&acct("ops"), pool_id, 10));
    assert_eq!(evicted, vec![acct("bob"), acct("alice")]);
    let mut refunds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PoolEvent::MemberRemoved { account, refund, .. } = event {
            refunds.push((account, refund));
        }
    }
    assert_eq!(
        refunds,
        vec![
            (acct("bob"), RefundOutcome::Nothing),
            (acct("alice"), RefundOutcome::Delivered { amount: LOCK }),
        ]
    );
    assert_eq!(h.members(pool_id), 0);
    assert!(!h.is_bound("alice-1"));
    // The creator's peer slot carried the creation lock.
    assert_eq!(h.balance("alice"), LOCK);
}

#[test]
fn creator_deletes_pool_and_gets_collateral_back() {
    let h = harness();
    let pool_id = h.pool("alice", 10, 0);
    assert_eq!(h.balance("alice"), 0);

    h.fund("bob", 10);
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
    assert!(matches!(
        h.service.delete_pool(&acct("alice"), pool_id),
        Err(PoolError::InvalidState(_))
    ));
    assert_ok!(h.service.cancel_join_request(&acct("alice"), pool_id, &peer("bob-1")));

    assert_ok!(h.service.delete_pool(&acct("alice"), pool_id));
    assert_eq!(h.balance("alice"), LOCK);
    assert!(matches!(
        h.service.pool(pool_id),
        Err(PoolError::PoolNotFound(_))
    ));
    assert!(!h.is_bound("alice-1"));
}

#[test]
fn cooldown_limits_pool_creation() {
    let h = harness();
    let _first = h.pool("alice", 10, 0);

    h.fund("alice", LOCK);
    let again = h.service.create_pool(&acct("alice"), unpeered("second"));
    assert!(matches!(again, Err(PoolError::RateLimited { .. })));

    h.clock.advance(Duration::hours(1));
    assert_ok!(h.service.create_pool(&acct("alice"), unpeered("second")));
}

#[test]
fn oversized_cooldown_leaves_the_core_usable() {
    let h = harness_from(
        LedgerConfig {
            action_cooldown: Duration::seconds(9_000_000_000_000_000),
            ..config()
        },
        None,
    );
    let pool_id = h.pool("alice", 10, 0);

    assert_eq!(assert_ok!(h.service.list_pools()).len(), 1);
    assert!(h.is_member(pool_id, "alice-1"));

    h.fund("alice", LOCK);
    h.clock.advance(Duration::days(365 * 1_000));
    let again = h.service.create_pool(&acct("alice"), unpeered("second"));
    assert!(matches!(again, Err(PoolError::RateLimited { .. })));
    assert_eq!(h.balance("alice"), LOCK);
}

#[test]
fn pause_blocks_mutations_but_not_queries() {
    let h = harness();
    let pool_id = h.pool("alice", 10, 0);
    h.fund("bob", 10);

    h.pause.pause();
    assert!(matches!(
        h.submit("bob", pool_id, "bob-1"),
        Err(PoolError::Paused)
    ));
    assert_ok!(h.service.pool(pool_id));
    assert_eq!(h.balance("bob"), 10);

    h.pause.unpause();
    assert_ok!(h.submit("bob", pool_id, "bob-1"));
}

#[test]
fn privileged_creator_locks_nothing() {
    let h = harness();
    let ops_pool = NewPool {
        name: "ops-pool".to_string(),
        region: "ap-south".to_string(),
        required_tokens: 10,
        max_members: 0,
        min_ping_time: 0,
        max_challenge_response_period: 0,
        creator_peer_id: Some(peer("ops-1")),
    };
    let Ok(pool_id) = h.service.create_pool(&acct("ops"), ops_pool) else {
        panic!("privileged pool creation");
    };
    assert_eq!(h.locked(pool_id, "ops-1"), 0);
    assert_eq!(h.service.custody_balance(), 0);
}

#[test]
fn emergency_recovery_is_admin_only_and_clamped() {
    let h = harness();
    let _pool = h.pool("alice", 10, 0);

    let denied = h.service.emergency_recover_tokens(&acct("ops"), 1);
    assert!(matches!(denied, Err(PoolError::Forbidden(_))));

    let swept = assert_ok!(h.service.emergency_recover_tokens(&acct("root"), u128::MAX));
    assert_eq!(swept, LOCK);
    assert_eq!(h.service.custody_balance(), 0);
}

/// Ledger that calls back into the service during a pull.
#[derive(Debug)]
struct CallbackLedger {
    inner: InMemoryTokenLedger,
    service: OnceLock<Weak<PoolService>>,
    observed: Mutex<Vec<PoolError>>,
}

impl TokenLedger for CallbackLedger {
    fn transfer_in(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        if let Some(service) = self.service.get().and_then(Weak::upgrade) {
            let nested = service.submit_join_request(from, PoolId::new(1), &peer("nested"));
            if let (Err(err), Ok(mut observed)) = (nested, self.observed.lock()) {
                observed.push(err);
            }
        }
        self.inner.transfer_in(from, to, amount)
    }

    fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        self.inner.transfer_out(to, amount)
    }

    fn balance_of(&self, holder: &AccountId) -> u128 {
        self.inner.balance_of(holder)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.inner.allowance(owner, spender)
    }
}

#[test]
fn reentrant_ledger_callback_is_rejected() {
    let custody = config().custody_account;
    let callback = Arc::new(CallbackLedger {
        inner: InMemoryTokenLedger::new(custody.clone()),
        service: OnceLock::new(),
        observed: Mutex::new(Vec::new()),
    });
    let h = harness_from(config(), Some(Arc::clone(&callback) as Arc<dyn TokenLedger>));
    let _ = callback.service.set(Arc::downgrade(&h.service));

    let alice = acct("alice");
    assert_ok!(callback.inner.mint(&alice, LOCK));
    assert_ok!(callback.inner.approve(&alice, &custody, LOCK));

    let created = h.service.create_pool(
        &alice,
        NewPool {
            name: "guarded".to_string(),
            region: "eu-west".to_string(),
            required_tokens: 10,
            max_members: 0,
            min_ping_time: 0,
            max_challenge_response_period: 0,
            creator_peer_id: Some(peer("alice-1")),
        },
    );
    assert_ok!(created);

    let Ok(observed) = callback.observed.lock() else {
        panic!("observation lock");
    };
    assert!(matches!(observed.as_slice(), [PoolError::Reentrant]));
    drop(observed);
    assert_err!(h.service.join_request(PoolId::new(1), &peer("nested")));
}
