//! Time source and per-(action, caller) cool-down tracking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::domain::AccountId;
use crate::error::PoolError;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map_or_else(|_| Utc::now(), |now| *now)
    }
}

/// Actions rate-limited per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitedAction {
    /// `createPool`.
    CreatePool,
    /// `deletePool`.
    DeletePool,
}

/// Stored "next allowed timestamp" per (action, caller).
#[derive(Debug)]
pub struct CooldownTracker {
    cooldown: Duration,
    next_allowed: HashMap<(RateLimitedAction, AccountId), DateTime<Utc>>,
}

impl CooldownTracker {
    /// Creates a tracker with a fixed cool-down.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            next_allowed: HashMap::new(),
        }
    }

    /// Fails if `caller` used `action` too recently.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::RateLimited`] with the remaining wait.
    pub fn check(
        &self,
        action: RateLimitedAction,
        caller: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<(), PoolError> {
        let Some(next) = self.next_allowed.get(&(action, caller.clone())) else {
            return Ok(());
        };
        if now >= *next {
            return Ok(());
        }
        let wait = (*next - now).num_milliseconds().max(1);
        Err(PoolError::RateLimited {
            retry_after_ms: u64::try_from(wait).unwrap_or(u64::MAX),
        })
    }

    /// Records a successful use, advancing the next allowed time.
    ///
    /// A cool-down reaching past the representable range saturates at
    /// `DateTime::<Utc>::MAX_UTC`.
    pub fn record(&mut self, action: RateLimitedAction, caller: &AccountId, now: DateTime<Utc>) {
        let next = now
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.next_allowed.insert((action, caller.clone()), next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), start + Duration::seconds(5));
    }

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let mut tracker = CooldownTracker::new(Duration::seconds(60));
        let alice = AccountId::from("alice");
        let t0 = Utc::now();

        assert!(tracker.check(RateLimitedAction::CreatePool, &alice, t0).is_ok());
        tracker.record(RateLimitedAction::CreatePool, &alice, t0);

        let early = tracker.check(RateLimitedAction::CreatePool, &alice, t0 + Duration::seconds(30));
        assert!(matches!(
            early,
            Err(PoolError::RateLimited { retry_after_ms: 30_000 })
        ));
        assert!(tracker.check(RateLimitedAction::DeletePool, &alice, t0).is_ok());
        assert!(
            tracker
                .check(RateLimitedAction::CreatePool, &alice, t0 + Duration::seconds(60))
                .is_ok()
        );
    }

    #[test]
    fn oversized_cooldown_saturates() {
        let mut tracker = CooldownTracker::new(Duration::seconds(9_000_000_000_000_000));
        let carol = AccountId::from("carol");
        let t0 = Utc::now();
        tracker.record(RateLimitedAction::CreatePool, &carol, t0);
        assert!(matches!(
            tracker.check(RateLimitedAction::CreatePool, &carol, t0 + Duration::days(365)),
            Err(PoolError::RateLimited { .. })
        ));
    }

    #[test]
    fn zero_cooldown_never_blocks() {
        let mut tracker = CooldownTracker::new(Duration::zero());
        let bob = AccountId::from("bob");
        let t0 = Utc::now();
        tracker.record(RateLimitedAction::DeletePool, &bob, t0);
        assert!(tracker.check(RateLimitedAction::DeletePool, &bob, t0).is_ok());
    }
}
