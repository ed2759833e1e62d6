//! Serialized access to the core state with re-entry rejection.
//!
//! [`Serialized`] owns the state behind a mutex and records which thread
//! currently holds it. A second entry from the same thread (for example
//! a token-ledger callback that calls back into the service while a
//! transfer is in flight) is rejected with [`PoolError::Reentrant`]
//! instead of deadlocking. Entries from other threads simply queue.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use crate::error::PoolError;

/// State guarded by a re-entry latch.
#[derive(Debug)]
pub struct Serialized<T> {
    state: Mutex<T>,
    holder: Mutex<Option<ThreadId>>,
}

impl<T> Serialized<T> {
    /// Wraps `state`.
    #[must_use]
    pub fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            holder: Mutex::new(None),
        }
    }

    /// Enters the critical section.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Reentrant`] if the calling thread is already
    /// inside, and [`PoolError::Internal`] if a previous holder panicked.
    pub fn enter(&self) -> Result<Entered<'_, T>, PoolError> {
        let me = thread::current().id();
        if *self.lock_holder()? == Some(me) {
            tracing::debug!("reentrant call rejected");
            return Err(PoolError::Reentrant);
        }
        let guard = self
            .state
            .lock()
            .map_err(|_| PoolError::Internal("core state poisoned".to_string()))?;
        *self.lock_holder()? = Some(me);
        Ok(Entered {
            owner: self,
            guard,
        })
    }

    /// Returns `true` while some thread is inside the critical section.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.holder.lock().map(|h| h.is_some()).unwrap_or(true)
    }

    fn lock_holder(&self) -> Result<MutexGuard<'_, Option<ThreadId>>, PoolError> {
        self.holder
            .lock()
            .map_err(|_| PoolError::Internal("reentrancy latch poisoned".to_string()))
    }
}

/// Exclusive access to the guarded state; clears the latch on drop.
#[derive(Debug)]
pub struct Entered<'a, T> {
    owner: &'a Serialized<T>,
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for Entered<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for Entered<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for Entered<'_, T> {
    fn drop(&mut self) {
        // Runs before `guard` is released.
        if let Ok(mut holder) = self.owner.holder.lock() {
            *holder = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn nested_entry_is_rejected() {
        let cell = Serialized::new(0u32);
        let Ok(mut outer) = cell.enter() else {
            panic!("first entry must succeed");
        };
        *outer += 1;
        assert!(matches!(cell.enter(), Err(PoolError::Reentrant)));
        assert!(cell.is_entered());
        drop(outer);

        assert!(!cell.is_entered());
        let Ok(again) = cell.enter() else {
            panic!("entry after exit must succeed");
        };
        assert_eq!(*again, 1);
    }

    #[test]
    fn other_threads_queue_instead_of_failing() {
        let cell = Arc::new(Serialized::new(0u32));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    if let Ok(mut n) = cell.enter() {
                        *n += 1;
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
        let Ok(total) = cell.enter() else {
            panic!("entry must succeed");
        };
        assert_eq!(*total, 800);
    }
}
