//! Global pause gate consulted before every state-mutating operation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// External pause gate.
pub trait PauseGate: Send + Sync + fmt::Debug {
    /// Returns `true` while mutations are suspended.
    fn is_paused(&self) -> bool;
}

/// In-process pause switch.
#[derive(Debug, Default)]
pub struct PauseSwitch {
    paused: AtomicBool,
}

impl PauseSwitch {
    /// Creates an unpaused switch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends mutations.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resumes mutations.
    pub fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl PauseGate for PauseSwitch {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
