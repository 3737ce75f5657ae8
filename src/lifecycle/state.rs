//! Process lifecycle state machine.
//!
//! # States
//! ```text
//! Starting → Accepting → Draining → Stopped
//!     └──────────────────↗
//! ```
//! Starting may go straight to Draining when a signal arrives before the
//! listener starts accepting. Transitions never go backwards and each one
//! happens at most once.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Starting = 0,
    Accepting = 1,
    Draining = 2,
    Stopped = 3,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Starting,
            1 => LifecycleState::Accepting,
            2 => LifecycleState::Draining,
            _ => LifecycleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Accepting => "accepting",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared lifecycle state.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Starting as u8),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_accepting(&self) -> bool {
        self.state() == LifecycleState::Accepting
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            tracing::debug!(from = %from, to = %to, "Lifecycle transition");
        }
        moved
    }

    /// Starting → Accepting, once the listener is bound.
    pub fn mark_accepting(&self) -> bool {
        self.transition(LifecycleState::Starting, LifecycleState::Accepting)
    }

    /// Enter Draining. Returns `true` only for the call that performed the transition.
    pub fn begin_drain(&self) -> bool {
        self.transition(LifecycleState::Accepting, LifecycleState::Draining)
            || self.transition(LifecycleState::Starting, LifecycleState::Draining)
    }

    /// Draining → Stopped, once resources are released.
    pub fn mark_stopped(&self) -> bool {
        self.transition(LifecycleState::Draining, LifecycleState::Stopped)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
