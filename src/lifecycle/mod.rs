//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Initialize subsystems → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Release persistence → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (first one wins)
//!
//! State (state.rs):
//!     Starting → Accepting → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Ordered shutdown: stop accept, drain, release, stop
//! - Shutdown has deadlines: bounded drain and bounded release

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{ReleaseOutcome, ResourceRelease, Shutdown};
pub use startup::StartupError;
pub use state::{Lifecycle, LifecycleState};
