//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → report.rs (lifecycle check)
//!     → Persistence::ping() bounded by the probe timeout
//!     → memory.rs (process and host memory sample)
//!     → 200 healthy | 503 unhealthy
//! ```
//!
//! # Design Decisions
//! - Status is derived on every probe, never cached
//! - Probe timeout is shorter than the request timeout, so the reporter
//!   always answers before the outer deadline
//! - Dependency errors are logged, the client only sees an opaque reason

pub mod memory;
pub mod report;

pub use memory::{MemoryProbe, MemoryUsage};
pub use report::{health, HealthReport, HealthReporter};
