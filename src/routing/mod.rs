//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, headers)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → auth.rs (gate, protected groups only)
//!     → strip mount prefix
//!     → groups.rs / built-in handler
//!
//! Route Table (at startup):
//!     health, docs, handler groups, SPA fallback
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Table built at startup, immutable at runtime
//! - No regex in hot path (exact and segment-prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (insertion order)

pub mod auth;
pub mod groups;
pub mod matcher;
pub mod router;

pub use auth::{AuthGate, Authenticated, BearerTokenGate};
pub use groups::HandlerGroups;
pub use router::{dispatch, RouteKind, RouteTable, RouteTableBuilder};
