//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (stamp hardening headers on whatever comes back)
//!     → rate_limit.rs (fixed window per client address)
//!     → cors.rs (origin admission, CORS headers, preflight)
//!     → limits.rs (body size cap, JSON/form decoding)
//!     → Pass to compression, access logging, routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - A rejection ends the chain for that request only
//! - The rate-limit store is the only shared mutable state

pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use cors::{origin_policy_middleware, OriginPolicy};
pub use headers::{security_headers_middleware, ContentSecurityPolicy, SecurityHeaders};
pub use limits::{payload_middleware, ParsedBody, PayloadGovernor};
pub use rate_limit::{
    rate_limit_middleware, FixedWindowLimiter, InMemoryWindowStore, RateLimitDecision,
    WindowSnapshot, WindowStore,
};
