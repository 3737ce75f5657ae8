//! HTTP edge gateway library.
//!
//! Terminates client connections, applies the policy pipeline (hardening,
//! abuse guard, origin policy, payload limits, compression), reports health,
//! routes to independently owned handler groups and shuts down cleanly.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod persistence;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::{Lifecycle, Shutdown};
