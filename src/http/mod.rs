//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline assembly)
//!     → security stages (see `crate::security`)
//!     → response.rs (compression policy, panic rendering)
//!     → access_log.rs (request span, access line, metrics)
//!     → static files, then `crate::routing`
//!     → docs.rs (built-in API directory)
//! ```

pub mod access_log;
pub mod docs;
pub mod response;
pub mod server;

pub use server::GatewayServer;
