//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: PORT, NODE_ENV, RATE_LIMIT_*, CORS_ORIGIN, DATABASE_URL)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AuthConfig, CompressionConfig, CorsConfig, DatabaseConfig, GatewayConfig, HealthConfig,
    ListenerConfig, LogFormat, ObservabilityConfig, PayloadConfig, RateLimitConfig,
    ShutdownConfig, StaticAssetsConfig, TimeoutConfig,
};
