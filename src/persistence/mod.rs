//! Persistence dependency.
//!
//! The gateway only needs two things from the database: a side-effect-free
//! connectivity probe for health reporting and an explicit release during
//! shutdown. Everything else belongs to the handler groups.

pub mod postgres;

use async_trait::async_trait;

pub use postgres::PgPersistence;

/// Errors raised by the persistence dependency.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("database probe timed out")]
    Timeout,

    #[error("database connection is closed")]
    Closed,
}

/// Contract the gateway relies on.
#[async_trait]
pub trait Persistence: Send + Sync + 'static {
    /// Trivial round trip (`SELECT 1`). Must not have side effects.
    async fn ping(&self) -> Result<(), PersistenceError>;

    /// Release pooled connections. Called once during shutdown.
    async fn close(&self) -> Result<(), PersistenceError>;
}
