//! Postgres-backed persistence handle.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::persistence::{Persistence, PersistenceError};

/// Connection pool shared with the handler groups.
#[derive(Debug, Clone)]
pub struct PgPersistence {
    pool: PgPool,
}

impl PgPersistence {
    /// Create a lazily connected pool; no connection is opened until first use,
    /// so the gateway can start (and report unhealthy) while the database is down.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.url)?;

        tracing::info!(
            max_connections = config.max_connections,
            "Database pool configured"
        );

        Ok(Self { pool })
    }

    /// Pool handle for handler groups that need the database.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Persistence for PgPersistence {
    async fn ping(&self) -> Result<(), PersistenceError> {
        if self.pool.is_closed() {
            return Err(PersistenceError::Closed);
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        self.pool.close().await;
        tracing::info!("Database pool closed");
        Ok(())
    }
}
