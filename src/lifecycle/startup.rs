//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener
//! - Run the server until it has drained
//! - Release the persistence dependency and mark the process stopped
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)
//! - Release runs even when serving failed

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{ListenerConfig, ShutdownConfig};
use crate::http::GatewayServer;
use crate::lifecycle::shutdown::{ReleaseOutcome, ResourceRelease, Shutdown};
use crate::persistence::Persistence;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Bind the configured listener.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

/// Serve, drain, release, stop.
///
/// Returns the release outcome once the lifecycle has reached Stopped.
pub async fn run(
    server: GatewayServer,
    listener: TcpListener,
    shutdown: Arc<Shutdown>,
    persistence: Arc<dyn Persistence>,
    config: &ShutdownConfig,
) -> Result<ReleaseOutcome, StartupError> {
    let local: Option<SocketAddr> = listener.local_addr().ok();
    let served = server.serve(listener, &shutdown).await;
    if let Err(e) = &served {
        tracing::error!(error = %e, address = ?local, "Server terminated with error");
    }

    // A server error before any signal still has to pass through Draining.
    shutdown.trigger();

    let release = ResourceRelease::new(persistence, config.release_grace());
    let outcome = release.release().await;
    shutdown.lifecycle().mark_stopped();

    served?;
    Ok(outcome)
}
