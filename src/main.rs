//! HTTP edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ listener ──▶ request id ──▶ hardening ──▶ abuse guard ──▶ origin policy
//!                                                                              │
//!        ┌─────────────────────────────────────────────────────────────────────┘
//!        ▼
//!     payload governor ──▶ compression ──▶ access log ──▶ static files ──▶ route table
//!                                                                              │
//!                   /health · /api/docs · /api/{auth,chat,news,countries,     │
//!                   users*,analytics} · SPA fallback ◀────────────────────────┘
//!
//!     * gated by the authentication gate
//!
//!     Cross-cutting: config · observability · lifecycle (signals, drain, release)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use edge_gateway::config::load_config;
use edge_gateway::http::GatewayServer;
use edge_gateway::lifecycle::{signals, startup, Lifecycle, ReleaseOutcome, Shutdown};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::persistence::{Persistence, PgPersistence};
use edge_gateway::routing::{AuthGate, BearerTokenGate, HandlerGroups};

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "HTTP edge gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let _log_guard = logging::init(&config.observability, config.is_production())
        .context("Failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        environment = %config.environment,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let persistence: Arc<dyn Persistence> = Arc::new(
        PgPersistence::connect_lazy(&config.database).context("Failed to configure database")?,
    );
    let auth_gate: Arc<dyn AuthGate> =
        Arc::new(BearerTokenGate::new(config.auth.api_tokens.iter().cloned()));

    let lifecycle = Arc::new(Lifecycle::new());
    let shutdown = Arc::new(Shutdown::new(lifecycle.clone()));

    let shutdown_config = config.shutdown.clone();
    let listener_config = config.listener.clone();
    let server = GatewayServer::new(
        config,
        persistence.clone(),
        HandlerGroups::unmounted(),
        auth_gate,
        lifecycle,
    );

    let listener = startup::bind(&listener_config).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");
    tracing::info!("API docs: http://{}/api/docs", local_addr);
    tracing::info!("Health check: http://{}/health", local_addr);

    let watcher = signals::spawn_watcher(shutdown.clone()).context("Failed to install signal handlers")?;

    let outcome = startup::run(server, listener, shutdown, persistence, &shutdown_config).await?;
    watcher.abort();

    if outcome != ReleaseOutcome::Released {
        tracing::warn!(outcome = ?outcome, "Shutdown completed without a clean release");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
