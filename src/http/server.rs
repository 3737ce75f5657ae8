//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the ordered request pipeline
//! - Build the route table (health, docs, handler groups, SPA fallback)
//! - Bind the pipeline to a listener with graceful, bounded draining
//! - Run the rate-limit sweeper for the server's lifetime
//!
//! # Pipeline (outer → inner)
//! ```text
//! request id → hardening → abuse guard → origin policy → CORS
//!     → request inflate → payload governor → compression → access log → timeout
//!     → catch panic → static files → route table
//! ```

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    decompression::RequestDecompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
};

use crate::config::GatewayConfig;
use crate::health::{self, HealthReporter};
use crate::http::{access_log, docs, response};
use crate::lifecycle::{Lifecycle, Shutdown};
use crate::persistence::Persistence;
use crate::routing::{self, AuthGate, HandlerGroups, RouteTable};
use crate::security::{
    origin_policy_middleware, payload_middleware, rate_limit_middleware,
    security_headers_middleware, FixedWindowLimiter, OriginPolicy, PayloadGovernor,
    SecurityHeaders,
};

/// The assembled gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<FixedWindowLimiter>,
    lifecycle: Arc<Lifecycle>,
}

impl GatewayServer {
    /// Create a new gateway with the given configuration and collaborators.
    pub fn new(
        config: GatewayConfig,
        persistence: Arc<dyn Persistence>,
        handlers: HandlerGroups,
        auth_gate: Arc<dyn AuthGate>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config.rate_limit));
        let reporter = Arc::new(HealthReporter::new(
            persistence,
            lifecycle.clone(),
            config.environment.clone(),
            config.health.probe_timeout(),
        ));

        let table = Self::route_table(&config, reporter, handlers, auth_gate);
        let router = Self::build_router(&config, table, limiter.clone());

        Self {
            router,
            config,
            limiter,
            lifecycle,
        }
    }

    /// Ordered, first-match-wins route table.
    fn route_table(
        config: &GatewayConfig,
        reporter: Arc<HealthReporter>,
        handlers: HandlerGroups,
        auth_gate: Arc<dyn AuthGate>,
    ) -> RouteTable {
        let mut builder = RouteTable::builder()
            .exact(
                "health",
                "/health",
                Router::new().fallback(health::health).with_state(reporter),
            )
            .exact("docs", "/api/docs", Router::new().fallback(docs::docs));

        for (name, prefix, group, gated) in handlers.into_mounts() {
            builder = if gated {
                builder.mount_gated(name, prefix, group, auth_gate.clone())
            } else {
                builder.mount(name, prefix, group)
            };
        }

        builder
            .fallback(
                "spa",
                Router::new().fallback_service(ServeFile::new(&config.static_assets.spa_index)),
            )
            .build()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        table: RouteTable,
        limiter: Arc<FixedWindowLimiter>,
    ) -> Router {
        let dispatcher = Router::new()
            .fallback(routing::dispatch)
            .with_state(Arc::new(table));
        let statics = ServeDir::new(&config.static_assets.public_dir)
            .call_fallback_on_method_not_allowed(true)
            .fallback(dispatcher);

        let hardening = Arc::new(SecurityHeaders::default());
        let origins = OriginPolicy::from_config(&config.cors);
        let governor = PayloadGovernor::new(config.payload.max_body_bytes);

        Router::new().fallback_service(statics).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn_with_state(
                    hardening,
                    security_headers_middleware,
                ))
                .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
                .layer(middleware::from_fn_with_state(
                    origins.clone(),
                    origin_policy_middleware,
                ))
                .layer(origins.cors_layer())
                .layer(RequestDecompressionLayer::new())
                .layer(tower_http::map_request_body::MapRequestBodyLayer::new(
                    axum::body::Body::new,
                ))
                .layer(middleware::from_fn_with_state(governor, payload_middleware))
                .layer(response::CompressionPolicy::from_config(&config.compression).layer())
                .layer(access_log::layer())
                .layer(middleware::from_fn(access_log::record_metrics))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .layer(CatchPanicLayer::custom(response::panic_response)),
        )
    }

    /// The assembled pipeline, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then drain for at most the configured window.
    pub async fn serve(self, listener: TcpListener, shutdown: &Shutdown) -> std::io::Result<()> {
        let mut drain = shutdown.subscribe();
        let graceful = shutdown.subscribe();
        let sweeper = self
            .limiter
            .spawn_sweeper(self.config.rate_limit.sweep_interval(), shutdown.subscribe());

        if !self.lifecycle.mark_accepting() {
            tracing::info!(state = %self.lifecycle.state(), "Shutdown requested before accepting");
            sweeper.abort();
            return Ok(());
        }

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server accepting connections");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(drained(graceful))
            .into_future();
        tokio::pin!(server);

        let result = tokio::select! {
            result = &mut server => result,
            _ = drain.recv() => {
                let deadline = self.config.shutdown.drain_timeout();
                tracing::info!(deadline_secs = deadline.as_secs(), "Draining in-flight requests");
                match tokio::time::timeout(deadline, &mut server).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Drain deadline reached; abandoning remaining connections");
                        Ok(())
                    }
                }
            }
        };

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}

async fn drained(mut rx: tokio::sync::broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
