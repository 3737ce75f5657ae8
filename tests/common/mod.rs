//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
    Router,
};
use tower::ServiceExt;

use edge_gateway::config::GatewayConfig;
use edge_gateway::http::GatewayServer;
use edge_gateway::lifecycle::Lifecycle;
use edge_gateway::persistence::{Persistence, PersistenceError};
use edge_gateway::routing::{BearerTokenGate, HandlerGroups};

pub const API_TOKEN: &str = "test-token";

/// Programmable persistence double.
pub struct MockPersistence {
    healthy: AtomicBool,
    close_delay: Duration,
    pings: AtomicUsize,
    closes: AtomicUsize,
}

impl MockPersistence {
    pub fn new() -> Arc<Self> {
        Self::with_close_delay(Duration::ZERO)
    }

    pub fn with_close_delay(close_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            close_delay,
            pings: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Persistence for MockPersistence {
    async fn ping(&self) -> Result<(), PersistenceError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PersistenceError::Query(sqlx::Error::PoolTimedOut))
        }
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.close_delay).await;
        Ok(())
    }
}

/// Defaults with test-friendly static paths and a known API token.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config.static_assets.public_dir = "does-not-exist/public".to_string();
    config.static_assets.spa_index = "does-not-exist/index.html".to_string();
    config.auth.api_tokens = vec![API_TOKEN.to_string()];
    config.shutdown.drain_timeout_secs = 2;
    config.shutdown.release_grace_secs = 2;
    config
}

pub fn build_server(
    config: GatewayConfig,
    persistence: Arc<MockPersistence>,
    handlers: HandlerGroups,
) -> (GatewayServer, Arc<Lifecycle>) {
    let lifecycle = Arc::new(Lifecycle::new());
    let gate = Arc::new(BearerTokenGate::new(config.auth.api_tokens.clone()));
    let server = GatewayServer::new(config, persistence, handlers, gate, lifecycle.clone());
    (server, lifecycle)
}

/// In-process pipeline with the lifecycle already accepting.
pub fn pipeline(config: GatewayConfig, persistence: Arc<MockPersistence>) -> Router {
    pipeline_with(config, persistence, HandlerGroups::unmounted())
}

pub fn pipeline_with(
    config: GatewayConfig,
    persistence: Arc<MockPersistence>,
    handlers: HandlerGroups,
) -> Router {
    let (server, lifecycle) = build_server(config, persistence, handlers);
    lifecycle.mark_accepting();
    server.router()
}

pub fn client_addr() -> SocketAddr {
    "203.0.113.7:40000".parse().unwrap()
}

/// Attach the connection info the listener would normally provide.
pub fn from_client(mut request: Request<Body>, addr: SocketAddr) -> Request<Body> {
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn get(uri: &str) -> Request<Body> {
    from_client(
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
        client_addr(),
    )
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
