//! Fixed-window rate limiting keyed by client address.
//!
//! The limiter owns the policy (window length, quota, response headers); the
//! [`WindowStore`] owns the identity → window mapping so it can be swapped for a
//! shared store without touching the middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// State of one identity's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Admitted requests in this window, never above the ceiling.
    pub count: u32,
    /// When the window opened.
    pub started_at: Instant,
    /// Whether the hit that produced this snapshot was admitted.
    pub admitted: bool,
}

/// Storage for per-identity windows.
///
/// `hit` must be atomic per key: two concurrent hits for the same identity
/// observe each other's increment.
pub trait WindowStore: Send + Sync {
    /// Record a hit for `key` at `now`, opening a fresh window when the current
    /// one is missing or expired. The count is only incremented while it is
    /// below `ceiling`.
    fn hit(&self, key: &str, now: Instant, window: Duration, ceiling: u32) -> WindowSnapshot;

    /// Drop windows that expired before `now`. Returns how many were removed.
    fn purge_expired(&self, now: Instant, window: Duration) -> usize;

    /// Number of tracked identities.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct FixedWindow {
    count: u32,
    started_at: Instant,
}

impl FixedWindow {
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started_at) >= window
    }
}

/// Process-local store. Each identity's window is a single map entry, and the
/// entry guard serializes concurrent updates to it.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: DashMap<String, FixedWindow>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for InMemoryWindowStore {
    fn hit(&self, key: &str, now: Instant, window: Duration, ceiling: u32) -> WindowSnapshot {
        let mut entry = self
            .windows
            .entry(key.to_owned())
            .or_insert(FixedWindow { count: 0, started_at: now });

        if entry.is_expired(now, window) {
            *entry = FixedWindow { count: 0, started_at: now };
        }

        let admitted = entry.count < ceiling;
        if admitted {
            entry.count += 1;
        }

        WindowSnapshot {
            count: entry.count,
            started_at: entry.started_at,
            admitted,
        }
    }

    fn purge_expired(&self, now: Instant, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| !w.is_expired(now, window));
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Outcome of a rate-limit check, with everything needed for the response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the window resets.
    pub reset_after: Duration,
    /// Window length, for the policy header.
    pub window: Duration,
}

impl RateLimitDecision {
    /// Seconds until reset, rounded up so clients never retry early.
    pub fn reset_secs(&self) -> u64 {
        let millis = self.reset_after.as_millis() as u64;
        millis.div_ceil(1000)
    }

    /// Attach the standard rate-limit headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        let policy = format!("{};w={}", self.limit, self.window.as_secs());
        if let Ok(value) = HeaderValue::from_str(&policy) {
            headers.insert(RATELIMIT_POLICY, value);
        }
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(self.reset_secs()));
        if !self.admitted {
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(self.reset_secs()),
            );
        }
    }
}

/// Fixed-window limiter over an injectable [`WindowStore`].
pub struct FixedWindowLimiter {
    store: Arc<dyn WindowStore>,
    window: Duration,
    max_requests: u32,
    enabled: bool,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<dyn WindowStore>, window: Duration, max_requests: u32) -> Self {
        Self {
            store,
            window,
            max_requests,
            enabled: true,
        }
    }

    /// Build an in-memory limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(
                Arc::new(InMemoryWindowStore::new()),
                config.window(),
                config.max_requests,
            )
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count a request from `key` at `now` and decide admission.
    pub fn check(&self, key: &str, now: Instant) -> RateLimitDecision {
        let snapshot = self.store.hit(key, now, self.window, self.max_requests);
        let elapsed = now.saturating_duration_since(snapshot.started_at);

        RateLimitDecision {
            admitted: snapshot.admitted,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(snapshot.count),
            reset_after: self.window.saturating_sub(elapsed),
            window: self.window,
        }
    }

    /// Spawn a background task purging expired windows until shutdown.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.store.purge_expired(Instant::now(), limiter.window);
                        if removed > 0 {
                            tracing::debug!(removed, tracked = limiter.store.len(), "Purged expired rate-limit windows");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate-limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// Middleware enforcing the per-client fixed window.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = addr.ip().to_string();
    let decision = limiter.check(&client, Instant::now());

    let mut response = if decision.admitted {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, limit = decision.limit, "Rate limit exceeded");
        metrics::record_rate_limited();
        GatewayError::RateLimited.into_response()
    };

    decision.apply_headers(response.headers_mut());
    response
}
