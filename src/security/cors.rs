//! Origin policy.
//!
//! Requests without an `Origin` header are always admitted. Requests with an
//! origin must match the allowed set exactly; anything else is rejected before
//! routing. Allowed origins then get regular CORS treatment (response headers,
//! preflight answers) from `tower-http`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

/// Immutable allowed-origin set plus the preflight declaration.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<HashSet<String>>,
    methods: Vec<Method>,
    headers: Vec<HeaderName>,
    allow_credentials: bool,
}

impl OriginPolicy {
    /// Build the policy from validated configuration.
    ///
    /// Invalid methods or header names are skipped; validation reports them.
    pub fn from_config(config: &CorsConfig) -> Self {
        let allowed = config.effective_origins().into_iter().collect();
        let methods = config
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
            .collect();
        let headers = config
            .allowed_headers
            .iter()
            .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
            .collect();

        Self {
            allowed: Arc::new(allowed),
            methods,
            headers,
            allow_credentials: config.allow_credentials,
        }
    }

    /// Decide admission for a declared origin.
    pub fn admit(&self, origin: Option<&HeaderValue>) -> Result<(), GatewayError> {
        let Some(origin) = origin else {
            return Ok(());
        };

        match origin.to_str() {
            Ok(origin) if self.allowed.contains(origin) => Ok(()),
            _ => Err(GatewayError::OriginRejected),
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed.contains(origin)
    }

    pub fn allowed_origins(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// CORS response headers and preflight handling for admitted origins.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(self.methods.clone())
            .allow_headers(self.headers.clone())
            .allow_credentials(self.allow_credentials)
            .max_age(Duration::from_secs(600))
    }
}

/// Middleware rejecting requests from origins outside the allowed set.
pub async fn origin_policy_middleware(
    State(policy): State<OriginPolicy>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    if let Err(rejection) = policy.admit(request.headers().get(header::ORIGIN)) {
        tracing::warn!(
            origin = ?request.headers().get(header::ORIGIN),
            path = %request.uri().path(),
            "Origin rejected"
        );
        metrics::record_origin_rejected();
        return Err(rejection);
    }

    Ok(next.run(request).await)
}
