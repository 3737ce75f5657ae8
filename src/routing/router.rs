//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the first matching entry for a request
//! - Run the entry's authentication gate, if any
//! - Strip mount prefixes and hand the request to the entry's handler
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in insertion order, first match wins
//! - Explicit NotFound rather than silent default

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{uri::PathAndQuery, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceExt;

use crate::error::GatewayError;
use crate::routing::auth::AuthGate;
use crate::routing::matcher::{AndMatcher, ExactPathMatcher, Matcher, MethodMatcher, PathPrefixMatcher};

/// Who owns an entry's handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Answered by the gateway itself (health, docs).
    BuiltIn,
    /// Delegated to an external handler group.
    Delegated,
    /// Single-page application entry document.
    Fallback,
}

/// One `(matcher, handler)` pair.
pub struct RouteEntry {
    name: &'static str,
    kind: RouteKind,
    matcher: Box<dyn Matcher>,
    mount: Option<PathPrefixMatcher>,
    gate: Option<Arc<dyn AuthGate>>,
    handler: Router,
}

impl RouteEntry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("matcher", &self.matcher)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

/// Ordered route table.
#[derive(Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// First entry matching `req`.
    pub fn find(&self, req: &Request<Body>) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matcher.matches(req))
    }

    /// Dispatch `req` to the first matching entry.
    pub async fn dispatch(&self, req: Request<Body>) -> Response {
        let Some(entry) = self.find(&req) else {
            tracing::debug!(method = %req.method(), path = %req.uri().path(), "No route matched");
            return GatewayError::NotFound.into_response();
        };

        let req = match &entry.gate {
            Some(gate) => match gate.authenticate(req).await {
                Ok(req) => req,
                Err(rejection) => {
                    tracing::debug!(route = entry.name, "Authentication gate rejected request");
                    return rejection.into_response();
                }
            },
            None => req,
        };

        let req = match &entry.mount {
            Some(mount) => strip_mount_prefix(req, mount),
            None => req,
        };

        let response = match entry.handler.clone().oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        if entry.kind == RouteKind::Delegated
            && response.status() == StatusCode::INTERNAL_SERVER_ERROR
        {
            tracing::error!(route = entry.name, "Handler group failed; returning generic error");
            return GatewayError::Internal.into_response();
        }

        response
    }
}

/// Rewrite the URI so the handler sees the path below its mount point.
fn strip_mount_prefix(mut req: Request<Body>, mount: &PathPrefixMatcher) -> Request<Body> {
    let Some(rest) = mount.remainder(req.uri().path()) else {
        return req;
    };
    let rewritten = match req.uri().query() {
        Some(query) => format!("{rest}?{query}"),
        None => rest.to_string(),
    };

    let Ok(path_and_query) = rewritten.parse::<PathAndQuery>() else {
        return req;
    };
    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    if let Ok(uri) = Uri::from_parts(parts) {
        *req.uri_mut() = uri;
    }
    req
}

/// Builder preserving insertion order.
#[derive(Default)]
pub struct RouteTableBuilder {
    entries: Vec<RouteEntry>,
}

impl RouteTableBuilder {
    /// Built-in GET/HEAD route on one exact path.
    pub fn exact(mut self, name: &'static str, path: &str, handler: Router) -> Self {
        self.entries.push(RouteEntry {
            name,
            kind: RouteKind::BuiltIn,
            matcher: Box::new(AndMatcher::new(vec![
                Box::new(MethodMatcher::read_only()),
                Box::new(ExactPathMatcher::new(path)),
            ])),
            mount: None,
            gate: None,
            handler,
        });
        self
    }

    /// Delegated handler group under `prefix`, any method.
    pub fn mount(self, name: &'static str, prefix: &str, handler: Router) -> Self {
        self.push_mount(name, prefix, handler, None)
    }

    /// Delegated handler group behind an authentication gate.
    pub fn mount_gated(
        self,
        name: &'static str,
        prefix: &str,
        handler: Router,
        gate: Arc<dyn AuthGate>,
    ) -> Self {
        self.push_mount(name, prefix, handler, Some(gate))
    }

    fn push_mount(
        mut self,
        name: &'static str,
        prefix: &str,
        handler: Router,
        gate: Option<Arc<dyn AuthGate>>,
    ) -> Self {
        let mount = PathPrefixMatcher::new(prefix);
        self.entries.push(RouteEntry {
            name,
            kind: RouteKind::Delegated,
            matcher: Box::new(mount.clone()),
            mount: Some(mount),
            gate,
            handler,
        });
        self
    }

    /// Catch-all GET/HEAD entry. Must be added last.
    pub fn fallback(mut self, name: &'static str, handler: Router) -> Self {
        self.entries.push(RouteEntry {
            name,
            kind: RouteKind::Fallback,
            matcher: Box::new(MethodMatcher::read_only()),
            mount: None,
            gate: None,
            handler,
        });
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            entries: self.entries,
        }
    }
}

/// Axum handler dispatching through the shared table.
pub async fn dispatch(State(table): State<Arc<RouteTable>>, req: Request<Body>) -> Response {
    table.dispatch(req).await
}
