//! Authentication gate invoked before protected handler groups.
//!
//! The gateway does not implement authentication; it calls an [`AuthGate`]
//! supplied by a collaborator and either forwards the (possibly annotated)
//! request or returns the gate's rejection.

use std::collections::HashSet;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
};

use crate::error::GatewayError;

/// Marker attached to requests that passed a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// Opaque subject reported by the gate.
    pub subject: String,
}

#[async_trait]
pub trait AuthGate: Send + Sync + 'static {
    /// Admit `request` (optionally annotating it) or reject it.
    async fn authenticate(&self, request: Request<Body>) -> Result<Request<Body>, GatewayError>;
}

/// Accepts `Authorization: Bearer <token>` for a fixed token set.
#[derive(Debug, Clone, Default)]
pub struct BearerTokenGate {
    tokens: HashSet<String>,
}

impl BearerTokenGate {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }
}

#[async_trait]
impl AuthGate for BearerTokenGate {
    async fn authenticate(&self, mut request: Request<Body>) -> Result<Request<Body>, GatewayError> {
        let token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);

        match token {
            Some(token) if self.tokens.contains(token) => {
                request.extensions_mut().insert(Authenticated {
                    subject: "api-token".to_string(),
                });
                Ok(request)
            }
            _ => Err(GatewayError::Unauthorized),
        }
    }
}
