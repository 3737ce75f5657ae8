//! Response shaping shared by the pipeline.
//!
//! # Responsibilities
//! - Decide which responses get compressed
//! - Render panics below the access logger as the generic 500
//!
//! # Design Decisions
//! - Compression skips small bodies, images, gRPC and event streams
//! - Panic payloads are logged, never returned

use std::any::Any;

use axum::{
    body::Body,
    http::Response,
    response::IntoResponse,
};
use tower_http::compression::{
    predicate::{And, NotForContentType, Predicate, SizeAbove},
    CompressionLayer,
};

use crate::config::CompressionConfig;
use crate::error::GatewayError;

type Eligible = And<And<And<SizeAbove, NotForContentType>, NotForContentType>, NotForContentType>;

/// Compression predicate driven by [`CompressionConfig`].
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    enabled: bool,
    eligible: Eligible,
}

impl CompressionPolicy {
    pub fn from_config(config: &CompressionConfig) -> Self {
        Self {
            enabled: config.enabled,
            eligible: SizeAbove::new(config.min_size_bytes)
                .and(NotForContentType::GRPC)
                .and(NotForContentType::IMAGES)
                .and(NotForContentType::SSE),
        }
    }

    pub fn layer(self) -> CompressionLayer<Self> {
        CompressionLayer::new().compress_when(self)
    }
}

impl Predicate for CompressionPolicy {
    fn should_compress<B>(&self, response: &Response<B>) -> bool
    where
        B: http_body::Body,
    {
        self.enabled && self.eligible.should_compress(response)
    }
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    GatewayError::Internal.into_response()
}
