//! Client-facing error taxonomy.
//!
//! Every rejection the gateway produces on its own behalf goes through
//! [`GatewayError`], so the status code and JSON shape stay consistent across
//! the pipeline stages. Internal details never reach the body: variants carry
//! only what the client is allowed to see.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors surfaced to clients by the gateway pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Declared origin is not in the allowed set.
    #[error("origin not allowed")]
    OriginRejected,

    /// Client exhausted its quota for the current window.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Request body exceeded the configured cap.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Structured body could not be decoded.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Body stream failed before it could be fully read.
    #[error("request body could not be read")]
    UnreadableBody,

    /// Authentication gate refused the request.
    #[error("authentication required")]
    Unauthorized,

    /// No route matched.
    #[error("route not found")]
    NotFound,

    /// A dependency needed to answer is unavailable.
    #[error("dependency unavailable")]
    DependencyUnavailable,

    /// Anything else. Details are logged, never returned.
    #[error("internal error")]
    Internal,
}

/// JSON body used for every gateway-generated error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::OriginRejected => StatusCode::FORBIDDEN,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::MalformedBody(_) | GatewayError::UnreadableBody => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::OriginRejected => "origin_not_allowed",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::PayloadTooLarge { .. } => "payload_too_large",
            GatewayError::MalformedBody(_) => "malformed_body",
            GatewayError::UnreadableBody => "unreadable_body",
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::NotFound => "not_found",
            GatewayError::DependencyUnavailable => "dependency_unavailable",
            GatewayError::Internal => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            GatewayError::OriginRejected => "Not allowed by CORS".to_string(),
            GatewayError::RateLimited => {
                "Too many requests from this IP, please try again later.".to_string()
            }
            GatewayError::PayloadTooLarge { limit } => {
                format!("Request body exceeds the {limit} byte limit")
            }
            GatewayError::MalformedBody(reason) => format!("Malformed request body: {reason}"),
            GatewayError::UnreadableBody => "Request body could not be read".to_string(),
            GatewayError::Unauthorized => "Authentication required".to_string(),
            GatewayError::NotFound => "Not found".to_string(),
            GatewayError::DependencyUnavailable => "Service unavailable".to_string(),
            GatewayError::Internal => "Internal server error".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.client_message(),
            code: self.code(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
