//! Request body limits and structured body decoding.
//!
//! Every body is capped at the configured size regardless of media type. JSON
//! and form-encoded bodies are decoded here so malformed input never reaches a
//! handler; the decoded form is stored in the request extensions as
//! [`ParsedBody`] and the raw bytes are re-attached for downstream handlers.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::error::GatewayError;

/// Decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Empty,
}

/// Body size cap and decoder.
#[derive(Debug, Clone, Copy)]
pub struct PayloadGovernor {
    max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Json,
    Form,
    Other,
}

impl PayloadGovernor {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Reject up front when the declared length is already over the cap.
    fn check_declared_length(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        match declared {
            Some(len) if len > self.max_body_bytes as u64 => Err(GatewayError::PayloadTooLarge {
                limit: self.max_body_bytes,
            }),
            _ => Ok(()),
        }
    }

    /// Buffer `body`, failing once more than the cap has been read.
    pub async fn collect(&self, body: Body) -> Result<Bytes, GatewayError> {
        match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                Err(GatewayError::PayloadTooLarge {
                    limit: self.max_body_bytes,
                })
            }
            Err(err) => {
                tracing::debug!(error = %err, "Failed to read request body");
                Err(GatewayError::UnreadableBody)
            }
        }
    }

    /// Decode `bytes` according to the declared media type.
    pub fn decode(&self, headers: &HeaderMap, bytes: &[u8]) -> Result<ParsedBody, GatewayError> {
        if bytes.is_empty() {
            return Ok(ParsedBody::Empty);
        }

        match media_kind(headers) {
            MediaKind::Json => decode_json(bytes).map(ParsedBody::Json),
            MediaKind::Form => Ok(ParsedBody::Form(
                url::form_urlencoded::parse(bytes).into_owned().collect(),
            )),
            MediaKind::Other => Ok(ParsedBody::Empty),
        }
    }
}

fn media_kind(headers: &HeaderMap) -> MediaKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return MediaKind::Other;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json")) {
        MediaKind::Json
    } else if essence == "application/x-www-form-urlencoded" {
        MediaKind::Form
    } else {
        MediaKind::Other
    }
}

/// Strict JSON: only objects and arrays are accepted at the top level.
fn decode_json(bytes: &[u8]) -> Result<serde_json::Value, GatewayError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| GatewayError::MalformedBody(e.to_string()))?;

    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err(GatewayError::MalformedBody(
            "top-level JSON value must be an object or array".to_string(),
        ))
    }
}

/// Middleware enforcing the size cap and decoding structured bodies.
pub async fn payload_middleware(
    State(governor): State<PayloadGovernor>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    governor.check_declared_length(request.headers())?;

    let (mut parts, body) = request.into_parts();
    let bytes = governor.collect(body).await?;
    let parsed = governor.decode(&parts.headers, &bytes)?;

    parts.extensions.insert(parsed);
    let request = Request::from_parts(parts, Body::from(bytes));

    Ok(next.run(request).await)
}
