//! Security response headers.
//!
//! The header set is computed once at startup and stamped onto every response,
//! including rejections produced further down the pipeline.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Content sources permitted per category.
#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    directives: Vec<(&'static str, Vec<&'static str>)>,
}

impl Default for ContentSecurityPolicy {
    fn default() -> Self {
        Self {
            directives: vec![
                ("default-src", vec!["'self'"]),
                (
                    "style-src",
                    vec!["'self'", "'unsafe-inline'", "https://fonts.googleapis.com"],
                ),
                ("font-src", vec!["'self'", "https://fonts.gstatic.com"]),
                ("img-src", vec!["'self'", "data:", "https:"]),
                ("script-src", vec!["'self'"]),
                ("connect-src", vec!["'self'"]),
                ("base-uri", vec!["'self'"]),
                ("form-action", vec!["'self'"]),
                ("frame-ancestors", vec!["'self'"]),
                ("object-src", vec!["'none'"]),
                ("script-src-attr", vec!["'none'"]),
                ("upgrade-insecure-requests", vec![]),
            ],
        }
    }
}

impl ContentSecurityPolicy {
    /// Sources declared for `directive`, if present.
    pub fn sources(&self, directive: &str) -> Option<&[&'static str]> {
        self.directives
            .iter()
            .find(|(name, _)| *name == directive)
            .map(|(_, sources)| sources.as_slice())
    }

    /// Serialize to the header value form (`name src src; name src`).
    pub fn render(&self) -> String {
        self.directives
            .iter()
            .map(|(name, sources)| {
                if sources.is_empty() {
                    name.to_string()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Fixed set of hardening headers.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn new(csp: &ContentSecurityPolicy) -> Self {
        let mut headers = Vec::with_capacity(13);

        if let Ok(value) = HeaderValue::from_str(&csp.render()) {
            headers.push((header::CONTENT_SECURITY_POLICY, value));
        }

        headers.extend([
            (
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ),
            (
                HeaderName::from_static("cross-origin-resource-policy"),
                HeaderValue::from_static("same-origin"),
            ),
            (
                HeaderName::from_static("origin-agent-cluster"),
                HeaderValue::from_static("?1"),
            ),
            (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
            (
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
            (
                HeaderName::from_static("x-download-options"),
                HeaderValue::from_static("noopen"),
            ),
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
            (
                HeaderName::from_static("x-permitted-cross-domain-policies"),
                HeaderValue::from_static("none"),
            ),
            (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
        ]);

        Self { headers }
    }

    pub fn apply(&self, response: &mut Response) {
        let target = response.headers_mut();
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::new(&ContentSecurityPolicy::default())
    }
}

/// Middleware stamping the hardening headers onto every response.
pub async fn security_headers_middleware(
    State(headers): State<Arc<SecurityHeaders>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(&mut response);
    response
}
