//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! constraints. All problems are collected so operators see every mistake at once.

use std::fmt;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate `config`, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if config.payload.max_body_bytes == 0 {
        errors.push(ValidationError::new("payload.max_body_bytes", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let request_timeout = Duration::from_secs(config.timeouts.request_secs);
    if config.health.probe_timeout() >= request_timeout {
        errors.push(ValidationError::new(
            "health.probe_timeout_ms",
            "must be shorter than timeouts.request_secs",
        ));
    }

    if config.shutdown.drain_timeout_secs == 0 {
        errors.push(ValidationError::new("shutdown.drain_timeout_secs", "must be greater than 0"));
    }
    if config.shutdown.release_grace_secs == 0 {
        errors.push(ValidationError::new("shutdown.release_grace_secs", "must be greater than 0"));
    }

    for origin in config.cors.effective_origins() {
        if origin.trim() == "*" {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                "wildcard origin cannot be combined with credentials",
            ));
        } else if HeaderValue::from_str(&origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("{origin:?} is not a valid header value"),
            ));
        }
    }
    for method in &config.cors.allowed_methods {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_methods",
                format!("{method:?} is not a valid method"),
            ));
        }
    }
    for header in &config.cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_headers",
                format!("{header:?} is not a valid header name"),
            ));
        }
    }

    if config.database.url.is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = GatewayConfig::default();
        config.rate_limit.window_ms = 0;
        config.rate_limit.max_requests = 0;
        config.payload.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"rate_limit.window_ms"));
        assert!(fields.contains(&"rate_limit.max_requests"));
        assert!(fields.contains(&"payload.max_body_bytes"));
    }

    #[test]
    fn probe_must_be_shorter_than_request_timeout() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 2;
        config.health.probe_timeout_ms = 2_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "health.probe_timeout_ms");
    }

    #[test]
    fn wildcard_origin_rejected() {
        let mut config = GatewayConfig::default();
        config.cors.extra_origin = Some("*".to_string());
        assert!(validate_config(&config).is_err());
    }
}
