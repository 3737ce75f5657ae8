//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Pick JSON or human-readable output
//! - Resolve the log level from `RUST_LOG` or configuration
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level
//! - Lines go through a non-blocking stdout writer; the runtime thread never
//!   waits on a slow log consumer

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Resolve the output format. An explicit setting wins over the environment.
pub fn resolve_format(config: &ObservabilityConfig, production: bool) -> LogFormat {
    match config.log_format {
        Some(format) => format,
        None if production => LogFormat::Json,
        None => LogFormat::Pretty,
    }
}

fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "edge_gateway={level},tower_http={level}",
            level = config.log_level
        ))
    })
}

/// Off-thread writer over `sink`. Lines are dropped, not queued without
/// bound, when the consumer falls behind.
pub fn non_blocking_writer<W>(sink: W) -> (NonBlocking, WorkerGuard)
where
    W: std::io::Write + Send + 'static,
{
    tracing_appender::non_blocking(sink)
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines on drop and must be held for the
/// life of the process. Returns an error if a subscriber is already installed.
pub fn init(
    config: &ObservabilityConfig,
    production: bool,
) -> Result<WorkerGuard, tracing_subscriber::util::TryInitError> {
    let (writer, guard) = non_blocking_writer(std::io::stdout());
    let registry = tracing_subscriber::registry().with(filter(config));

    match resolve_format(config, production) {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_writer(writer),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .try_init()?,
    }

    Ok(guard)
}
