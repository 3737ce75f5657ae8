//! OS signal handling.
//!
//! SIGTERM and SIGINT both request a graceful shutdown. Every signal is routed
//! to [`Shutdown::trigger`]; only the first one has an effect.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Terminate,
    Interrupt,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Registered termination signal streams.
pub struct SignalListener {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
}

impl SignalListener {
    pub fn install() -> std::io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                terminate: signal(SignalKind::terminate())?,
                interrupt: signal(SignalKind::interrupt())?,
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> std::io::Result<TerminationSignal> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.terminate.recv() => Ok(TerminationSignal::Terminate),
                _ = self.interrupt.recv() => Ok(TerminationSignal::Interrupt),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok(TerminationSignal::Interrupt)
        }
    }
}

/// Route termination signals to `shutdown` until the task is aborted.
pub fn spawn_watcher(shutdown: Arc<Shutdown>) -> std::io::Result<JoinHandle<()>> {
    let mut listener = SignalListener::install()?;

    Ok(tokio::spawn(async move {
        loop {
            let signal = match listener.recv().await {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!(error = %e, "Signal listener failed");
                    return;
                }
            };

            if shutdown.trigger() {
                tracing::info!(signal = %signal, "Signal received, shutting down gracefully");
            } else {
                tracing::warn!(signal = %signal, "Signal received while draining; ignoring");
            }
        }
    }))
}
