//! Graceful shutdown with signal handling

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Process-wide shutdown trigger
///
/// Clones share one token; triggering more than once has no further effect.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Create a new shutdown signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Token to hand to the poll loop
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown signal triggered");
        }
        self.token.cancel();
    }

    /// Check if shutdown was triggered
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is triggered
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Signal handler for OS signals
#[derive(Debug)]
pub struct SignalHandler {
    signal: ShutdownSignal,
}

impl SignalHandler {
    /// Create a new signal handler
    pub fn new(signal: ShutdownSignal) -> Self {
        Self { signal }
    }

    /// Wait for SIGINT/SIGTERM (Ctrl+C elsewhere) and trigger shutdown
    ///
    /// Returns early without triggering if the handlers cannot be installed.
    pub async fn run(self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT");
                }
                _ = self.signal.wait() => return Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    tracing::info!("Received Ctrl+C");
                }
                _ = self.signal.wait() => return Ok(()),
            }
        }

        self.signal.trigger();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_new() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        assert!(!signal.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_signal_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let token = signal.token();
        let clone = signal.clone();

        clone.trigger();

        assert!(signal.is_triggered());
        assert!(token.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_signal_handler_exits_when_already_triggered() {
        let signal = ShutdownSignal::new();
        let handler = SignalHandler::new(signal.clone());
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), handler.run())
            .await
            .unwrap()
            .unwrap();
    }
}
