//! Graceful shutdown for long-running binaries

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Cloneable shutdown signal, tripped once by Ctrl+C or [`trigger`](Self::trigger)
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Spawn a Ctrl+C handler that trips the signal
    pub fn spawn_signal_handler(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal (Ctrl+C)");
                signal.trigger();
            }
        });
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        !*self.tx.borrow()
    }

    /// Resolve once the signal has been tripped
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Sender lives in self, so wait_for cannot observe a closed channel
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let signal = ShutdownSignal::new();
        assert!(signal.is_running());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(!signal.is_running());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }
}
