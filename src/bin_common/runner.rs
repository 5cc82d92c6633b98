//! Binary runner utilities
//!
//! Standard startup and shutdown banners around a binary's main loop.

use std::time::Duration;
use tracing::info;

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// How often the main loop logs a status line
    pub status_interval: Duration,
    /// How often the main loop polls for lifecycle events
    pub poll_interval: Duration,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_interval: Duration::from_secs(60),
            poll_interval: Duration::from_millis(200),
        }
    }

    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Trait for binary applications
pub trait BinaryRunner {
    /// Run the application main loop
    async fn run(&mut self) -> anyhow::Result<()>;

    /// Get the run configuration
    fn config(&self) -> &RunConfig;

    /// Summary line for the shutdown banner
    fn summary(&self) -> Option<String> {
        None
    }

    fn print_banner(&self) {
        let config = self.config();
        info!("========================================");
        info!("Starting {}", config.name);
        info!("Press Ctrl+C to stop");
        info!("========================================");
    }

    fn print_shutdown(&self) {
        let config = self.config();
        info!("========================================");
        info!("{} stopped gracefully", config.name);
        if let Some(summary) = self.summary() {
            info!("{}", summary);
        }
        info!("========================================");
    }

    /// Execute the binary with banners around [`run`](Self::run)
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::new("listen")
            .with_status_interval(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(50));

        assert_eq!(config.name, "listen");
        assert_eq!(config.status_interval, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::new("default");
        assert_eq!(config.status_interval, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(200));
    }
}
