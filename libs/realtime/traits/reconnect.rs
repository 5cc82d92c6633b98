use std::time::Duration;

/// Default base delay before the first reconnect
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Default ceiling on any single reconnect delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Default number of reconnects attempted before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Trait for defining reconnection strategies
///
/// The connection manager owns the attempt counter: it resets it to 0 on
/// every successful open and passes the current value in here on every
/// close.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - Reconnects already scheduled since the last successful open
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Reset the strategy state (called after successful connection)
    fn reset(&mut self);

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;
}

/// Exponential backoff reconnection strategy
///
/// Delays between reconnection attempts grow exponentially:
/// initial_delay * 2^attempt, capped at max_delay
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff strategy
    ///
    /// # Arguments
    /// * `initial_delay` - The initial delay before first reconnect
    /// * `max_delay` - The maximum delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }
}

impl Default for ExponentialBackoff {
    /// 1s, 2s, 4s, 8s, 10s, then stop
    fn default() -> Self {
        Self::new(
            DEFAULT_INITIAL_DELAY,
            DEFAULT_MAX_DELAY,
            Some(DEFAULT_MAX_ATTEMPTS),
        )
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let initial_ms = self.initial_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
        let delay = initial_ms.saturating_mul(factor).min(max_ms);
        Some(Duration::from_millis(delay))
    }

    fn reset(&mut self) {
        // Stateless: the attempt counter lives in the connection manager
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Never reconnect strategy
///
/// The first close after an open is terminal.
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}

    fn should_reconnect(&self, _attempt: usize) -> bool {
        false
    }
}
