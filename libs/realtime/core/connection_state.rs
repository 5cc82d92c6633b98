//! Lock-free connection status shared between the event loop and the host
//!
//! The event loop is the only writer. Hosts read `connected`,
//! `reconnect_attempts` and the metrics counters from any thread.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Connection state machine
///
/// ```text
/// Idle ──connect()──> Connecting ──open──> OpenUnauthenticated ──ack──> OpenAuthenticated
///                        ^   │                      │                         │
///                  timer │   └──────────────────────┴────── close ────────────┘
///                        │                                    │
///              ReconnectScheduled <── attempts remain ────────┤
///                                                             │
///                                  Terminated <── exhausted ──┘
/// ```
///
/// `disconnect()` returns to `Idle` from any state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Idle = 0,
    Connecting = 1,
    OpenUnauthenticated = 2,
    OpenAuthenticated = 3,
    ReconnectScheduled = 4,
    Terminated = 5,
}

impl ConnectionState {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::OpenUnauthenticated,
            3 => ConnectionState::OpenAuthenticated,
            4 => ConnectionState::ReconnectScheduled,
            5 => ConnectionState::Terminated,
            _ => ConnectionState::Idle,
        }
    }

    /// The transport is open and can carry frames
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ConnectionState::OpenUnauthenticated | ConnectionState::OpenAuthenticated
        )
    }

    /// A transport exists (opening or open); `connect()` is a no-op here
    #[inline]
    pub fn has_transport(&self) -> bool {
        self.is_open() || *self == ConnectionState::Connecting
    }
}

/// Atomic wrapper around [`ConnectionState`]
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Set and return the previous state
    #[inline]
    pub fn replace(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.inner.swap(state as u8, Ordering::AcqRel))
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get().is_open()
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.get() == ConnectionState::Terminated
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Idle)
    }
}

/// Client metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    /// Outbound frames dropped because no transport was open
    pub frames_dropped: u64,
    /// Reconnects scheduled over the client's lifetime
    pub reconnect_count: u64,
    /// Reconnects scheduled since the last successful open
    pub reconnect_attempts: usize,
    pub connection_state: ConnectionState,
}

/// Atomic counters behind [`Metrics`]
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    frames_dropped: AtomicU64,
    reconnect_count: AtomicU64,
    reconnect_attempts: AtomicUsize,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_reconnect_attempts(&self, attempts: usize) {
        self.reconnect_attempts.store(attempts, Ordering::Release);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count.load(Ordering::Relaxed)
    }

    pub fn reconnect_attempts(&self) -> usize {
        self.reconnect_attempts.load(Ordering::Acquire)
    }
}

/// Everything a host may observe about a connection
#[derive(Debug, Default)]
pub struct ConnectionStatus {
    pub state: AtomicConnectionState,
    pub metrics: AtomicMetrics,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a transport is open
    #[inline]
    pub fn connected(&self) -> bool {
        self.state.is_open()
    }

    #[inline]
    pub fn reconnect_attempts(&self) -> usize {
        self.metrics.reconnect_attempts()
    }

    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn snapshot(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            frames_dropped: self.metrics.frames_dropped(),
            reconnect_count: self.metrics.reconnect_count(),
            reconnect_attempts: self.metrics.reconnect_attempts(),
            connection_state: self.state.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_state_round_trips_through_atomic() {
        let state = AtomicConnectionState::default();
        for s in [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::OpenUnauthenticated,
            ConnectionState::OpenAuthenticated,
            ConnectionState::ReconnectScheduled,
            ConnectionState::Terminated,
        ] {
            state.set(s);
            assert_eq!(state.get(), s);
        }
    }

    #[test]
    fn test_open_and_transport_predicates() {
        assert!(!ConnectionState::Idle.has_transport());
        assert!(ConnectionState::Connecting.has_transport());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(ConnectionState::OpenUnauthenticated.is_open());
        assert!(ConnectionState::OpenAuthenticated.is_open());
        assert!(!ConnectionState::ReconnectScheduled.has_transport());
        assert!(!ConnectionState::Terminated.has_transport());
    }

    #[test]
    fn test_replace_returns_previous() {
        let state = AtomicConnectionState::new(ConnectionState::OpenAuthenticated);
        assert_eq!(
            state.replace(ConnectionState::Idle),
            ConnectionState::OpenAuthenticated
        );
        assert_eq!(state.get(), ConnectionState::Idle);
    }

    #[test]
    fn test_concurrent_readers_see_writes() {
        let status = Arc::new(ConnectionStatus::new());
        status.state.set(ConnectionState::OpenUnauthenticated);
        status.metrics.set_reconnect_attempts(3);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let status = Arc::clone(&status);
                thread::spawn(move || {
                    status.metrics.increment_received();
                    (status.connected(), status.reconnect_attempts())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), (true, 3));
        }
        assert_eq!(status.snapshot().messages_received, 4);
    }
}
