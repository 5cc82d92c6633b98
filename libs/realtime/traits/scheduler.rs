use std::time::Duration;

/// Opaque handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot delay before the next connection attempt
    Reconnect,
    /// Keep-alive interval
    Heartbeat,
}

/// Timer seam used by the connection manager
///
/// Implementations deliver `(TimerId, TimerKind)` back to the driver of the
/// connection manager when a timer fires. After `cancel` returns, a firing
/// that was already queued may still arrive; the manager discards firings
/// for ids it no longer owns.
pub trait Scheduler: Send {
    /// Fire once after `delay`
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerId;

    /// Fire every `interval`, first firing one interval from now
    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}
