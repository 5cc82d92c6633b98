//! Heartbeat mechanism
//!
//! ```text
//! open ──> start() ──> Scheduler (repeating, every interval)
//!                            │
//!                            v
//!              ConnectionManager::handle_timer ──> send_message(ping)
//! close / disconnect ──> stop() ──> Scheduler::cancel
//! ```
//!
//! The first ping goes out one full interval after the open, so the
//! identity claim always precedes it. `pong` replies are acknowledged and
//! otherwise ignored; no round-trip time is measured.

use crate::core::frame::OutboundFrame;
use crate::traits::{Scheduler, TimerId, TimerKind};
use std::time::Duration;
use tracing::debug;

/// Default keep-alive interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Owns the keep-alive timer
#[derive(Debug)]
pub struct HeartbeatMonitor {
    interval: Duration,
    timer: Option<TimerId>,
}

impl HeartbeatMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timer: None,
        }
    }

    /// Arm the interval timer. No-op if already running.
    pub fn start<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.timer.is_some() {
            return;
        }
        let id = scheduler.schedule_repeating(self.interval, TimerKind::Heartbeat);
        debug!("Heartbeat started with interval: {:?}", self.interval);
        self.timer = Some(id);
    }

    /// Cancel the interval timer if running
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
            debug!("Heartbeat stopped");
        }
    }

    /// Whether `id` is the live heartbeat timer
    pub fn owns(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// The keep-alive frame
    pub fn payload() -> OutboundFrame {
        OutboundFrame::Ping
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}
