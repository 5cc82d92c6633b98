//! Tokio-backed [`Scheduler`]
//!
//! Each timer is a spawned task that sleeps (or ticks) and then reports
//! `(TimerId, TimerKind)` on an unbounded channel read by the event loop.
//! Cancelling aborts the task. A firing already sitting in the channel when
//! the timer is cancelled is discarded by the connection manager.

use crate::traits::{Scheduler, TimerId, TimerKind};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

pub type TimerFiring = (TimerId, TimerKind);

pub struct TokioScheduler {
    next_id: u64,
    timers: HashMap<TimerId, JoinHandle<()>>,
    fired_tx: UnboundedSender<TimerFiring>,
}

impl TokioScheduler {
    /// Must be created inside a tokio runtime
    pub fn new(fired_tx: UnboundedSender<TimerFiring>) -> Self {
        Self {
            next_id: 1,
            timers: HashMap::new(),
            fired_tx,
        }
    }

    fn allocate(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        let id = self.allocate();
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired_tx.send((id, kind));
        });

        trace!("Scheduled {:?} timer {:?} in {:?}", kind, id, delay);
        self.timers.insert(id, handle);
        id
    }

    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerId {
        let id = self.allocate();
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first immediate tick - wait for the first interval
            ticker.tick().await;
            // If we miss ticks due to slow processing, skip them rather than bursting
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if fired_tx.send((id, kind)).is_err() {
                    break;
                }
            }
        });

        trace!("Scheduled repeating {:?} timer {:?} every {:?}", kind, id, interval);
        self.timers.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
