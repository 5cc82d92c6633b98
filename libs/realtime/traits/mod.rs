//! # Realtime Traits
//!
//! Seams and shared types for the realtime event client:
//!
//! - **Transport / TransportFactory**: open and drive one socket per epoch
//! - **Scheduler**: one-shot and repeating timers that can be cancelled
//! - **ReconnectionStrategy**: decide whether and when to reconnect
//! - **AuthState**: read-only view of the external session collaborator
//!
//! The connection core only talks to these seams, so tests can swap in a
//! fake socket and a virtual clock instead of a network and real time.

pub mod error;
pub mod reconnect;
pub mod scheduler;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use error::{RealtimeError, Result};
pub use reconnect::{ExponentialBackoff, NeverReconnect, ReconnectionStrategy};
pub use scheduler::{Scheduler, TimerId, TimerKind};
pub use session::{AuthState, Session};
pub use transport::{Epoch, Transport, TransportEvent, TransportFactory};
