//! # Realtime
//!
//! Client for a real-time event distribution service over a single
//! persistent WebSocket.
//!
//! ## Features
//!
//! - **Identity handshake**: one `authenticate` claim per transport epoch,
//!   sent as soon as both the socket and the session identity are available
//! - **Exponential backoff**: 1s doubling to a 10s cap, 5 attempts by default
//! - **Heartbeat**: `ping` every 30 seconds while a transport is open
//! - **Typed event fan-out**: callbacks or channel receivers per event kind
//! - **Deterministic core**: the connection state machine is synchronous and
//!   takes its transport and timers through trait seams

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use crate::core::{
    builder::{states, RealtimeClientBuilder},
    channels::{ChannelAction, ChannelRequest},
    client::RealtimeClient,
    config::{ClientConfig, ConfigError, ReconnectConfig},
    connection::{ClientEvent, ConnectionManager},
    connection_state::{ConnectionState, ConnectionStatus, Metrics},
    dispatcher::{EventDispatcher, Subscription},
    frame::{EventKind, InboundFrame, OutboundFrame},
    provider::RealtimeProvider,
};

/// Start building a [`RealtimeClient`]
pub fn builder() -> RealtimeClientBuilder<states::NoUrl> {
    RealtimeClientBuilder::new()
}
