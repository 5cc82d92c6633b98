pub mod builder;
pub mod channels;
pub mod client;
pub mod config;
pub mod connection;
pub mod connection_state;
pub mod dispatcher;
pub mod frame;
pub mod handshake;
pub mod heartbeat;
pub mod provider;
pub mod timers;
pub mod websocket;

pub use builder::RealtimeClientBuilder;
pub use channels::{ChannelAction, ChannelRequest};
pub use client::RealtimeClient;
pub use config::{ClientConfig, ConfigError, ReconnectConfig};
pub use connection::{ClientEvent, ConnectionManager};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, ConnectionStatus, Metrics};
pub use dispatcher::{EventCallback, EventDispatcher, Subscription};
pub use frame::{EventKind, InboundFrame, OutboundFrame};
pub use handshake::{AuthenticationHandshake, HandshakePhase};
pub use heartbeat::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL};
pub use provider::RealtimeProvider;
pub use timers::TokioScheduler;
pub use websocket::WebSocketConnector;
