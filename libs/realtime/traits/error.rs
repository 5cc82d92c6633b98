use thiserror::Error;

/// Main error type for the realtime client
///
/// None of these escape `send_message`, `subscribe` or the channel calls;
/// they are logged where they occur. Only construction and shutdown
/// return them to the caller.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Socket-level failure (open, read or write)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed inbound frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Outbound frame could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Event loop task panicked or was cancelled
    #[error("Event loop failed: {0}")]
    EventLoop(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reconnect attempts ran out
    #[error("Reconnection exhausted after {attempts} attempts")]
    ReconnectionExhausted { attempts: usize },
}

/// Result type for realtime operations
pub type Result<T> = std::result::Result<T, RealtimeError>;
