use crate::traits::error::Result;
use std::fmt;

/// Identifies one underlying transport, from connecting to its close
///
/// Every event reported by a transport carries the epoch it was opened
/// with. Events whose epoch is no longer current are ignored, so a socket
/// that was torn down can never mutate the state of its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle and data events reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket finished its handshake and can carry frames
    Open,
    /// A text frame arrived
    Message(String),
    /// The socket reported an error; a `Close` always follows
    Error(String),
    /// The socket is gone
    Close,
}

/// Handle to one open (or opening) transport
pub trait Transport: Send {
    /// Queue a text frame for transmission
    fn send(&mut self, text: String) -> Result<()>;

    /// Close the socket. Idempotent.
    fn close(&mut self);
}

/// Creates transports on demand
///
/// `open` must not block. The factory reports the new transport's events
/// (`Open`, `Message`, `Error`, `Close`) back to whoever drives the
/// connection manager, tagged with `epoch`.
///
/// # Returns
/// * `Ok(transport)` - Opening has started
/// * `Err(RealtimeError)` - The transport could not even be created
///   (for example, a malformed URL); treated like an immediate close
pub trait TransportFactory: Send {
    fn open(&mut self, url: &str, epoch: Epoch) -> Result<Box<dyn Transport>>;
}
