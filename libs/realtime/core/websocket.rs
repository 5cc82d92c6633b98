//! WebSocket transport over tokio-tungstenite
//!
//! Every epoch gets its own socket task:
//!
//! ```text
//! ConnectionManager ──send/close──> Outgoing channel ──> socket task ──> WebSocket
//!        ^                                                    │
//!        └──── event loop <── (Epoch, TransportEvent) ────────┘
//! ```
//!
//! The task reports `Open` once the handshake completes, every text frame
//! as `Message`, socket failures as `Error`, and always finishes with
//! exactly one `Close`.

use crate::traits::*;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

pub type TransportReport = (Epoch, TransportEvent);

#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

/// [`TransportFactory`] that opens real WebSocket connections
///
/// Must be used inside a tokio runtime.
pub struct WebSocketConnector {
    events: UnboundedSender<TransportReport>,
}

impl WebSocketConnector {
    pub fn new(events: UnboundedSender<TransportReport>) -> Self {
        Self { events }
    }
}

impl TransportFactory for WebSocketConnector {
    fn open(&mut self, url: &str, epoch: Epoch) -> Result<Box<dyn Transport>> {
        let request = url
            .into_client_request()
            .map_err(|e| RealtimeError::Transport(format!("invalid url '{}': {}", url, e)))?;

        let (outgoing_tx, outgoing_rx) = unbounded_channel();
        tokio::spawn(run_socket(request, epoch, outgoing_rx, self.events.clone()));

        Ok(Box::new(WebSocketTransport {
            outgoing: outgoing_tx,
        }))
    }
}

struct WebSocketTransport {
    outgoing: UnboundedSender<Outgoing>,
}

impl Transport for WebSocketTransport {
    fn send(&mut self, text: String) -> Result<()> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| RealtimeError::ChannelSend("socket task has exited".to_string()))
    }

    fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn run_socket(
    request: Request,
    epoch: Epoch,
    mut outgoing: UnboundedReceiver<Outgoing>,
    events: UnboundedSender<TransportReport>,
) {
    // The event loop may already be gone during shutdown
    let emit = |event: TransportEvent| {
        let _ = events.send((epoch, event));
    };

    let ws_stream = match connect_async(request).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            emit(TransportEvent::Error(format!("Failed to connect: {}", e)));
            emit(TransportEvent::Close);
            return;
        }
    };

    emit(TransportEvent::Open);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => emit(TransportEvent::Message(text)),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => emit(TransportEvent::Message(text)),
                    Err(_) => warn!("Ignoring non-UTF-8 binary frame on epoch {}", epoch),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!("Server closed epoch {}: {:?}", epoch, frame);
                    break;
                }
                // Control frames are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    debug!("WebSocket stream ended on epoch {}", epoch);
                    break;
                }
            },

            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        emit(TransportEvent::Error(format!("Failed to send: {}", e)));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = write.close().await;
                    break;
                }
            },
        }
    }

    emit(TransportEvent::Close);
}
