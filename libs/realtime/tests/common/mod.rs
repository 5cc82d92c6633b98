//! Common test utilities for realtime integration tests
//!
//! - [`FakeNetwork`]: a transport factory that records every socket it
//!   opens and every frame written to it
//! - [`ManualClock`]: a scheduler on a virtual clock advanced by hand
//! - [`MockWsServer`]: a local WebSocket server speaking the event protocol

#![allow(dead_code)]

use parking_lot::Mutex;
use realtime::{
    ConnectionManager, Epoch, OutboundFrame, RealtimeError, Result, Scheduler, TimerId,
    TimerKind, Transport, TransportEvent, TransportFactory,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

pub const TEST_URL: &str = "wss://realtime.test/ws";

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ----------------------------------------------------------------------
// Fake transport
// ----------------------------------------------------------------------

#[derive(Debug)]
pub struct SocketRecord {
    pub epoch: Epoch,
    pub url: String,
    pub sent: Vec<String>,
    pub closed: bool,
}

/// Shared log of sockets opened through [`FakeFactory`]
#[derive(Clone, Default)]
pub struct FakeNetwork {
    sockets: Arc<Mutex<Vec<SocketRecord>>>,
    refuse_opens: Arc<Mutex<bool>>,
}

impl FakeNetwork {
    pub fn factory(&self) -> FakeFactory {
        FakeFactory {
            network: self.clone(),
        }
    }

    /// Make every following `open` fail synchronously
    pub fn refuse_opens(&self, refuse: bool) {
        *self.refuse_opens.lock() = refuse;
    }

    pub fn open_count(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn last_epoch(&self) -> Epoch {
        self.sockets
            .lock()
            .last()
            .map(|s| s.epoch)
            .expect("no socket opened yet")
    }

    pub fn epochs(&self) -> Vec<Epoch> {
        self.sockets.lock().iter().map(|s| s.epoch).collect()
    }

    pub fn is_closed(&self, epoch: Epoch) -> bool {
        self.with_socket(epoch, |s| s.closed)
    }

    pub fn raw_sent(&self, epoch: Epoch) -> Vec<String> {
        self.with_socket(epoch, |s| s.sent.clone())
    }

    /// Frames written on `epoch`, decoded
    pub fn sent(&self, epoch: Epoch) -> Vec<OutboundFrame> {
        self.raw_sent(epoch)
            .iter()
            .map(|text| serde_json::from_str(text).expect("fake socket saw invalid frame"))
            .collect()
    }

    /// `type` of every frame written on `epoch`
    pub fn sent_types(&self, epoch: Epoch) -> Vec<&'static str> {
        self.sent(epoch).iter().map(OutboundFrame::type_name).collect()
    }

    /// Frames written across every epoch, in order
    pub fn all_sent(&self) -> Vec<OutboundFrame> {
        self.epochs().into_iter().flat_map(|e| self.sent(e)).collect()
    }

    fn with_socket<T>(&self, epoch: Epoch, f: impl FnOnce(&SocketRecord) -> T) -> T {
        let sockets = self.sockets.lock();
        let socket = sockets
            .iter()
            .find(|s| s.epoch == epoch)
            .unwrap_or_else(|| panic!("no socket for epoch {}", epoch));
        f(socket)
    }
}

pub struct FakeFactory {
    network: FakeNetwork,
}

impl TransportFactory for FakeFactory {
    fn open(&mut self, url: &str, epoch: Epoch) -> Result<Box<dyn Transport>> {
        if *self.network.refuse_opens.lock() {
            return Err(RealtimeError::Transport("connection refused".to_string()));
        }
        let mut sockets = self.network.sockets.lock();
        sockets.push(SocketRecord {
            epoch,
            url: url.to_string(),
            sent: Vec::new(),
            closed: false,
        });
        Ok(Box::new(FakeTransport {
            network: self.network.clone(),
            index: sockets.len() - 1,
        }))
    }
}

struct FakeTransport {
    network: FakeNetwork,
    index: usize,
}

impl Transport for FakeTransport {
    fn send(&mut self, text: String) -> Result<()> {
        let mut sockets = self.network.sockets.lock();
        let socket = &mut sockets[self.index];
        if socket.closed {
            return Err(RealtimeError::Transport("socket closed".to_string()));
        }
        socket.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.network.sockets.lock()[self.index].closed = true;
    }
}

// ----------------------------------------------------------------------
// Virtual clock
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    id: TimerId,
    kind: TimerKind,
    due: Duration,
    every: Option<Duration>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer>,
    reconnect_delays: Vec<Duration>,
}

/// [`Scheduler`] on a virtual clock; clones share the same clock
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Delays passed to every reconnect `schedule_once`, in order
    pub fn reconnect_delays(&self) -> Vec<Duration> {
        self.state.lock().reconnect_delays.clone()
    }

    pub fn pending(&self, kind: TimerKind) -> usize {
        self.state
            .lock()
            .pending
            .iter()
            .filter(|t| t.kind == kind)
            .count()
    }

    /// Move time forward by `by`, firing each due timer in due order
    ///
    /// `fire` receives every firing; the clock lock is not held while it runs.
    pub fn advance(&self, by: Duration, mut fire: impl FnMut(TimerId, TimerKind)) {
        let target = self.now() + by;
        while let Some((id, kind)) = self.pop_due(target) {
            fire(id, kind);
        }
        self.state.lock().now = target;
    }

    fn pop_due(&self, target: Duration) -> Option<(TimerId, TimerKind)> {
        let mut state = self.state.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.id.0))
            .map(|(i, _)| i)?;

        let timer = state.pending[index];
        state.now = timer.due;
        match timer.every {
            Some(every) => state.pending[index].due = timer.due + every,
            None => {
                state.pending.remove(index);
            }
        }
        Some((timer.id, timer.kind))
    }

    fn insert(&mut self, due_in: Duration, kind: TimerKind, every: Option<Duration>) -> TimerId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        let due = state.now + due_in;
        state.pending.push(PendingTimer { id, kind, due, every });
        id
    }
}

impl Scheduler for ManualClock {
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        if kind == TimerKind::Reconnect {
            self.state.lock().reconnect_delays.push(delay);
        }
        self.insert(delay, kind, None)
    }

    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerId {
        self.insert(interval, kind, Some(interval))
    }

    fn cancel(&mut self, id: TimerId) {
        self.state.lock().pending.retain(|t| t.id != id);
    }
}

// ----------------------------------------------------------------------
// Connection fixtures
// ----------------------------------------------------------------------

pub type TestManager = ConnectionManager<FakeFactory, ManualClock>;

/// Idle manager wired to a fresh fake network and clock
pub fn manager() -> (TestManager, FakeNetwork, ManualClock) {
    let network = FakeNetwork::default();
    let clock = ManualClock::default();
    let manager = ConnectionManager::new(TEST_URL, network.factory(), clock.clone());
    (manager, network, clock)
}

/// Advance the clock, feeding every firing to `manager`
pub fn advance(manager: &mut TestManager, clock: &ManualClock, by: Duration) {
    clock.advance(by, |id, kind| manager.handle_timer(id, kind));
}

/// Deliver `open` on the newest socket
pub fn open_latest(manager: &mut TestManager, network: &FakeNetwork) {
    manager.handle_transport_event(network.last_epoch(), TransportEvent::Open);
}

/// Deliver `close` on the newest socket
pub fn close_latest(manager: &mut TestManager, network: &FakeNetwork) {
    manager.handle_transport_event(network.last_epoch(), TransportEvent::Close);
}

/// Deliver an inbound frame on the newest socket
pub fn server_sends(manager: &mut TestManager, network: &FakeNetwork, frame: serde_json::Value) {
    manager.handle_transport_event(
        network.last_epoch(),
        TransportEvent::Message(frame.to_string()),
    );
}

// ----------------------------------------------------------------------
// Mock WebSocket server
// ----------------------------------------------------------------------

/// Local server that speaks the event protocol
///
/// - `authenticate` → `authenticated`, then a `notification_created`
///   event with `{"id": "n1"}`
/// - `ping` → `pong`
/// - `subscribe` → a `circle_message` event naming the joined channel
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self { addr, shutdown }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shutdown: Arc<Notify>) {
        use futures::{SinkExt, StreamExt};
        use serde_json::{json, Value};
        use tokio_tungstenite::{accept_async, tungstenite::Message};

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue,
                    };
                    let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                        continue;
                    };

                    let replies = match frame["type"].as_str() {
                        Some("authenticate") => vec![
                            json!({"type": "authenticated"}),
                            json!({"type": "notification_created", "data": {"id": "n1"}}),
                        ],
                        Some("ping") => vec![json!({"type": "pong"})],
                        Some("subscribe") => vec![json!({
                            "type": "circle_message",
                            "data": {"channel": frame["channel"].clone()},
                        })],
                        _ => Vec::new(),
                    };

                    for reply in replies {
                        if write.send(Message::Text(reply.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
