//! Connection manager
//!
//! Synchronous state machine that owns the transport handle, the
//! reconnect timer, the heartbeat and the per-epoch handshake. It performs
//! no I/O and never sleeps: transports and timers come in through the
//! [`TransportFactory`] and [`Scheduler`] seams, and their events are fed
//! back in through [`ConnectionManager::handle_transport_event`] and
//! [`ConnectionManager::handle_timer`] by whatever drives it (the tokio
//! event loop in [`RealtimeClient`](crate::core::RealtimeClient), or a test).
//!
//! All methods take `&mut self`, so every transition runs to completion
//! before the next event is looked at.

use crate::core::channels::ChannelRequest;
use crate::core::connection_state::{ConnectionState, ConnectionStatus};
use crate::core::dispatcher::{EventDispatcher, Subscription};
use crate::core::frame::{EventKind, InboundFrame, OutboundFrame};
use crate::core::handshake::{AuthenticationHandshake, HandshakePhase};
use crate::core::heartbeat::{HeartbeatMonitor, DEFAULT_HEARTBEAT_INTERVAL};
use crate::traits::*;
use crossbeam_channel::Sender;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle notifications for hosts that want to observe the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A transport opened (a new epoch began)
    Connected,
    /// An open transport closed
    Disconnected,
    /// A reconnect is pending
    ReconnectScheduled { attempt: usize, delay: Duration },
    /// Reconnect attempts ran out; no further automatic recovery
    Terminated,
}

struct ActiveTransport {
    epoch: Epoch,
    handle: Box<dyn Transport>,
}

/// Owns one logical connection and its timers
pub struct ConnectionManager<F, S>
where
    F: TransportFactory,
    S: Scheduler,
{
    url: String,
    factory: F,
    scheduler: S,
    strategy: Box<dyn ReconnectionStrategy>,
    status: Arc<ConnectionStatus>,
    dispatcher: EventDispatcher,
    handshake: AuthenticationHandshake,
    heartbeat: HeartbeatMonitor,
    transport: Option<ActiveTransport>,
    reconnect_timer: Option<TimerId>,
    attempt_count: usize,
    next_epoch: u64,
    user_id: Option<String>,
    events: Option<Sender<ClientEvent>>,
}

impl<F, S> ConnectionManager<F, S>
where
    F: TransportFactory,
    S: Scheduler,
{
    /// Create an idle manager with the default policy
    /// (30s heartbeat, 1s→10s backoff, 5 attempts)
    pub fn new(url: impl Into<String>, factory: F, scheduler: S) -> Self {
        Self {
            url: url.into(),
            factory,
            scheduler,
            strategy: Box::new(ExponentialBackoff::default()),
            status: Arc::new(ConnectionStatus::new()),
            dispatcher: EventDispatcher::new(),
            handshake: AuthenticationHandshake::new(),
            heartbeat: HeartbeatMonitor::new(DEFAULT_HEARTBEAT_INTERVAL),
            transport: None,
            reconnect_timer: None,
            attempt_count: 0,
            next_epoch: 1,
            user_id: None,
            events: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat = HeartbeatMonitor::new(interval);
        self
    }

    /// Share an existing subscriber registry
    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Share an existing status block
    pub fn with_status(mut self, status: Arc<ConnectionStatus>) -> Self {
        self.status = status;
        self
    }

    /// Publish lifecycle notifications on `events`
    pub fn with_events(mut self, events: Sender<ClientEvent>) -> Self {
        self.events = Some(events);
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open a transport unless one is already open or opening
    ///
    /// Cancels any pending reconnect timer first. From `Terminated` the
    /// backoff starts over.
    pub fn connect(&mut self) {
        let state = self.status.state();
        if state.has_transport() {
            debug!("connect() ignored: transport already {:?}", state);
            return;
        }
        if self.status.state.is_terminated() {
            info!("Restarting after exhausted reconnects");
            self.reset_attempts();
        }
        self.cancel_reconnect_timer();
        self.open_transport();
    }

    fn reset_attempts(&mut self) {
        self.attempt_count = 0;
        self.status.metrics.set_reconnect_attempts(0);
        self.strategy.reset();
    }

    /// Tear everything down and return to `Idle`
    ///
    /// Cancels the reconnect timer, stops the heartbeat, closes the
    /// transport and resets the attempt counter and authenticated flag.
    /// Events still in flight from the closed transport are ignored.
    pub fn disconnect(&mut self) {
        self.cancel_reconnect_timer();
        self.heartbeat.stop(&mut self.scheduler);

        if let Some(mut active) = self.transport.take() {
            active.handle.close();
            info!("Closed transport (epoch {})", active.epoch);
        }

        self.reset_attempts();
        self.handshake.end_epoch();

        let previous = self.status.state.replace(ConnectionState::Idle);
        if previous.is_open() {
            self.emit(ClientEvent::Disconnected);
        }
    }

    fn open_transport(&mut self) {
        let epoch = Epoch(self.next_epoch);
        self.next_epoch += 1;

        self.handshake.begin_epoch(epoch);
        self.status.state.set(ConnectionState::Connecting);
        debug!("Opening transport to {} (epoch {})", self.url, epoch);

        match self.factory.open(&self.url, epoch) {
            Ok(handle) => {
                self.transport = Some(ActiveTransport { epoch, handle });
            }
            Err(e) => {
                error!("Failed to open transport: {}", e);
                self.on_close();
            }
        }
    }

    fn cancel_reconnect_timer(&mut self) {
        if let Some(id) = self.reconnect_timer.take() {
            self.scheduler.cancel(id);
            debug!("Cancelled pending reconnect");
        }
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Feed a transport event. Events from any epoch other than the
    /// current one are discarded.
    pub fn handle_transport_event(&mut self, epoch: Epoch, event: TransportEvent) {
        if self.current_epoch() != Some(epoch) {
            trace!("Ignoring {:?} from stale epoch {}", event, epoch);
            return;
        }

        match event {
            TransportEvent::Open => self.on_open(epoch),
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Error(reason) => {
                // The close that follows drives recovery
                warn!("Transport error on epoch {}: {}", epoch, RealtimeError::Transport(reason));
            }
            TransportEvent::Close => self.on_close(),
        }
    }

    /// Feed a timer firing. Firings for cancelled timers are discarded.
    pub fn handle_timer(&mut self, id: TimerId, kind: TimerKind) {
        match kind {
            TimerKind::Reconnect => {
                if self.reconnect_timer != Some(id) {
                    trace!("Ignoring stale reconnect timer {:?}", id);
                    return;
                }
                self.reconnect_timer = None;
                self.scheduler.cancel(id);
                debug!("Reconnect timer fired (attempt {})", self.attempt_count);
                self.open_transport();
            }
            TimerKind::Heartbeat => {
                if !self.heartbeat.owns(id) {
                    trace!("Ignoring stale heartbeat timer {:?}", id);
                    return;
                }
                trace!("Heartbeat tick - sending ping");
                self.send_message(HeartbeatMonitor::payload());
            }
        }
    }

    /// Set the session identity used for the identity claim and the
    /// dispatch gate. Does not send anything by itself; see
    /// [`reconcile_authentication`](Self::reconcile_authentication).
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    /// Send the identity claim if the transport is open, an identity is
    /// known and this epoch has not claimed yet
    ///
    /// Covers a session that resolves after the socket opened.
    pub fn reconcile_authentication(&mut self) {
        if !self.status.connected() {
            return;
        }
        if let Some(frame) = self.handshake.claim(self.user_id.as_deref()) {
            debug!("Session identity available after open; authenticating");
            self.send_message(frame);
        }
    }

    // ------------------------------------------------------------------
    // Transport handlers
    // ------------------------------------------------------------------

    fn on_open(&mut self, epoch: Epoch) {
        info!("Connected to {} (epoch {})", self.url, epoch);
        self.status.state.set(ConnectionState::OpenUnauthenticated);
        self.reset_attempts();

        if let Some(frame) = self.handshake.claim(self.user_id.as_deref()) {
            self.send_message(frame);
            debug!("Sent authentication message");
        }

        self.heartbeat.start(&mut self.scheduler);
        self.emit(ClientEvent::Connected);
    }

    fn on_message(&mut self, text: &str) {
        self.status.metrics.increment_received();

        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping inbound frame: {}", e);
                return;
            }
        };

        match frame {
            InboundFrame::Authenticated => self.on_authenticated(),
            InboundFrame::Pong => trace!("Pong received"),
            InboundFrame::Event { kind, data } => self.dispatch(kind, &data),
            InboundFrame::Unknown { raw } => warn!("Ignoring unknown frame: {}", raw),
        }
    }

    /// Only an ack for a claim sent on this open epoch promotes the state;
    /// any other ack just sets the epoch's flag
    fn on_authenticated(&mut self) {
        let state = self.status.state();
        if !state.is_open() {
            warn!("Ignoring authenticated frame while {:?}", state);
            return;
        }

        let claimed = self.handshake.phase() == HandshakePhase::Sent;
        if !self.handshake.acknowledge() {
            trace!("Duplicate authenticated frame");
            return;
        }

        if claimed && state == ConnectionState::OpenUnauthenticated {
            debug!("Server acknowledged authentication");
            self.status.state.set(ConnectionState::OpenAuthenticated);
        } else {
            warn!("Unsolicited authenticated frame; state stays {:?}", state);
        }
    }

    fn dispatch(&self, kind: EventKind, data: &Value) {
        // Gated on identity, not on the handshake flag
        if self.user_id.is_none() {
            debug!("Dropping {} event: no session identity", kind);
            return;
        }
        let delivered = self.dispatcher.dispatch(kind, data);
        trace!("Delivered {} to {} subscribers", kind, delivered);
    }

    fn on_close(&mut self) {
        let closed = self.transport.take();
        self.heartbeat.stop(&mut self.scheduler);
        self.handshake.end_epoch();
        self.cancel_reconnect_timer();

        if let Some(active) = &closed {
            debug!("Transport closed (epoch {})", active.epoch);
        }
        if self.status.state().is_open() {
            self.emit(ClientEvent::Disconnected);
        }

        match self.strategy.next_delay(self.attempt_count) {
            Some(delay) => {
                let id = self.scheduler.schedule_once(delay, TimerKind::Reconnect);
                self.reconnect_timer = Some(id);
                self.attempt_count += 1;

                self.status.metrics.set_reconnect_attempts(self.attempt_count);
                self.status.metrics.increment_reconnects();
                self.status.state.set(ConnectionState::ReconnectScheduled);

                info!("Reconnecting in {:?} (attempt {})", delay, self.attempt_count);
                self.emit(ClientEvent::ReconnectScheduled {
                    attempt: self.attempt_count,
                    delay,
                });
            }
            None => {
                self.status.state.set(ConnectionState::Terminated);
                warn!(
                    "{}; real-time updates stopped",
                    RealtimeError::ReconnectionExhausted {
                        attempts: self.attempt_count
                    }
                );
                self.emit(ClientEvent::Terminated);
            }
        }
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    /// Transmit `frame` if the transport is open; otherwise drop it
    ///
    /// Dropped frames are never buffered or retried.
    pub fn send_message(&mut self, frame: OutboundFrame) {
        if !self.status.connected() {
            debug!("Dropping {} frame: transport not open", frame.type_name());
            self.status.metrics.increment_dropped();
            return;
        }
        let Some(active) = self.transport.as_mut() else {
            debug!("Dropping {} frame: no transport", frame.type_name());
            self.status.metrics.increment_dropped();
            return;
        };

        let text = match frame.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {} frame: {}", frame.type_name(), e);
                return;
            }
        };

        match active.handle.send(text) {
            Ok(()) => self.status.metrics.increment_sent(),
            Err(e) => {
                warn!(
                    "Failed to send {} frame on epoch {}: {}",
                    frame.type_name(),
                    active.epoch,
                    e
                );
                self.status.metrics.increment_dropped();
            }
        }
    }

    /// Ask the server to join `channel`
    pub fn subscribe_to_channel(&mut self, channel: impl Into<String>) {
        let request = ChannelRequest::join(channel);
        debug!("Joining channel {}", request.channel);
        self.send_message(request.into());
    }

    /// Ask the server to leave `channel`
    pub fn unsubscribe_from_channel(&mut self, channel: impl Into<String>) {
        let request = ChannelRequest::leave(channel);
        debug!("Leaving channel {}", request.channel);
        self.send_message(request.into());
    }

    /// Register an event callback; see [`EventDispatcher::subscribe`]
    pub fn subscribe<C>(&self, kind: EventKind, callback: C) -> Subscription
    where
        C: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, callback)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn connected(&self) -> bool {
        self.status.connected()
    }

    pub fn reconnect_attempts(&self) -> usize {
        self.attempt_count
    }

    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }

    /// The current epoch's authenticated flag
    pub fn is_authenticated(&self) -> bool {
        self.handshake.is_authenticated()
    }

    pub fn current_epoch(&self) -> Option<Epoch> {
        self.transport.as_ref().map(|active| active.epoch)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat.is_running()
    }

    pub fn status(&self) -> Arc<ConnectionStatus> {
        Arc::clone(&self.status)
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(events) = &self.events {
            // Host stopped listening; lifecycle events are advisory
            let _ = events.send(event);
        }
    }
}
