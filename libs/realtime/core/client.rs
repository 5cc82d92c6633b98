use crate::core::builder::{states::NoUrl, RealtimeClientBuilder};
use crate::core::connection::{ClientEvent, ConnectionManager};
use crate::core::connection_state::{ConnectionState, ConnectionStatus, Metrics};
use crate::core::dispatcher::{EventDispatcher, Subscription};
use crate::core::frame::{EventKind, OutboundFrame};
use crate::core::provider::RealtimeProvider;
use crate::core::timers::{TimerFiring, TokioScheduler};
use crate::core::websocket::{TransportReport, WebSocketConnector};
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Internal command messages for client control
#[derive(Debug)]
enum ClientCommand {
    Send(OutboundFrame),
    JoinChannel(String),
    LeaveChannel(String),
    Auth(AuthState),
    Unmount,
    Shutdown,
}

/// Real-time client running on a tokio task
///
/// The connection core lives on a single event-loop task that serially
/// handles host commands, socket events and timer firings, so no two
/// transitions ever interleave. Handles on this struct only enqueue commands
/// or read lock-free status; none of them block.
///
/// Subscriber callbacks run on the event-loop task.
pub struct RealtimeClient {
    status: Arc<ConnectionStatus>,
    dispatcher: EventDispatcher,
    command_tx: UnboundedSender<ClientCommand>,
    event_rx: Receiver<ClientEvent>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl RealtimeClient {
    pub fn builder() -> RealtimeClientBuilder<NoUrl> {
        RealtimeClientBuilder::new()
    }

    /// Called by the builder; must run inside a tokio runtime
    pub(crate) fn spawn(
        url: String,
        heartbeat_interval: Duration,
        strategy: Box<dyn ReconnectionStrategy>,
        dispatcher: EventDispatcher,
        auth: Option<AuthState>,
    ) -> Self {
        let status = Arc::new(ConnectionStatus::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let manager = ConnectionManager::new(
            url,
            WebSocketConnector::new(transport_tx),
            TokioScheduler::new(timer_tx),
        )
        .with_strategy(strategy)
        .with_heartbeat_interval(heartbeat_interval)
        .with_dispatcher(dispatcher.clone())
        .with_status(Arc::clone(&status))
        .with_events(event_tx);

        let provider = RealtimeProvider::new(manager);
        let task_handle = tokio::spawn(run_client(
            provider,
            auth,
            command_rx,
            transport_rx,
            timer_rx,
        ));

        Self {
            status,
            dispatcher,
            command_tx,
            event_rx,
            task_handle: Some(task_handle),
        }
    }

    fn command(&self, command: ClientCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| RealtimeError::ChannelSend(format!("event loop has exited: {:?}", e.0)))
    }

    // ------------------------------------------------------------------
    // Host surface
    // ------------------------------------------------------------------

    /// True while a transport is open
    #[inline]
    pub fn connected(&self) -> bool {
        self.status.connected()
    }

    /// Reconnects scheduled since the last successful open
    #[inline]
    pub fn reconnect_attempts(&self) -> usize {
        self.status.reconnect_attempts()
    }

    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.status.state()
    }

    pub fn metrics(&self) -> Metrics {
        self.status.snapshot()
    }

    /// Queue `frame` for transmission
    ///
    /// The frame is dropped silently if no transport is open when the event
    /// loop reaches it. The only error is an event loop that has exited.
    pub fn send_message(&self, frame: OutboundFrame) -> Result<()> {
        self.command(ClientCommand::Send(frame))
    }

    /// Register `callback` for `kind`; it runs on the event-loop task
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, callback)
    }

    /// Receive `kind` payloads on a channel instead of a callback
    pub fn subscribe_stream(&self, kind: EventKind) -> (Subscription, Receiver<Value>) {
        self.dispatcher.subscribe_stream(kind)
    }

    pub fn subscribe_to_channel(&self, channel: impl Into<String>) -> Result<()> {
        self.command(ClientCommand::JoinChannel(channel.into()))
    }

    pub fn unsubscribe_from_channel(&self, channel: impl Into<String>) -> Result<()> {
        self.command(ClientCommand::LeaveChannel(channel.into()))
    }

    /// Report a new snapshot from the authentication collaborator
    ///
    /// The first settled snapshot mounts the connection; an identity change
    /// tears it down and reconnects.
    pub fn set_auth_state(&self, auth: AuthState) -> Result<()> {
        self.command(ClientCommand::Auth(auth))
    }

    /// Disconnect and stay idle until the next [`set_auth_state`](Self::set_auth_state)
    pub fn unmount(&self) -> Result<()> {
        self.command(ClientCommand::Unmount)
    }

    /// Try to receive a lifecycle event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Lifecycle event receiver, for blocking or select-style consumers
    pub fn events(&self) -> &Receiver<ClientEvent> {
        &self.event_rx
    }

    /// Disconnect and wait for the event loop to finish
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down realtime client");
        // Loop already gone if this fails; join below still applies
        let _ = self.command_tx.send(ClientCommand::Shutdown);

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| RealtimeError::EventLoop(e.to_string()))?;
        }
        debug!("Realtime event loop stopped");
        Ok(())
    }
}

/// Main client task loop
async fn run_client(
    mut provider: RealtimeProvider<WebSocketConnector, TokioScheduler>,
    initial_auth: Option<AuthState>,
    mut command_rx: UnboundedReceiver<ClientCommand>,
    mut transport_rx: UnboundedReceiver<TransportReport>,
    mut timer_rx: UnboundedReceiver<TimerFiring>,
) {
    if let Some(auth) = initial_auth {
        provider.apply_auth(&auth);
    }

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(ClientCommand::Send(frame)) => provider.manager_mut().send_message(frame),
                Some(ClientCommand::JoinChannel(channel)) => {
                    provider.manager_mut().subscribe_to_channel(channel)
                }
                Some(ClientCommand::LeaveChannel(channel)) => {
                    provider.manager_mut().unsubscribe_from_channel(channel)
                }
                Some(ClientCommand::Auth(auth)) => provider.apply_auth(&auth),
                Some(ClientCommand::Unmount) => provider.unmount(),
                Some(ClientCommand::Shutdown) | None => {
                    debug!("Shutdown requested, exiting event loop");
                    provider.unmount();
                    break;
                }
            },
            Some((epoch, event)) = transport_rx.recv() => {
                provider.handle_transport_event(epoch, event);
            }
            Some((id, kind)) = timer_rx.recv() => {
                provider.handle_timer(id, kind);
            }
        }
    }
}
