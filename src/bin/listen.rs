//! Realtime event listener
//!
//! Connects to the event service, authenticates as `REALTIME_USER_ID`,
//! joins the configured channels and logs every event it receives.
//!
//! Usage:
//!   listen [config_path]
//!
//! Environment variables:
//!   CONFIG_PATH      - config file when no path argument is given
//!                      (default: config/realtime.yaml)
//!   REALTIME_WS_URL  - overrides `url` from the config file
//!   REALTIME_USER_ID - session identity; unset means signed out
//!   RUST_LOG         - overrides `log_level` from the config file

use anyhow::{Context, Result};
use realtime::{ClientConfig, ClientEvent, EventKind, RealtimeClient};
use realtime_listener::bin_common::{
    auth_from_env, init_tracing, load_config_from_env, parse_args, BinaryRunner, ConfigType,
    RunConfig, ShutdownSignal,
};
use std::time::Instant;
use tracing::{info, warn};

struct Listener {
    run_config: RunConfig,
    client_config: ClientConfig,
    shutdown: ShutdownSignal,
    events_seen: u64,
}

impl Listener {
    fn new(client_config: ClientConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            run_config: RunConfig::new("Realtime Listener"),
            client_config,
            shutdown,
            events_seen: 0,
        }
    }

    /// Channel membership is not replayed by the client; re-join on every open
    fn join_channels(&self, client: &RealtimeClient) -> Result<()> {
        for channel in &self.client_config.channels {
            client.subscribe_to_channel(channel.clone())?;
            info!("Joined channel {}", channel);
        }
        Ok(())
    }

    fn handle_lifecycle(&self, client: &RealtimeClient, event: ClientEvent) -> Result<()> {
        match event {
            ClientEvent::Connected => {
                info!("Connected to {}", self.client_config.url);
                self.join_channels(client)?;
            }
            ClientEvent::Disconnected => warn!("Connection lost"),
            ClientEvent::ReconnectScheduled { attempt, delay } => {
                info!("Reconnect attempt {} in {:?}", attempt, delay);
            }
            ClientEvent::Terminated => {
                warn!("Reconnect attempts exhausted; no further events will arrive");
            }
        }
        Ok(())
    }
}

impl BinaryRunner for Listener {
    async fn run(&mut self) -> Result<()> {
        let client = RealtimeClient::builder()
            .config(&self.client_config)
            .build()
            .await
            .context("Failed to build realtime client")?;

        let streams: Vec<_> = EventKind::ALL
            .iter()
            .map(|&kind| (kind, client.subscribe_stream(kind)))
            .collect();

        client.set_auth_state(auth_from_env())?;

        let mut poll = tokio::time::interval(self.run_config.poll_interval);
        let mut last_status = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown.wait() => break,
                _ = poll.tick() => {}
            }

            while let Some(event) = client.try_recv_event() {
                self.handle_lifecycle(&client, event)?;
            }

            for (kind, (_, rx)) in &streams {
                for data in rx.try_iter() {
                    self.events_seen += 1;
                    info!("{}: {}", kind, data);
                }
            }

            if last_status.elapsed() >= self.run_config.status_interval {
                let metrics = client.metrics();
                info!(
                    "Status: {:?} | sent {} | received {} | dropped {} | reconnects {}",
                    metrics.connection_state,
                    metrics.messages_sent,
                    metrics.messages_received,
                    metrics.frames_dropped,
                    metrics.reconnect_count
                );
                last_status = Instant::now();
            }
        }

        for (_, (subscription, _)) in &streams {
            subscription.unsubscribe();
        }
        client.shutdown().await?;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn summary(&self) -> Option<String> {
        Some(format!("Events received: {}", self.events_seen))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    let config_type = match parse_args().into_iter().next() {
        Some(path) => ConfigType::Custom(path),
        None => ConfigType::Realtime,
    };
    let config_path = load_config_from_env(config_type);
    let client_config = ClientConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_tracing(&client_config.log_level);
    info!("Loaded configuration from {}", config_path.display());

    let shutdown = ShutdownSignal::new();
    shutdown.spawn_signal_handler();

    Listener::new(client_config, shutdown).execute().await
}
