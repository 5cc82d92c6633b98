pub mod states;

use crate::core::client::RealtimeClient;
use crate::core::config::ClientConfig;
use crate::core::dispatcher::EventDispatcher;
use crate::core::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::traits::*;
use states::*;
use std::marker::PhantomData;
use std::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Type-state builder for [`RealtimeClient`]
///
/// `build()` only exists once a URL has been supplied, either with
/// [`url`](RealtimeClientBuilder::url) or [`config`](RealtimeClientBuilder::config).
///
/// # Example
/// ```ignore
/// let client = RealtimeClient::builder()
///     .url("wss://api.example.com/realtime")
///     .heartbeat_interval(Duration::from_secs(30))
///     .auth_state(AuthState::signed_in("u1"))
///     .build()
///     .await?;
/// ```
pub struct RealtimeClientBuilder<U: UrlState> {
    _state: PhantomData<U>,
    url: Option<String>,
    heartbeat_interval: Duration,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    auth: Option<AuthState>,
    dispatcher: Option<EventDispatcher>,
}

impl RealtimeClientBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
            url: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_strategy: None,
            auth: None,
            dispatcher: None,
        }
    }

    pub fn url(self, url: impl Into<String>) -> RealtimeClientBuilder<HasUrl> {
        RealtimeClientBuilder {
            _state: PhantomData,
            url: Some(url.into()),
            heartbeat_interval: self.heartbeat_interval,
            reconnect_strategy: self.reconnect_strategy,
            auth: self.auth,
            dispatcher: self.dispatcher,
        }
    }

    /// Take URL, heartbeat interval and reconnect policy from `config`
    pub fn config(self, config: &ClientConfig) -> RealtimeClientBuilder<HasUrl> {
        self.url(config.url.clone())
            .heartbeat_interval(config.heartbeat_interval())
            .reconnect_strategy(config.reconnect.strategy())
    }
}

impl Default for RealtimeClientBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

// Optional configuration methods
impl<U: UrlState> RealtimeClientBuilder<U> {
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Apply this snapshot as soon as the event loop starts
    ///
    /// Without it the client stays idle until
    /// [`RealtimeClient::set_auth_state`] reports a settled session.
    pub fn auth_state(mut self, auth: AuthState) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Share a subscriber registry created elsewhere
    pub fn dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }
}

// Build method - only available when the URL is set
impl RealtimeClientBuilder<HasUrl> {
    pub async fn build(self) -> Result<RealtimeClient> {
        let url = self
            .url
            .ok_or_else(|| RealtimeError::Configuration("url must be set".to_string()))?;

        url.as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::Configuration(format!("invalid url '{}': {}", url, e)))?;

        if self.heartbeat_interval.is_zero() {
            return Err(RealtimeError::Configuration(
                "heartbeat interval must be greater than 0".to_string(),
            ));
        }

        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(ExponentialBackoff::default()));

        Ok(RealtimeClient::spawn(
            url,
            self.heartbeat_interval,
            strategy,
            self.dispatcher.unwrap_or_default(),
            self.auth,
        ))
    }
}
