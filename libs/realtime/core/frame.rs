//! Wire frames
//!
//! Every frame is a JSON object tagged by its `type` field. Outbound and
//! inbound frames are closed enums; anything the server sends with a
//! `type` this client does not know becomes [`InboundFrame::Unknown`] and is
//! logged and dropped by the connection manager.

use crate::traits::{RealtimeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Server-pushed event kinds that subscribers can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NotificationCreated,
    CircleMessage,
    StoryCreated,
    ResourceUpdated,
    UserActivity,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::NotificationCreated,
        EventKind::CircleMessage,
        EventKind::StoryCreated,
        EventKind::ResourceUpdated,
        EventKind::UserActivity,
    ];

    /// The wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NotificationCreated => "notification_created",
            EventKind::CircleMessage => "circle_message",
            EventKind::StoryCreated => "story_created",
            EventKind::ResourceUpdated => "resource_updated",
            EventKind::UserActivity => "user_activity",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RealtimeError::Protocol(format!("unknown event kind '{}'", s)))
    }
}

/// Frames sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Authenticate {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Subscribe {
        channel: String,
    },
    Unsubscribe {
        channel: String,
    },
    Ping,
}

impl OutboundFrame {
    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The wire `type` of this frame
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundFrame::Authenticate { .. } => "authenticate",
            OutboundFrame::Subscribe { .. } => "subscribe",
            OutboundFrame::Unsubscribe { .. } => "unsubscribe",
            OutboundFrame::Ping => "ping",
        }
    }
}

/// Frames received from the server, after validation
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// The server accepted our identity claim
    Authenticated,
    /// Heartbeat acknowledgment
    Pong,
    /// A dispatchable event and its `data` payload
    Event { kind: EventKind, data: Value },
    /// Well-formed frame with a `type` this client does not handle
    Unknown { raw: String },
}

/// Deserialization shape; kept private so the public enum can carry
/// `EventKind` and the raw text of unknown frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireFrame {
    Authenticated,
    Pong,
    NotificationCreated {
        #[serde(default)]
        data: Value,
    },
    CircleMessage {
        #[serde(default)]
        data: Value,
    },
    StoryCreated {
        #[serde(default)]
        data: Value,
    },
    ResourceUpdated {
        #[serde(default)]
        data: Value,
    },
    UserActivity {
        #[serde(default)]
        data: Value,
    },
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Parse one text frame
    ///
    /// # Returns
    /// * `Ok(frame)` - Valid JSON object with a string `type`
    /// * `Err(RealtimeError::Protocol)` - Not JSON, not an object, or no `type`
    pub fn parse(text: &str) -> Result<Self> {
        let wire: WireFrame = serde_json::from_str(text)
            .map_err(|e| RealtimeError::Protocol(format!("{} in frame {}", e, text)))?;

        let event = |kind, data| InboundFrame::Event { kind, data };
        Ok(match wire {
            WireFrame::Authenticated => InboundFrame::Authenticated,
            WireFrame::Pong => InboundFrame::Pong,
            WireFrame::NotificationCreated { data } => event(EventKind::NotificationCreated, data),
            WireFrame::CircleMessage { data } => event(EventKind::CircleMessage, data),
            WireFrame::StoryCreated { data } => event(EventKind::StoryCreated, data),
            WireFrame::ResourceUpdated { data } => event(EventKind::ResourceUpdated, data),
            WireFrame::UserActivity { data } => event(EventKind::UserActivity, data),
            WireFrame::Unknown => InboundFrame::Unknown {
                raw: text.to_string(),
            },
        })
    }
}
