//! Channel join/leave requests
//!
//! Requests are fire-and-forget: each call produces exactly one outbound
//! frame and nothing is remembered. After a reconnect the server has
//! forgotten every join; callers that need continuity re-issue joins when
//! they observe [`ClientEvent::Connected`](crate::core::ClientEvent).

use crate::core::frame::OutboundFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Join,
    Leave,
}

/// A single join or leave for a named channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub channel: String,
    pub action: ChannelAction,
}

impl ChannelRequest {
    pub fn join(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            action: ChannelAction::Join,
        }
    }

    pub fn leave(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            action: ChannelAction::Leave,
        }
    }
}

impl From<ChannelRequest> for OutboundFrame {
    fn from(request: ChannelRequest) -> Self {
        match request.action {
            ChannelAction::Join => OutboundFrame::Subscribe {
                channel: request.channel,
            },
            ChannelAction::Leave => OutboundFrame::Unsubscribe {
                channel: request.channel,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_map_to_frames() {
        assert_eq!(
            OutboundFrame::from(ChannelRequest::join("circle:1")),
            OutboundFrame::Subscribe {
                channel: "circle:1".to_string()
            }
        );
        assert_eq!(
            OutboundFrame::from(ChannelRequest::leave("circle:1")),
            OutboundFrame::Unsubscribe {
                channel: "circle:1".to_string()
            }
        );
    }
}
