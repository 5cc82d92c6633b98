//! Per-epoch authentication
//!
//! The identity claim is sent optimistically: the epoch counts as
//! authenticated from the moment the `authenticate` frame is handed to the
//! transport, and the server's `authenticated` echo only confirms it. Every
//! new epoch starts unauthenticated.

use crate::core::frame::OutboundFrame;
use crate::traits::Epoch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakePhase {
    /// Nothing sent on this epoch yet
    #[default]
    Pending,
    /// `authenticate` sent, no echo yet
    Sent,
    /// Server echoed `authenticated`
    Acknowledged,
}

/// Tracks the identity claim for the current epoch
#[derive(Debug, Default)]
pub struct AuthenticationHandshake {
    epoch: Option<Epoch>,
    phase: HandshakePhase,
}

impl AuthenticationHandshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a fresh epoch, unauthenticated
    pub fn begin_epoch(&mut self, epoch: Epoch) {
        self.epoch = Some(epoch);
        self.phase = HandshakePhase::Pending;
    }

    /// Forget the current epoch
    pub fn end_epoch(&mut self) {
        self.epoch = None;
        self.phase = HandshakePhase::Pending;
    }

    /// Produce the `authenticate` frame if this epoch still needs one
    ///
    /// Returns `None` when there is no epoch, no identity, or the claim was
    /// already made. Returning a frame marks the epoch authenticated.
    pub fn claim(&mut self, user_id: Option<&str>) -> Option<OutboundFrame> {
        if self.epoch.is_none() || self.phase != HandshakePhase::Pending {
            return None;
        }
        let user_id = user_id?;
        self.phase = HandshakePhase::Sent;
        Some(OutboundFrame::Authenticate {
            user_id: user_id.to_string(),
        })
    }

    /// Record the server's `authenticated` echo
    ///
    /// Returns `true` the first time the epoch is acknowledged.
    pub fn acknowledge(&mut self) -> bool {
        if self.epoch.is_none() || self.phase == HandshakePhase::Acknowledged {
            return false;
        }
        self.phase = HandshakePhase::Acknowledged;
        true
    }

    /// The epoch's authenticated flag (set at send time)
    pub fn is_authenticated(&self) -> bool {
        self.phase != HandshakePhase::Pending
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn epoch(&self) -> Option<Epoch> {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once_per_epoch() {
        let mut handshake = AuthenticationHandshake::new();
        handshake.begin_epoch(Epoch(1));

        assert_eq!(
            handshake.claim(Some("u1")),
            Some(OutboundFrame::Authenticate {
                user_id: "u1".to_string()
            })
        );
        assert!(handshake.is_authenticated());
        assert_eq!(handshake.claim(Some("u1")), None);
    }

    #[test]
    fn test_no_claim_without_identity_or_epoch() {
        let mut handshake = AuthenticationHandshake::new();
        assert_eq!(handshake.claim(Some("u1")), None);

        handshake.begin_epoch(Epoch(1));
        assert_eq!(handshake.claim(None), None);
        assert!(!handshake.is_authenticated());

        // Identity arriving later still gets its claim
        assert!(handshake.claim(Some("u1")).is_some());
    }

    #[test]
    fn test_new_epoch_starts_unauthenticated() {
        let mut handshake = AuthenticationHandshake::new();
        handshake.begin_epoch(Epoch(1));
        handshake.claim(Some("u1"));
        handshake.acknowledge();
        assert_eq!(handshake.phase(), HandshakePhase::Acknowledged);

        handshake.begin_epoch(Epoch(2));
        assert!(!handshake.is_authenticated());
        assert_eq!(handshake.epoch(), Some(Epoch(2)));
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let mut handshake = AuthenticationHandshake::new();
        handshake.begin_epoch(Epoch(1));
        handshake.claim(Some("u1"));

        assert!(handshake.acknowledge());
        assert!(!handshake.acknowledge());
        assert!(handshake.is_authenticated());
    }

    #[test]
    fn test_unsolicited_ack_blocks_later_claim() {
        let mut handshake = AuthenticationHandshake::new();
        handshake.begin_epoch(Epoch(1));
        assert!(handshake.acknowledge());
        assert_eq!(handshake.claim(Some("u1")), None);
    }
}
