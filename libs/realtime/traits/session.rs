/// The signed-in session as supplied by the authentication collaborator
///
/// Only `id` is read here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

/// Snapshot of the authentication collaborator's output
///
/// The realtime client never mutates this; the host pushes a new snapshot
/// whenever the collaborator changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl AuthState {
    /// The collaborator has not settled yet
    pub fn loading() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }

    /// Settled with a signed-in session
    pub fn signed_in(id: impl Into<String>) -> Self {
        Self {
            session: Some(Session { id: id.into() }),
            loading: false,
        }
    }

    /// Settled with no session
    pub fn signed_out() -> Self {
        Self {
            session: None,
            loading: false,
        }
    }

    /// The session identity, if any
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert!(AuthState::loading().loading);
        assert_eq!(AuthState::loading().user_id(), None);
        assert_eq!(AuthState::signed_in("u1").user_id(), Some("u1"));
        assert!(!AuthState::signed_in("u1").loading);
        assert_eq!(AuthState::signed_out(), AuthState::default());
    }
}
