//! Host lifecycle around a [`ConnectionManager`]
//!
//! The provider mounts once the authentication collaborator has finished
//! loading, tears the connection down and rebuilds it whenever the session
//! identity changes, and unmounts on request. A socket is never left bound
//! to a stale identity.

use crate::core::connection::ConnectionManager;
use crate::traits::*;
use tracing::{debug, info};

pub struct RealtimeProvider<F, S>
where
    F: TransportFactory,
    S: Scheduler,
{
    manager: ConnectionManager<F, S>,
    mounted: bool,
    identity: Option<String>,
}

impl<F, S> RealtimeProvider<F, S>
where
    F: TransportFactory,
    S: Scheduler,
{
    pub fn new(manager: ConnectionManager<F, S>) -> Self {
        Self {
            manager,
            mounted: false,
            identity: None,
        }
    }

    /// Apply a new snapshot from the authentication collaborator
    ///
    /// - still loading: nothing happens
    /// - first settled snapshot: mount and connect
    /// - identity changed since mount: full teardown, then reconnect
    ///
    /// Afterwards the identity claim is reconciled against the open epoch.
    pub fn apply_auth(&mut self, auth: &AuthState) {
        if auth.loading {
            debug!("Authentication still loading; deferring connection");
            return;
        }

        let identity = auth.user_id().map(str::to_owned);
        if !self.mounted {
            self.mount(identity);
        } else if identity != self.identity {
            info!("Session identity changed; restarting connection");
            self.manager.disconnect();
            self.manager.set_user(identity.clone());
            self.identity = identity;
            self.manager.connect();
        }

        self.manager.reconcile_authentication();
    }

    fn mount(&mut self, identity: Option<String>) {
        debug!("Mounting realtime provider");
        self.manager.set_user(identity.clone());
        self.identity = identity;
        self.mounted = true;
        self.manager.connect();
    }

    /// Tear the connection down. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        debug!("Unmounting realtime provider");
        self.manager.disconnect();
        self.mounted = false;
    }

    pub fn handle_transport_event(&mut self, epoch: Epoch, event: TransportEvent) {
        self.manager.handle_transport_event(epoch, event);
        self.manager.reconcile_authentication();
    }

    pub fn handle_timer(&mut self, id: TimerId, kind: TimerKind) {
        self.manager.handle_timer(id, kind);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn manager(&self) -> &ConnectionManager<F, S> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager<F, S> {
        &mut self.manager
    }
}
