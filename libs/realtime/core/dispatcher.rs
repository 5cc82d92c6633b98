//! Event fan-out
//!
//! Maps each [`EventKind`] to an ordered list of subscriber callbacks.
//! Callbacks run on the event loop in registration order. The registry lock
//! is released before any callback runs, so a callback may subscribe or
//! unsubscribe (itself included) without deadlocking; such changes take
//! effect from the next dispatch. Stream subscribers whose receiver has
//! been dropped are pruned after the dispatch that finds them closed.

use crate::core::frame::EventKind;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Subscriber callback; receives the event's `data` payload
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

type SubscriberId = u64;

#[derive(Clone)]
enum Subscriber {
    Callback(EventCallback),
    Stream(Sender<Value>),
}

#[derive(Default)]
struct Registry {
    next_id: SubscriberId,
    subscribers: HashMap<EventKind, Vec<(SubscriberId, Subscriber)>>,
}

impl Registry {
    fn insert(&mut self, kind: EventKind, subscriber: Subscriber) -> SubscriberId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.entry(kind).or_default().push((id, subscriber));
        id
    }

    /// Returns `true` if any of `ids` was registered
    fn remove(&mut self, kind: EventKind, ids: &[SubscriberId]) -> bool {
        let Some(list) = self.subscribers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| !ids.contains(id));
        let removed = list.len() != before;
        if list.is_empty() {
            self.subscribers.remove(&kind);
        }
        removed
    }
}

/// Registry of event subscribers
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Arc<RwLock<Registry>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `kind`
    ///
    /// The same closure may be registered more than once; each registration
    /// gets its own [`Subscription`] and is invoked separately.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(kind, Subscriber::Callback(Arc::new(callback)))
    }

    fn register(&self, kind: EventKind, subscriber: Subscriber) -> Subscription {
        let id = self.registry.write().insert(kind, subscriber);
        debug!("Subscribed to {} (subscriber {})", kind, id);

        Subscription {
            kind,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a channel-backed subscriber
    ///
    /// Every dispatched payload for `kind` is cloned into the returned
    /// receiver. Unsubscribing stops delivery; dropping the receiver removes
    /// the subscription on the next dispatch for `kind`.
    pub fn subscribe_stream(&self, kind: EventKind) -> (Subscription, Receiver<Value>) {
        let (tx, rx) = unbounded();
        (self.register(kind, Subscriber::Stream(tx)), rx)
    }

    /// Invoke every callback registered for `kind`, in registration order
    ///
    /// Returns the number of subscribers reached.
    pub fn dispatch(&self, kind: EventKind, data: &Value) -> usize {
        let subscribers: Vec<(SubscriberId, Subscriber)> = self
            .registry
            .read()
            .subscribers
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        trace!("Dispatching {} to {} subscribers", kind, subscribers.len());
        let mut closed = Vec::new();
        for (id, subscriber) in &subscribers {
            match subscriber {
                Subscriber::Callback(callback) => callback(data),
                Subscriber::Stream(tx) => {
                    if tx.send(data.clone()).is_err() {
                        closed.push(*id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            self.registry.write().remove(kind, &closed);
            debug!("Pruned {} closed {} streams", closed.len(), kind);
        }
        subscribers.len() - closed.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .subscribers
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

/// Handle returned by [`EventDispatcher::subscribe`]
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    kind: EventKind,
    id: SubscriberId,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove this subscription's callback. Safe to call more than once.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if registry.write().remove(self.kind, &[self.id]) {
            debug!("Unsubscribed from {} (subscriber {})", self.kind, self.id);
        }
    }
}
