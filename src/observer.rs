//! # Observer Collection
//!
//! Multicast pub/sub keyed by event type. Activities notify remote observers
//! of domain events; delivery is fire-and-forget and one observer's failure
//! never starves the others or fails the notifying call. The collection is a
//! plain in-memory relation in both live and test mode; what differs between
//! modes is only what the attached [`Observer`] references do on delivery.

use crate::id::{ActivityId, ActivityKey};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A reference subscribed to events of type `E` emitted by activities keyed
/// by `K`. In live mode this is a proxy that forwards over the bus; in tests
/// it is usually a local recorder.
pub trait Observer<K: ActivityKey, E>: Send + Sync {
    /// Handle one event from the emitting activity. Errors are contained by
    /// the collection and logged, never surfaced to the emitter.
    fn receive(&self, source: &ActivityId<K>, event: &E) -> anyhow::Result<()>;
}

struct Subscription<K: ActivityKey> {
    /// Reference identity of the attached observer, for idempotent
    /// attach/detach
    token: usize,
    deliver: Box<dyn Fn(&ActivityId<K>, &dyn Any) + Send + Sync>,
}

/// The `(event type, observer)` relation for one activity.
#[derive(Default)]
pub struct ObserverCollection<K: ActivityKey> {
    subscriptions: HashMap<TypeId, Vec<Subscription<K>>>,
}

fn token_of<K: ActivityKey, E>(observer: &Arc<dyn Observer<K, E>>) -> usize {
    Arc::as_ptr(observer) as *const () as usize
}

impl<K: ActivityKey> ObserverCollection<K> {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
        }
    }

    /// Add the relation; attaching the same observer to the same event type
    /// twice is a no-op.
    pub fn attach<E: Any>(&mut self, observer: Arc<dyn Observer<K, E>>) {
        let token = token_of(&observer);
        let subscriptions = self.subscriptions.entry(TypeId::of::<E>()).or_default();
        if subscriptions.iter().any(|s| s.token == token) {
            return;
        }
        let event_type = std::any::type_name::<E>();
        subscriptions.push(Subscription {
            token,
            deliver: Box::new(move |source, event| {
                if let Some(event) = event.downcast_ref::<E>() {
                    if let Err(e) = observer.receive(source, event) {
                        warn!(event_type, source = %source, "observer delivery failed: {:#}", e);
                    }
                }
            }),
        });
    }

    /// Remove the relation; detaching an absent pair is a no-op.
    pub fn detach<E: Any>(&mut self, observer: &Arc<dyn Observer<K, E>>) {
        let token = token_of(observer);
        if let Some(subscriptions) = self.subscriptions.get_mut(&TypeId::of::<E>()) {
            subscriptions.retain(|s| s.token != token);
            if subscriptions.is_empty() {
                self.subscriptions.remove(&TypeId::of::<E>());
            }
        }
    }

    /// Fan the event out to every observer attached for its exact type,
    /// passing the emitting activity's identity alongside the payload. Does
    /// not wait for acknowledgment.
    pub fn notify<E: Any>(&self, source: &ActivityId<K>, event: &E) {
        let Some(subscriptions) = self.subscriptions.get(&TypeId::of::<E>()) else {
            return;
        };
        for subscription in subscriptions {
            (subscription.deliver)(source, event);
        }
    }

    /// How many observers are attached for events of type `E`
    pub fn attached_count<E: Any>(&self) -> usize {
        self.subscriptions
            .get(&TypeId::of::<E>())
            .map_or(0, |s| s.len())
    }
}
