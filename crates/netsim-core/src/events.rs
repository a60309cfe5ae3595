//! Event publisher: fan-out of topology/state-change notifications to subscribers.
//!
//! The graph store computes an event's payload while holding its write lock, drops the lock,
//! and only then calls [`Publisher::publish`] — a subscriber must never be able to call back
//! into the store while its write lock is held.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// The kinds of events the store and simulator emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    NodeFailed,
    NodeRecovered,
    NodeUpdated,
    LinkAdded,
    LinkRemoved,
    PacketSent,
    TopologyChanged,
    StatisticsUpdate,
}

/// A single notification on the wire: `{"type": ..., "timestamp": ..., "data": {...}}`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: u64,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            kind,
            timestamp,
            data,
        }
    }
}

/// A subscriber to the event publisher. Implementations decide their own buffering/dropping
/// policy; `notify` must never block for long or panic.
pub trait Subscriber: Send + Sync {
    fn notify(&self, event: &Event);
}

/// A subscriber id, returned on registration so the caller can later unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Wraps a bounded [`crossbeam_channel::Sender`]; drops the event if the channel is full rather
/// than block the publisher. Stands in for the live push channel to external listeners — the
/// actual WebSocket transport on the other end is out of scope here.
pub struct ChannelSubscriber {
    tx: crossbeam_channel::Sender<Event>,
}

impl ChannelSubscriber {
    /// Creates a bounded channel of the given capacity and returns the subscriber half along
    /// with the receiver the caller uses to drain events.
    pub fn bounded(capacity: usize) -> (Self, crossbeam_channel::Receiver<Event>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn notify(&self, event: &Event) {
        if self.tx.try_send(event.clone()).is_err() {
            tracing::debug!(kind = ?event.kind, "dropping event: subscriber channel full");
        }
    }
}

/// Collects every event it receives in memory. Used by the scenario engine to collect traces,
/// and in tests that assert on emitted events.
#[derive(Default)]
pub struct InMemorySubscriber {
    events: Mutex<Vec<Event>>,
}

impl InMemorySubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log mutex poisoned").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event log mutex poisoned").clear();
    }
}

impl Subscriber for InMemorySubscriber {
    fn notify(&self, event: &Event) {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .push(event.clone());
    }
}

/// Fans a single published event out to every registered subscriber, in registration order.
/// Registration and removal are thread-safe; publishing never blocks on a slow subscriber
/// because each `Subscriber` impl owns its own buffering/dropping policy.
#[derive(Default)]
pub struct Publisher {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriberId, Arc<dyn Subscriber>)>>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field(
                "subscriber_count",
                &self.subscribers.read().map(|s| s.len()).unwrap_or(0),
            )
            .finish()
    }
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .expect("publisher subscriber list poisoned")
            .push((id, subscriber));
        id
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .write()
            .expect("publisher subscriber list poisoned")
            .retain(|(sid, _)| *sid != id);
    }

    /// Delivers `event` to every current subscriber, in registration order. Must be called with
    /// no store lock held by the caller.
    pub fn publish(&self, event: Event) {
        let subscribers = self
            .subscribers
            .read()
            .expect("publisher subscriber list poisoned");
        for (_, subscriber) in subscribers.iter() {
            subscriber.notify(&event);
        }
    }
}
