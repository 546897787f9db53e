//! Routes change events to global and per-token subscriber sets.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tokenwatch_types::Event;
use tokio::sync::mpsc;

/// Opaque connection identity, owned by the (out-of-scope) transport layer.
pub type ConnectionId = u64;

struct Subscriber {
    addresses: HashSet<String>,
    /// Receives every `batch_update` and alert event, regardless of subscription.
    global: mpsc::Sender<Event>,
    /// Receives a second, targeted copy of any alert whose address is in `addresses`.
    per_token: mpsc::Sender<Event>,
}

/// Holds the `subscribers` map described in §4.8: connection-id to its
/// per-token subscription set, plus the channels used to deliver to it.
///
/// Delivery is best-effort, at-most-once, and fire-and-forget: a full or
/// closed channel is silently dropped rather than propagated, matching the
/// contract that a slow subscriber never blocks others.
pub struct Broadcaster {
    subscribers: Mutex<HashMap<ConnectionId, Subscriber>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new connection with an empty subscription set. Never fails.
    ///
    /// `global` carries every event; `per_token` carries the extra targeted
    /// copy of alerts the connection has subscribed to.
    pub fn on_connect(&self, id: ConnectionId, global: mpsc::Sender<Event>, per_token: mpsc::Sender<Event>) {
        self.subscribers.lock().expect("poisoned").insert(
            id,
            Subscriber {
                addresses: HashSet::new(),
                global,
                per_token,
            },
        );
    }

    /// Add lowercased addresses to `id`'s subscription set.
    pub fn subscribe(&self, id: ConnectionId, addresses: impl IntoIterator<Item = String>) {
        if let Some(sub) = self.subscribers.lock().expect("poisoned").get_mut(&id) {
            sub.addresses
                .extend(addresses.into_iter().map(|a| a.to_lowercase()));
        }
    }

    /// Remove addresses from `id`'s subscription set.
    pub fn unsubscribe(&self, id: ConnectionId, addresses: impl IntoIterator<Item = String>) {
        if let Some(sub) = self.subscribers.lock().expect("poisoned").get_mut(&id) {
            for address in addresses {
                sub.addresses.remove(&address.to_lowercase());
            }
        }
    }

    /// Remove `id` and its subscription set entirely.
    pub fn on_disconnect(&self, id: ConnectionId) {
        self.subscribers.lock().expect("poisoned").remove(&id);
    }

    /// Deliver every event in `batch` to all connected subscribers over the
    /// global channel. For events that carry an address (the alert kinds),
    /// additionally deliver a second copy over the per-token channel of any
    /// subscriber whose set contains that address.
    pub fn broadcast(&self, batch: &[Event]) {
        let subscribers = self.subscribers.lock().expect("poisoned");
        for event in batch {
            let address = event.payload.address().map(str::to_lowercase);
            for sub in subscribers.values() {
                let _ = sub.global.try_send(event.clone());
                if let Some(addr) = address.as_deref() {
                    if sub.addresses.contains(addr) {
                        let _ = sub.per_token.try_send(event.clone());
                    }
                }
            }
        }
    }

    /// Number of currently connected subscribers.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.subscribers.lock().expect("poisoned").len()
    }
}
