//! Singleflight implementation for deduplicating concurrent permission queries.

use dashmap::DashMap;
use tokio::sync::broadcast;

/// Result of trying to acquire a singleflight slot.
pub(crate) enum SingleflightSlot<V> {
    /// We won the race and should execute the operation.
    /// Contains the sender to broadcast the outcome.
    Leader(broadcast::Sender<V>),
    /// Another task is executing; wait for its outcome.
    Follower(broadcast::Receiver<V>),
}

/// Deduplicates concurrent requests by key.
///
/// When multiple requests for the same key arrive concurrently, only one
/// actual call is executed and all requesters share the outcome.
///
/// Uses atomic operations to prevent race conditions between checking for
/// an existing request and registering a new one.
pub(crate) struct Singleflight<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    /// Map of in-flight requests to their broadcast senders.
    in_flight: DashMap<K, broadcast::Sender<V>>,
}

impl<K, V> Singleflight<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Atomically try to acquire a slot for this key.
    ///
    /// Returns `Leader` if this caller should execute the operation, or
    /// `Follower` if another caller is already executing it.
    ///
    /// This uses DashMap's entry API for atomic check-and-insert,
    /// preventing race conditions between lookup and registration.
    pub fn acquire(&self, key: K) -> SingleflightSlot<V> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(key) {
            Entry::Occupied(entry) => SingleflightSlot::Follower(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx.clone());
                SingleflightSlot::Leader(tx)
            }
        }
    }

    /// Remove a completed in-flight request.
    pub fn complete(&self, key: &K) {
        self.in_flight.remove(key);
    }
}

/// RAII guard that ensures singleflight cleanup on drop.
///
/// Without it, a panicking leader would strand followers on a key that can
/// never complete.
pub(crate) struct SingleflightGuard<'a, K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    singleflight: &'a Singleflight<K, V>,
    key: K,
    completed: bool,
}

impl<'a, K, V> SingleflightGuard<'a, K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(singleflight: &'a Singleflight<K, V>, key: K) -> Self {
        Self {
            singleflight,
            key,
            completed: false,
        }
    }

    /// Mark as completed (normal path, not panic).
    pub fn complete(mut self) {
        self.singleflight.complete(&self.key);
        self.completed = true;
    }
}

impl<K, V> Drop for SingleflightGuard<'_, K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if !self.completed {
            self.singleflight.complete(&self.key);
        }
    }
}
