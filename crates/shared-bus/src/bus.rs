//! # Synchronous Event Bus
//!
//! A typed, in-process fan-out: `emit` calls every registered listener
//! directly, in registration order, before returning. There is no queueing
//! and no background task - callers that need async behavior around an
//! event (spawning a task, awaiting I/O) do that inside their own listener.
//!
//! Listeners are a contract, not a type: they MUST NOT block. The bus does
//! not enforce this (there is no way to, short of a timeout wrapper nobody
//! asked for) - it is a documented expectation, same as the interface it's
//! modeled on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Opaque handle returned by [`EventBus::subscribe`], used to
/// [`EventBus::unsubscribe`] later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A listener is any `Fn(&E)` closure; boxed so the bus can hold a
/// heterogeneous collection of them.
type Listener<E> = dyn Fn(&E) + Send + Sync;

struct Entry<E> {
    id: SubscriptionId,
    listener: Arc<Listener<E>>,
}

/// In-process, synchronous, multi-listener event bus for one event type `E`.
///
/// Typical use: one bus per component (e.g. the mining trigger's
/// orchestrator owns one `EventBus<MtEvent>`), shared via `Arc` with every
/// producer (the proxy handler, the workers) and every consumer (loggers,
/// test harnesses, downstream integrations).
pub struct EventBus<E> {
    listeners: RwLock<Vec<Entry<E>>>,
    next_id: AtomicU64,
    events_emitted: AtomicU64,
}

impl<E> EventBus<E> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Register a listener. Returns a handle that can later be passed to
    /// [`EventBus::unsubscribe`].
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push(Entry {
            id,
            listener: Arc::new(listener),
        });
        id
    }

    /// Remove a previously registered listener. Returns `true` if a
    /// listener with that id was present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Total events emitted over the bus's lifetime.
    #[must_use]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }
}

impl<E: Clone> EventBus<E> {
    /// Fan out `event` to every registered listener, synchronously, in
    /// registration order. Listeners registered or removed concurrently
    /// with an in-flight `emit` are not guaranteed to observe it or be
    /// skipped consistently - the snapshot is taken once at the start.
    pub fn emit(&self, event: E) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
        // Clone the Arc list under the lock, then release it before calling
        // out - a listener that calls back into subscribe/unsubscribe must
        // not deadlock against emit.
        let snapshot: Vec<Arc<Listener<E>>> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect();
        for listener in snapshot {
            listener(&event);
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_no_listeners() {
        let bus: EventBus<u32> = EventBus::new();
        bus.emit(1);
        assert_eq!(bus.events_emitted(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_fan_out_to_all_listeners() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        bus.subscribe(move |e: &u32| seen_a.lock().unwrap().push(("a", *e)));
        let seen_b = Arc::clone(&seen);
        bus.subscribe(move |e: &u32| seen_b.lock().unwrap().push(("b", *e)));

        bus.emit(42);

        let log = seen.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains(&("a", 42)));
        assert!(log.contains(&("b", 42)));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus: EventBus<u32> = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let count_clone = Arc::clone(&count);
        let id = bus.subscribe(move |_: &u32| *count_clone.lock().unwrap() += 1);

        bus.emit(1);
        assert!(bus.unsubscribe(id));
        bus.emit(2);

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_id_is_noop() {
        let bus: EventBus<u32> = EventBus::new();
        let id = bus.subscribe(|_: &u32| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_registration_order_preserved() {
        let bus: EventBus<u32> = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5u32 {
            let order = Arc::clone(&order);
            bus.subscribe(move |_: &u32| order.lock().unwrap().push(i));
        }
        bus.emit(0);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}
