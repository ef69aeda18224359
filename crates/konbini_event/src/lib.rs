//! # konbini_event - Change Signals
//!
//! Synchronous observer plumbing for the item engine:
//! - Typed signals with any number of subscribers
//! - Subscriber ids for detaching handlers
//! - Invalidation flags for coalescing redraws within a frame
//!
//! Signals deliver in-line: `emit` runs every attached handler before it
//! returns, in subscription order. There is no queue and no priority.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Event handler function type
pub type EventHandler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Subscriber ID
///
/// Ids are unique across every signal in the process, so detaching from the
/// wrong signal never removes somebody else's handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// A single-type signal that handlers subscribe to
pub struct Signal<E: Event> {
    handlers: Vec<(SubscriberId, EventHandler<E>)>,
}

impl<E: Event> Signal<E> {
    /// Create a signal with no subscribers
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Attach a handler
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId::next();
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Detach a handler. Returns `false` if it was not attached.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _)| *sub_id != id);
        before != self.handlers.len()
    }

    /// Deliver an event to every handler, in subscription order
    pub fn emit(&self, event: &E) {
        if self.handlers.is_empty() {
            return;
        }
        log::trace!(
            "Emitting {} to {} subscriber(s)",
            std::any::type_name::<E>(),
            self.handlers.len()
        );
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    /// Check whether a handler is attached
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.handlers.iter().any(|(sub_id, _)| *sub_id == id)
    }

    /// Number of attached handlers
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler is attached
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Detach every handler
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<E: Event> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("event", &std::any::type_name::<E>())
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

/// Shared dirty bit for batch-invalidate-then-rebuild rendering
///
/// Clones share the same bit. A fresh flag starts dirty so the first frame
/// always builds.
#[derive(Clone, Debug)]
pub struct InvalidationFlag {
    dirty: Arc<AtomicBool>,
}

impl InvalidationFlag {
    /// Create a flag that starts dirty
    pub fn new() -> Self {
        Self {
            dirty: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a flag that starts clean
    pub fn clean() -> Self {
        Self {
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark dirty
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Check without clearing
    pub fn is_invalidated(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was dirty
    pub fn take(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

impl Default for InvalidationFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventHandler, InvalidationFlag, Signal, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct TestEvent(i32);

    #[test]
    fn test_signal_delivers_synchronously() {
        let mut signal = Signal::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        signal.subscribe(move |e: &TestEvent| {
            counter_clone.fetch_add(e.0 as u32, Ordering::SeqCst);
        });

        signal.emit(&TestEvent(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        signal.emit(&TestEvent(3));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_subscription_order() {
        let mut signal = Signal::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();

        signal.subscribe(move |e: &TestEvent| order1.lock().push(("first", e.0)));
        signal.subscribe(move |e: &TestEvent| order2.lock().push(("second", e.0)));

        signal.emit(&TestEvent(42));

        let received = order.lock();
        assert_eq!(*received, vec![("first", 42), ("second", 42)]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut signal = Signal::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = signal.subscribe(move |_: &TestEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(signal.is_subscribed(id));

        assert!(signal.unsubscribe(id));
        // Detaching something not attached is a no-op
        assert!(!signal.unsubscribe(id));
        assert!(!signal.unsubscribe(SubscriberId(u64::MAX)));

        signal.emit(&TestEvent(1));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(signal.is_empty());
    }

    #[test]
    fn test_subscriber_ids_are_unique_across_signals() {
        let mut a: Signal<TestEvent> = Signal::new();
        let mut b: Signal<TestEvent> = Signal::new();
        let id_a = a.subscribe(|_| {});
        let id_b = b.subscribe(|_| {});
        assert_ne!(id_a, id_b);
        assert!(!b.unsubscribe(id_a));
        assert_eq!(b.subscriber_count(), 1);
    }

    #[test]
    fn test_invalidation_flag() {
        let flag = InvalidationFlag::new();
        let shared = flag.clone();

        assert!(flag.take());
        assert!(!flag.take());

        shared.invalidate();
        shared.invalidate();
        assert!(flag.is_invalidated());
        // Repeated invalidations coalesce into one rebuild
        assert!(flag.take());
        assert!(!flag.take());

        assert!(!InvalidationFlag::clean().is_invalidated());
    }
}
