//! # Per-source handler list with reentrancy-safe delivery.
//!
//! [`HandlerList`] is the ordered collection of weak subscription slots for
//! one source. It is the piece that makes in-callback subscription changes
//! safe: a handler running inside a delivery may add or remove handlers on
//! the very source being delivered.
//!
//! ## Rules
//! - While the in-flight delivery counter is above zero the list is
//!   *delivery-active* and must not be mutated in place. The owning registry
//!   mutates an active-only clone instead and publishes it with a single map
//!   upsert; this list object stays frozen for its in-flight readers.
//! - The counter is incremented under the registry's map lock and released
//!   by [`DeliveryGuard`] on every exit path, including a panic unwinding
//!   out of a handler.
//! - [`HandlerList::deliver`] walks a snapshot in insertion order and never
//!   removes entries; it only reports whether stale ones were seen. Removal
//!   happens later, outside the active-delivery window, via
//!   [`HandlerList::purge`] or clone-compaction.
//!
//! ## Delivery vs mutation
//! ```text
//!   deliver_event                 add/remove (same source, any thread)
//!        │                               │
//!   lock map ── counter += 1        lock map ── counter > 0 ?
//!        │        (guard)                │            │
//!   snapshot handles                in place      clone active
//!        │                               │        handles, upsert
//!   unlock, invoke in order              ▼            ▼
//!        │                          this list     fresh list
//!   guard drop ── counter -= 1      (counter 0)   (next deliveries)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::events::{EventHandler, EventKind, SourceRef};
use crate::registry::handle::WeakHandle;

/// Ordered weak handler list for a single source.
pub(crate) struct HandlerList<E: EventKind> {
    /// The source this list is attached to; used to detect a dead previous
    /// occupant when an address is reused.
    source: Weak<dyn std::any::Any + Send + Sync>,
    handles: Mutex<Vec<WeakHandle<E>>>,
    /// In-flight deliveries. Incremented under the registry map lock, so a
    /// mutator holding that lock can never race a list going active.
    deliveries: AtomicUsize,
}

impl<E: EventKind> HandlerList<E> {
    pub(crate) fn new(source: &SourceRef) -> Self {
        Self {
            source: Arc::downgrade(source),
            handles: Mutex::new(Vec::new()),
            deliveries: AtomicUsize::new(0),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// True while at least one delivery is in flight on this list object.
    pub(crate) fn delivery_active(&self) -> bool {
        self.deliveries.load(Ordering::Acquire) > 0
    }

    /// True while the attached source still resolves.
    pub(crate) fn source_alive(&self) -> bool {
        self.source.strong_count() > 0
    }

    /// Appends a registration. Duplicates are allowed: registering the same
    /// (source, handler) pair twice yields two invocations per delivery.
    pub(crate) fn add(&self, source: &SourceRef, handler: &EventHandler<E>) {
        self.handles.lock().push(WeakHandle::new(source, handler));
    }

    /// Removes the first entry matching `handler` on `source_key`; returns
    /// whether a removal occurred. Removing a never-added handler is a
    /// silent no-op.
    pub(crate) fn remove(&self, source_key: usize, handler: &EventHandler<E>) -> bool {
        let mut handles = self.handles.lock();
        match handles.iter().position(|h| h.matches(source_key, handler)) {
            Some(index) => {
                handles.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns a new idle list holding only the currently active handles, in
    /// order. Used for copy-on-write while delivery-active and for cheap
    /// compaction.
    pub(crate) fn clone_active(&self) -> Self {
        let handles: Vec<WeakHandle<E>> = self
            .handles
            .lock()
            .iter()
            .filter(|h| h.is_active())
            .cloned()
            .collect();
        Self {
            source: Weak::clone(&self.source),
            handles: Mutex::new(handles),
            deliveries: AtomicUsize::new(0),
        }
    }

    /// Invokes every active handle in insertion order with `(sender, args)`
    /// and returns whether stale entries were encountered.
    ///
    /// Iterates a snapshot, so reentrant structural changes made by a
    /// handler land on a clone and are only visible to later deliveries. A
    /// panicking handler aborts the rest of the pass and propagates.
    pub(crate) fn deliver(&self, sender: &SourceRef, args: &E::Args) -> bool {
        let snapshot: Vec<WeakHandle<E>> = self.handles.lock().clone();

        let mut has_stale = false;
        for handle in &snapshot {
            match handle.resolve() {
                Some(callback) => callback(sender, args),
                None => has_stale = true,
            }
        }
        has_stale
    }

    /// Drops all inactive handles in place.
    ///
    /// Only legal while no delivery is in flight; the registry clones
    /// instead of purging when the list is delivery-active.
    pub(crate) fn purge(&self) {
        debug_assert!(!self.delivery_active());
        self.handles.lock().retain(WeakHandle::is_active);
    }
}

/// RAII marker for an in-flight delivery.
///
/// Dropping the guard decrements the list's delivery counter; the drop runs
/// on unwind too, so a handler panic cannot leak the active state.
pub(crate) struct DeliveryGuard<E: EventKind> {
    list: Arc<HandlerList<E>>,
}

impl<E: EventKind> DeliveryGuard<E> {
    /// Marks a delivery in flight on `list`; the guard releases the marker
    /// when dropped, panics included.
    pub(crate) fn begin(list: &Arc<HandlerList<E>>) -> Self {
        list.deliveries.fetch_add(1, Ordering::AcqRel);
        Self {
            list: Arc::clone(list),
        }
    }
}

impl<E: EventKind> Drop for DeliveryGuard<E> {
    fn drop(&mut self) {
        self.list.deliveries.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::source_key;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::AtomicUsize;

    struct Ping;

    impl EventKind for Ping {
        type Args = ();
    }

    fn source() -> (Arc<String>, SourceRef) {
        let strong = Arc::new("src".to_string());
        let erased: SourceRef = Arc::clone(&strong) as SourceRef;
        (strong, erased)
    }

    fn counting_handler(hits: &Arc<AtomicUsize>) -> EventHandler<Ping> {
        EventHandler::bound(hits, |hits, _, _| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_deliver_in_insertion_order() {
        let (_strong, src) = source();
        let order = Arc::new(Mutex::new(Vec::new()));
        let list = HandlerList::<Ping>::new(&src);

        let handlers: Vec<EventHandler<Ping>> = (0..3)
            .map(|i| {
                EventHandler::bound(&order, move |order, _, _| {
                    order.lock().push(i);
                })
            })
            .collect();
        for h in &handlers {
            list.add(&src, h);
        }

        let stale = list.deliver(&src, &());
        assert!(!stale);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_deliver_reports_stale_without_removing() {
        let (_strong, src) = source();
        let list = HandlerList::<Ping>::new(&src);

        let receiver = Arc::new(AtomicUsize::new(0));
        list.add(&src, &counting_handler(&receiver));
        drop(receiver);

        assert!(list.deliver(&src, &()));
        // stale entries are reported, never removed mid-delivery
        assert_eq!(list.len(), 1);

        list.purge();
        assert!(list.is_empty());
    }

    #[test]
    fn test_clone_active_filters_stale() {
        let (_strong, src) = source();
        let list = HandlerList::<Ping>::new(&src);

        let dead = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicUsize::new(0));
        let dead_handler = counting_handler(&dead);
        let live_handler = counting_handler(&live);
        list.add(&src, &dead_handler);
        list.add(&src, &live_handler);
        drop(dead);

        let clone = list.clone_active();
        assert_eq!(clone.len(), 1);
        assert_eq!(list.len(), 2);
        assert!(!clone.delivery_active());
    }

    #[test]
    fn test_remove_first_match_only() {
        let (_strong, src) = source();
        let key = source_key(&src);
        let list = HandlerList::<Ping>::new(&src);

        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&hits);
        list.add(&src, &handler);
        list.add(&src, &handler);

        assert!(list.remove(key, &handler));
        assert_eq!(list.len(), 1);
        assert!(list.remove(key, &handler));
        assert!(!list.remove(key, &handler));
    }

    #[test]
    fn test_delivery_guard_releases_on_panic() {
        let (_strong, src) = source();
        let list = Arc::new(HandlerList::<Ping>::new(&src));
        let faulty = EventHandler::new(|_, _| panic!("listener fault"));
        list.add(&src, &faulty);

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = DeliveryGuard::begin(&list);
            list.deliver(&src, &());
        }));
        assert!(result.is_err());
        assert!(!list.delivery_active());
    }

    #[test]
    fn test_nested_deliveries_overlap() {
        let (_strong, src) = source();
        let list = Arc::new(HandlerList::<Ping>::new(&src));

        let outer = DeliveryGuard::begin(&list);
        let inner = DeliveryGuard::begin(&list);
        assert!(list.delivery_active());
        drop(inner);
        assert!(list.delivery_active());
        drop(outer);
        assert!(!list.delivery_active());
    }
}
