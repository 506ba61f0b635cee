//! # Weak subscription slots.
//!
//! A [`WeakHandle`] is one entry of a source's handler list: weak references
//! to the source, the callable and the receiver, plus the identity keys used
//! for matching. Handles are immutable after construction; liveness and
//! matching are pure predicates.
//!
//! Nothing here keeps anything alive. The callable's strong reference lives
//! in the registry's retention table (keyed by receiver identity) or in
//! clones of the originating [`EventHandler`]; sources and receivers are
//! owned entirely by the caller.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::events::{source_key, Callback, EventHandler, EventKind, SourceRef};

/// One weak (source, handler) pair in a handler list.
pub(crate) struct WeakHandle<E: EventKind> {
    source: Weak<dyn Any + Send + Sync>,
    source_key: usize,
    callback: Weak<Callback<E>>,
    receiver: Weak<dyn Any + Send + Sync>,
    receiver_key: usize,
    property_bound: bool,
}

impl<E: EventKind> Clone for WeakHandle<E> {
    fn clone(&self) -> Self {
        Self {
            source: Weak::clone(&self.source),
            source_key: self.source_key,
            callback: Weak::clone(&self.callback),
            receiver: Weak::clone(&self.receiver),
            receiver_key: self.receiver_key,
            property_bound: self.property_bound,
        }
    }
}

impl<E: EventKind> WeakHandle<E> {
    pub(crate) fn new(source: &SourceRef, handler: &EventHandler<E>) -> Self {
        Self {
            source: Arc::downgrade(source),
            source_key: source_key(source),
            callback: Arc::downgrade(handler.callback()),
            receiver: handler.receiver(),
            receiver_key: handler.receiver_key(),
            property_bound: handler.is_property_bound(),
        }
    }

    /// True while source, callable and receiver all still resolve.
    pub(crate) fn is_active(&self) -> bool {
        self.source.strong_count() > 0
            && self.callback.strong_count() > 0
            && self.receiver.strong_count() > 0
    }

    /// Resolves the callable, or `None` when any leg of the subscription is
    /// gone (a stale entry).
    pub(crate) fn resolve(&self) -> Option<Arc<Callback<E>>> {
        if self.source.strong_count() == 0 || self.receiver.strong_count() == 0 {
            return None;
        }
        self.callback.upgrade()
    }

    /// True when this handle is the registration of `handler` on the source
    /// identified by `source_key`.
    ///
    /// Identity match on the resolved source and the callable, with one
    /// special case: two property-bound handlers match whenever their live
    /// receivers are the same object, even if the callables differ.
    pub(crate) fn matches(&self, source_key: usize, handler: &EventHandler<E>) -> bool {
        if self.source.strong_count() == 0 || self.source_key != source_key {
            return false;
        }
        let same_callable = self
            .callback
            .upgrade()
            .is_some_and(|cb| Arc::as_ptr(&cb).cast::<()>() as usize == handler.callback_key());
        if same_callable {
            return true;
        }
        self.property_bound
            && handler.is_property_bound()
            && self.receiver.strong_count() > 0
            && self.receiver_key == handler.receiver_key()
    }
}
