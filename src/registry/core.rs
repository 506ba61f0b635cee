//! # Per-kind registry engine.
//!
//! [`EventRegistry`] owns the two weak-keyed tables for one notification
//! kind and implements the add/remove/deliver/purge protocol:
//!
//! - **sources**: source identity → [`HandlerList`]. The registry never
//!   holds a source strongly; each list remembers its source weakly so a
//!   reused address with a dead previous occupant is detected and replaced
//!   with a fresh attach.
//! - **receivers**: receiver identity → strongly retained callables. A
//!   registered callable is otherwise only weakly reachable (from inside
//!   the handler list), so without this table it would die immediately;
//!   with it, it lives exactly as long as its receiver. Entries are pruned
//!   opportunistically once their receiver is gone.
//!
//! ## Rules
//! - Structural decisions (mutate in place vs clone-and-upsert) happen
//!   under the map lock; in-flight delivery counters are incremented under
//!   that same lock, so the two can never race.
//! - No lock is held while a handler callback runs. Reentrant add/remove/
//!   deliver calls from inside a callback reacquire the locks fresh.
//! - [`EventKind::start_listening`] / [`EventKind::stop_listening`] fire
//!   exactly once per attach/detach transition, outside the map lock.

use std::any::type_name;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::events::{source_key, Callback, EventHandler, EventKind, SourceRef};
use crate::registry::list::{DeliveryGuard, HandlerList};

/// Callables pinned on behalf of one receiver object.
struct Retained<E: EventKind> {
    receiver: Weak<dyn std::any::Any + Send + Sync>,
    callbacks: Vec<Arc<Callback<E>>>,
}

/// Registry engine for a single notification kind.
pub(crate) struct EventRegistry<E: EventKind> {
    sources: Mutex<HashMap<usize, Arc<HandlerList<E>>>>,
    receivers: Mutex<HashMap<usize, Retained<E>>>,
}

impl<E: EventKind> EventRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            sources: Mutex::new(HashMap::new()),
            receivers: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `handler` on `source`, attaching to the source on its
    /// first registration, and finishes with an opportunistic purge.
    pub(crate) fn add(&self, source: &SourceRef, handler: &EventHandler<E>) {
        let key = source_key(source);
        let mut attached = false;
        {
            let mut sources = self.sources.lock();
            match sources.entry(key) {
                Entry::Occupied(mut slot) => {
                    let list = slot.get();
                    if !list.source_alive() {
                        // address reuse: the previous occupant died with
                        // entries left behind; this is a fresh attach
                        let fresh = Arc::new(HandlerList::new(source));
                        fresh.add(source, handler);
                        slot.insert(fresh);
                        attached = true;
                    } else if list.delivery_active() {
                        tracing::trace!(
                            kind = type_name::<E>(),
                            source = key,
                            "clone-on-write: add during delivery"
                        );
                        let clone = Arc::new(list.clone_active());
                        clone.add(source, handler);
                        slot.insert(clone);
                    } else {
                        list.add(source, handler);
                    }
                }
                Entry::Vacant(slot) => {
                    let list = Arc::new(HandlerList::new(source));
                    list.add(source, handler);
                    slot.insert(list);
                    attached = true;
                }
            }
        }
        if attached {
            tracing::debug!(kind = type_name::<E>(), source = key, "attached to source");
            E::start_listening(source);
        }

        self.retain(handler);
        self.purge_key(key, source);
    }

    /// Removes the first registration matching `handler` on `source`; a
    /// miss is a silent no-op. Detaches from the source when its last
    /// handler goes away.
    pub(crate) fn remove(&self, source: &SourceRef, handler: &EventHandler<E>) {
        let key = source_key(source);
        let mut detached = false;
        {
            let mut sources = self.sources.lock();
            if let Some(list) = sources.get(&key).map(Arc::clone) {
                let list = if list.delivery_active() {
                    tracing::trace!(
                        kind = type_name::<E>(),
                        source = key,
                        "clone-on-write: remove during delivery"
                    );
                    let clone = Arc::new(list.clone_active());
                    sources.insert(key, Arc::clone(&clone));
                    clone
                } else {
                    list
                };
                if list.remove(key, handler) && list.is_empty() {
                    sources.remove(&key);
                    detached = true;
                }
            }
        }
        if detached {
            tracing::debug!(kind = type_name::<E>(), source = key, "detached from source");
            E::stop_listening(source);
        }

        self.release(handler);
    }

    /// Delivers `(sender, args)` to every handler registered on `sender`,
    /// in registration order. A sender with no handlers is a no-op.
    ///
    /// A panicking handler propagates to the caller; the delivery marker is
    /// released during unwind and the deferred purge is skipped.
    pub(crate) fn deliver(&self, sender: &SourceRef, args: &E::Args) {
        let key = source_key(sender);
        let in_flight = {
            let sources = self.sources.lock();
            sources
                .get(&key)
                .map(|list| (Arc::clone(list), DeliveryGuard::begin(list)))
        };
        let Some((list, guard)) = in_flight else {
            return;
        };

        let has_stale = list.deliver(sender, args);
        drop(guard);

        if has_stale {
            tracing::trace!(
                kind = type_name::<E>(),
                source = key,
                "stale entries seen during delivery"
            );
            self.purge_key(key, sender);
        }
    }

    /// Compacts the source's handler list: an active-only clone while
    /// delivery is in flight, an in-place purge otherwise.
    pub(crate) fn purge(&self, source: &SourceRef) {
        self.purge_key(source_key(source), source);
    }

    fn purge_key(&self, key: usize, source: &SourceRef) {
        let mut detached = false;
        {
            let mut sources = self.sources.lock();
            if let Some(list) = sources.get(&key).map(Arc::clone) {
                if list.delivery_active() {
                    sources.insert(key, Arc::new(list.clone_active()));
                } else {
                    list.purge();
                    if list.is_empty() {
                        sources.remove(&key);
                        // a dead source's leftover list detaches silently;
                        // there is nothing to stop listening on
                        detached = list.source_alive();
                    }
                }
            }
        }
        if detached {
            tracing::debug!(
                kind = type_name::<E>(),
                source = key,
                "detached from source (purged empty)"
            );
            E::stop_listening(source);
        }
        self.prune_receivers();
    }

    // ---------------------------
    // Receiver retention
    // ---------------------------

    /// Pins the handler's callable for as long as its receiver lives.
    fn retain(&self, handler: &EventHandler<E>) {
        let mut receivers = self.receivers.lock();
        match receivers.entry(handler.receiver_key()) {
            Entry::Occupied(mut slot) if slot.get().receiver.strong_count() == 0 => {
                // address reuse: previous receiver died; start over
                slot.insert(Retained {
                    receiver: handler.receiver(),
                    callbacks: vec![Arc::clone(handler.callback())],
                });
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().callbacks.push(Arc::clone(handler.callback()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Retained {
                    receiver: handler.receiver(),
                    callbacks: vec![Arc::clone(handler.callback())],
                });
            }
        }
    }

    /// Releases one pinned copy of the handler's callable, dropping the
    /// receiver's entry when it empties.
    fn release(&self, handler: &EventHandler<E>) {
        let mut receivers = self.receivers.lock();
        if let Entry::Occupied(mut slot) = receivers.entry(handler.receiver_key()) {
            let callbacks = &mut slot.get_mut().callbacks;
            if let Some(index) = callbacks
                .iter()
                .position(|cb| Arc::as_ptr(cb).cast::<()>() as usize == handler.callback_key())
            {
                callbacks.remove(index);
            }
            if callbacks.is_empty() {
                slot.remove();
            }
        }
        drop(receivers);
        self.prune_receivers();
    }

    /// Drops retention entries whose receiver is gone.
    fn prune_receivers(&self) {
        self.receivers
            .lock()
            .retain(|_, retained| retained.receiver.strong_count() > 0);
    }

    #[cfg(test)]
    pub(crate) fn source_count(&self) -> usize {
        self.sources.lock().len()
    }

    #[cfg(test)]
    pub(crate) fn retained_receiver_count(&self) -> usize {
        self.receivers.lock().len()
    }
}
