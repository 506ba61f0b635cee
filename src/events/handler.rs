//! # Event handler values.
//!
//! An [`EventHandler`] is the value a listener registers against a source:
//! the callable to invoke, the identity of the *receiver* object that owns
//! it, and a marker controlling how removal matches it.
//!
//! The registry only ever holds the callable weakly. What keeps it alive is
//! the receiver: as long as the receiver object lives, the registry's
//! retention table pins the callable; once the receiver is dropped, the
//! subscription goes inert with no explicit unsubscription required.
//!
//! ## Rules
//! - [`EventHandler::new`] handlers have no receiver of their own; they are
//!   pinned under the process-wide sentinel and live until removed.
//! - [`EventHandler::bound`] handlers upgrade their receiver on every
//!   invocation; a dead receiver makes the invocation a silent no-op.
//! - [`EventHandler::property_bound`] additionally opts into
//!   receiver-identity matching on removal: two property-bound handlers with
//!   the same receiver match each other even when their callables differ
//!   (subscription surfaces often mint a fresh wrapper per call, so the
//!   wrapper address alone cannot identify the subscription).
//! - Cloning an `EventHandler` clones the subscription value, not the
//!   subscription: registering a handler and its clone produces two
//!   independent invocations.

use std::any::Any;
use std::sync::{Arc, Weak};

use crate::events::kind::{static_source, EventKind, SourceRef};

/// Callable invoked with `(sender, args)` on delivery.
pub type Callback<E: EventKind> = dyn Fn(&SourceRef, &E::Args) + Send + Sync;

/// A listener registration value for notification kind `E`.
///
/// See the module docs for the receiver/lifetime rules. Keep a clone of the
/// handler around if you intend to remove it later; removal matches by
/// callable identity (or receiver identity for property-bound handlers).
pub struct EventHandler<E: EventKind> {
    callback: Arc<Callback<E>>,
    receiver: Weak<dyn Any + Send + Sync>,
    receiver_key: usize,
    property_bound: bool,
}

impl<E: EventKind> Clone for EventHandler<E> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            receiver: Weak::clone(&self.receiver),
            receiver_key: self.receiver_key,
            property_bound: self.property_bound,
        }
    }
}

impl<E: EventKind> EventHandler<E> {
    /// Creates a free-standing handler with no receiver of its own.
    ///
    /// The callable is pinned under the process-wide sentinel and stays
    /// registered until explicitly removed.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SourceRef, &E::Args) + Send + Sync + 'static,
    {
        let sentinel = static_source();
        let receiver_key = Arc::as_ptr(&sentinel).cast::<()>() as usize;
        let erased: Arc<dyn Any + Send + Sync> = sentinel;
        let receiver: Weak<dyn Any + Send + Sync> = Arc::downgrade(&erased);
        Self {
            callback: Arc::new(f),
            receiver_key,
            receiver,
            property_bound: false,
        }
    }

    /// Creates a handler owned by `receiver`.
    ///
    /// The callable holds the receiver weakly and is invoked with the
    /// upgraded receiver; once the receiver is dropped the subscription is
    /// inert and will be purged by the next structural operation.
    pub fn bound<T, F>(receiver: &Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &SourceRef, &E::Args) + Send + Sync + 'static,
    {
        Self::bind(receiver, f, false)
    }

    /// Creates a property-change-style handler owned by `receiver`.
    ///
    /// Same invocation behavior as [`EventHandler::bound`], but removal also
    /// matches any other property-bound handler with the same receiver.
    pub fn property_bound<T, F>(receiver: &Arc<T>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &SourceRef, &E::Args) + Send + Sync + 'static,
    {
        Self::bind(receiver, f, true)
    }

    fn bind<T, F>(receiver: &Arc<T>, f: F, property_bound: bool) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &SourceRef, &E::Args) + Send + Sync + 'static,
    {
        let invoke_target = Arc::downgrade(receiver);
        let callback: Arc<Callback<E>> = Arc::new(move |sender, args| {
            if let Some(target) = invoke_target.upgrade() {
                f(target.as_ref(), sender, args);
            }
        });
        let receiver_key = Arc::as_ptr(receiver).cast::<()>() as usize;
        let strong: Arc<T> = Arc::clone(receiver);
        let erased: Arc<dyn Any + Send + Sync> = strong;
        Self {
            callback,
            receiver: Arc::downgrade(&erased),
            receiver_key,
            property_bound,
        }
    }

    /// True when the handler's receiver has already been dropped.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.receiver.strong_count() == 0
    }

    pub(crate) fn callback(&self) -> &Arc<Callback<E>> {
        &self.callback
    }

    pub(crate) fn callback_key(&self) -> usize {
        Arc::as_ptr(&self.callback).cast::<()>() as usize
    }

    pub(crate) fn receiver(&self) -> Weak<dyn Any + Send + Sync> {
        Weak::clone(&self.receiver)
    }

    pub(crate) fn receiver_key(&self) -> usize {
        self.receiver_key
    }

    pub(crate) fn is_property_bound(&self) -> bool {
        self.property_bound
    }
}
