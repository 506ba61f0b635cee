//! # Observable objects: before/after change streams over the registry.
//!
//! [`Observable`] is the base surface for notifying objects: implementors
//! embed a [`ChangeTracker`] and gain, through [`ObservableExt`] on
//! `Arc<T>`, subscribe/unsubscribe for the [`Changing`] (before) and
//! [`Changed`] (after) property streams plus `raise_*` calls that deliver
//! through the registry with the object itself as sender.
//!
//! Suppression and delay are purely gates in front of
//! [`deliver_event`](crate::deliver_event) — the registry itself has no
//! suspended state and never learns that a notification was withheld.
//!
//! ## Rules
//! - While any [`SuppressionGuard`] is live, neither stream is raised;
//!   suppressed notifications are dropped, not queued. Guards nest.
//! - While any [`DelayGuard`] is live, "changed" notices queue in raise
//!   order and flush when the last guard drops; "changing" notices are
//!   dropped (a before-change notice replayed after the change would lie).
//!   Queued notices are not deduplicated.
//! - Dropping the object drops its subscriptions with it: the registry
//!   holds the object weakly, so no unsubscription is required.
//!
//! ## Example
//! ```
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use weakevent::{ChangeTracker, EventHandler, Observable, ObservableExt, PropertyChange};
//!
//! struct Person {
//!     age: AtomicU32,
//!     changes: ChangeTracker,
//! }
//!
//! impl Observable for Person {
//!     fn change_tracker(&self) -> &ChangeTracker {
//!         &self.changes
//!     }
//! }
//!
//! fn set_age(person: &Arc<Person>, age: u32) {
//!     person.raise_changing("age");
//!     person.age.store(age, Ordering::SeqCst);
//!     person.raise_changed("age");
//! }
//!
//! let person = Arc::new(Person {
//!     age: AtomicU32::new(0),
//!     changes: ChangeTracker::new(),
//! });
//!
//! let seen = Arc::new(AtomicU32::new(0));
//! let watcher = EventHandler::bound(&seen, |seen, _sender, change: &PropertyChange| {
//!     assert_eq!(change.property(), "age");
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//! person.observe_changed(&watcher).unwrap();
//!
//! set_age(&person, 40);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! let muted = person.suppress_notifications();
//! set_age(&person, 41);
//! drop(muted);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::events::{Changed, Changing, EventHandler, PropertyChange};
use crate::registry::{add_handler, deliver_event, remove_handler};

/// Notification gate state embedded in an observable object.
#[derive(Default)]
pub struct ChangeTracker {
    suppressions: AtomicUsize,
    delays: AtomicUsize,
    pending: Mutex<Vec<PropertyChange>>,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn enabled(&self) -> bool {
        self.suppressions.load(Ordering::Acquire) == 0
    }

    fn delaying(&self) -> bool {
        self.delays.load(Ordering::Acquire) > 0
    }

    fn queue(&self, change: PropertyChange) {
        self.pending.lock().push(change);
    }

    fn begin_suppress(&self) {
        self.suppressions.fetch_add(1, Ordering::AcqRel);
    }

    fn end_suppress(&self) {
        self.suppressions.fetch_sub(1, Ordering::AcqRel);
    }

    fn begin_delay(&self) {
        self.delays.fetch_add(1, Ordering::AcqRel);
    }

    /// Ends one delay window; returns the queued notices when the last
    /// window closed.
    fn end_delay(&self) -> Vec<PropertyChange> {
        if self.delays.fetch_sub(1, Ordering::AcqRel) == 1 {
            std::mem::take(&mut *self.pending.lock())
        } else {
            Vec::new()
        }
    }
}

/// Base trait for objects that raise property-change notifications.
///
/// Implementors embed a [`ChangeTracker`]; the subscription and raise
/// surface lives on [`ObservableExt`], implemented for every
/// `Arc<impl Observable>`.
pub trait Observable: Send + Sync + Sized + 'static {
    /// The embedded notification gate state.
    fn change_tracker(&self) -> &ChangeTracker;

    /// True while no suppression guard is live.
    fn notifications_enabled(&self) -> bool {
        self.change_tracker().enabled()
    }

    /// Silences both streams until the guard drops. Guards nest.
    #[must_use]
    fn suppress_notifications(&self) -> SuppressionGuard<'_> {
        let tracker = self.change_tracker();
        tracker.begin_suppress();
        SuppressionGuard { tracker }
    }
}

/// Subscription and raise surface of an observable object.
///
/// Implemented for `Arc<T>` because the object itself is the notification
/// sender: the registry needs its shared identity, not just a borrow.
pub trait ObservableExt<T: Observable> {
    /// Subscribes `handler` to the before-change stream.
    fn observe_changing(&self, handler: &EventHandler<Changing>) -> Result<(), RegistryError>;

    /// Removes `handler` from the before-change stream; no-op on a miss.
    fn unobserve_changing(&self, handler: &EventHandler<Changing>) -> Result<(), RegistryError>;

    /// Subscribes `handler` to the after-change stream.
    fn observe_changed(&self, handler: &EventHandler<Changed>) -> Result<(), RegistryError>;

    /// Removes `handler` from the after-change stream; no-op on a miss.
    fn unobserve_changed(&self, handler: &EventHandler<Changed>) -> Result<(), RegistryError>;

    /// Raises a before-change notification for `property`, unless
    /// suppressed or delayed.
    fn raise_changing(&self, property: impl Into<Arc<str>>);

    /// Raises an after-change notification for `property`, unless
    /// suppressed; queued while delayed.
    fn raise_changed(&self, property: impl Into<Arc<str>>);

    /// Defers "changed" notifications until the guard drops, then flushes
    /// them in raise order. Guards nest; the flush happens when the last
    /// one drops.
    #[must_use]
    fn delay_notifications(&self) -> DelayGuard<T>;
}

impl<T: Observable> ObservableExt<T> for Arc<T> {
    fn observe_changing(&self, handler: &EventHandler<Changing>) -> Result<(), RegistryError> {
        add_handler(self, handler)
    }

    fn unobserve_changing(&self, handler: &EventHandler<Changing>) -> Result<(), RegistryError> {
        remove_handler(self, handler)
    }

    fn observe_changed(&self, handler: &EventHandler<Changed>) -> Result<(), RegistryError> {
        add_handler(self, handler)
    }

    fn unobserve_changed(&self, handler: &EventHandler<Changed>) -> Result<(), RegistryError> {
        remove_handler(self, handler)
    }

    fn raise_changing(&self, property: impl Into<Arc<str>>) {
        let tracker = self.change_tracker();
        if !tracker.enabled() || tracker.delaying() {
            return;
        }
        deliver_event::<Changing, T>(Some(self), &PropertyChange::new(property));
    }

    fn raise_changed(&self, property: impl Into<Arc<str>>) {
        let tracker = self.change_tracker();
        if !tracker.enabled() {
            return;
        }
        let change = PropertyChange::new(property);
        if tracker.delaying() {
            tracker.queue(change);
            return;
        }
        deliver_event::<Changed, T>(Some(self), &change);
    }

    fn delay_notifications(&self) -> DelayGuard<T> {
        self.change_tracker().begin_delay();
        DelayGuard {
            owner: Arc::clone(self),
        }
    }
}

/// RAII window during which an observable raises no notifications.
pub struct SuppressionGuard<'a> {
    tracker: &'a ChangeTracker,
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end_suppress();
    }
}

/// RAII window during which "changed" notifications queue instead of
/// firing; flushed in order when the last guard drops.
pub struct DelayGuard<T: Observable> {
    owner: Arc<T>,
}

impl<T: Observable> Drop for DelayGuard<T> {
    fn drop(&mut self) {
        for change in self.owner.change_tracker().end_delay() {
            // a suppression started mid-flush still silences the rest
            if !self.owner.change_tracker().enabled() {
                break;
            }
            deliver_event::<Changed, T>(Some(&self.owner), &change);
        }
    }
}
