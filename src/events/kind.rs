//! # Notification kinds and source identity.
//!
//! A *notification kind* is a category of change notification (for example
//! "before change" vs "after change"). Each kind gets its own independent
//! process-wide registry, so subscriptions to one kind never interact with
//! another. A kind is a marker type implementing [`EventKind`]; it is never
//! instantiated.
//!
//! Sources are identity-compared and only ever referenced weakly: the
//! registry stores them as [`SourceRef`] (a type-erased `Arc`) downgraded to
//! `Weak`, and must never be the reason a source survives.
//!
//! ## Extension points
//! [`EventKind::start_listening`] and [`EventKind::stop_listening`] are
//! invoked exactly once per attach/detach transition of a source: when its
//! first handler is registered and when its handler count returns to zero.
//! The defaults do nothing; a kind that is driven by a native notification
//! mechanism (rather than explicit [`deliver_event`](crate::deliver_event)
//! calls) overrides them to hook and unhook that mechanism.

use std::any::Any;
use std::sync::{Arc, LazyLock};

/// Type-erased, shared reference to a notification source.
///
/// Any `Arc<S>` with `S: Send + Sync + 'static` coerces to this.
pub type SourceRef = Arc<dyn Any + Send + Sync>;

/// A category of change notification with its own independent registry.
///
/// Implemented by marker types; one registry per implementing type, created
/// lazily on first use and never torn down (it holds no strong references).
///
/// # Example
/// ```
/// use weakevent::EventKind;
///
/// struct Renamed;
///
/// impl EventKind for Renamed {
///     type Args = String;
/// }
/// ```
pub trait EventKind: 'static {
    /// Payload delivered alongside the sender to every handler.
    type Args: Send + Sync + 'static;

    /// Called when the first handler is registered for a source.
    fn start_listening(_source: &SourceRef) {}

    /// Called when a source's handler count returns to zero.
    fn stop_listening(_source: &SourceRef) {}
}

/// Sentinel used when an event is delivered without a concrete sender.
///
/// Handlers registered against [`static_source`] are reached by
/// `deliver_event::<E, StaticSource>(None, args)`.
pub struct StaticSource {
    _private: (),
}

static STATIC_SOURCE: LazyLock<Arc<StaticSource>> =
    LazyLock::new(|| Arc::new(StaticSource { _private: () }));

/// Returns the process-wide sender sentinel.
///
/// The same object for the lifetime of the process, so handlers registered
/// against it are matched by every sender-less delivery.
#[must_use]
pub fn static_source() -> Arc<StaticSource> {
    Arc::clone(&STATIC_SOURCE)
}

/// Identity key of a source: the address of its shared allocation.
///
/// Identity, not equality — two sources compare equal here only when they
/// are the same object. Keys may be reused after a source dies; callers
/// must pair a key with a liveness check on the matching weak reference.
pub(crate) fn source_key(source: &SourceRef) -> usize {
    Arc::as_ptr(source).cast::<()>() as usize
}
