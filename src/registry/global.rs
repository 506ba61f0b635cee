//! # Delivery coordinator: per-kind singletons and entry points.
//!
//! One [`EventRegistry`] exists per notification kind, created lazily on
//! first use inside a process-wide table keyed by the kind's `TypeId`, and
//! never torn down — safe, because a registry holds no strong references to
//! sources, receivers or (beyond their receiver's lifetime) callables.
//!
//! The free functions here are the crate's entry points: they validate
//! inputs, route to the kind's singleton, and leave the structural
//! bookkeeping (attach/detach transitions, opportunistic purge) to the
//! engine.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::events::{static_source, EventHandler, EventKind, SourceRef};
use crate::registry::core::EventRegistry;

/// Lazily populated table of per-kind registry singletons.
static REGISTRIES: LazyLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the singleton registry for kind `E`, creating it on first use.
fn current<E: EventKind>() -> Arc<EventRegistry<E>> {
    let mut table = REGISTRIES.lock();
    let entry = table
        .entry(TypeId::of::<E>())
        .or_insert_with(|| Arc::new(EventRegistry::<E>::new()) as Arc<dyn Any + Send + Sync>);
    Arc::clone(entry)
        .downcast::<EventRegistry<E>>()
        .unwrap_or_else(|_| unreachable!("registry table entries are keyed by their own kind"))
}

/// Registers `handler` to receive kind-`E` events raised by `source`.
///
/// The registry holds both sides weakly: it will never keep `source` or the
/// handler's receiver alive. Registering the same (source, handler) pair
/// twice is allowed and produces two invocations per delivery.
///
/// The first registration for a source fires
/// [`EventKind::start_listening`] once.
///
/// # Errors
/// [`RegistryError::HandlerGone`] when the handler's receiver has already
/// been dropped.
pub fn add_handler<E, S>(source: &Arc<S>, handler: &EventHandler<E>) -> Result<(), RegistryError>
where
    E: EventKind,
    S: Send + Sync + 'static,
{
    if handler.is_stale() {
        return Err(RegistryError::HandlerGone);
    }
    let strong: Arc<S> = Arc::clone(source);
    let source: SourceRef = strong;
    current::<E>().add(&source, handler);
    Ok(())
}

/// Removes the first registration of `handler` on `source`; a handler that
/// was never added is a silent no-op.
///
/// When the source's last handler goes away, the registry detaches from the
/// source and fires [`EventKind::stop_listening`] once.
///
/// # Errors
/// [`RegistryError::HandlerGone`] when the handler's receiver has already
/// been dropped (the matching entry, if any, is inert and will be purged by
/// the next structural operation instead).
pub fn remove_handler<E, S>(source: &Arc<S>, handler: &EventHandler<E>) -> Result<(), RegistryError>
where
    E: EventKind,
    S: Send + Sync + 'static,
{
    if handler.is_stale() {
        return Err(RegistryError::HandlerGone);
    }
    let strong: Arc<S> = Arc::clone(source);
    let source: SourceRef = strong;
    current::<E>().remove(&source, handler);
    Ok(())
}

/// Delivers a kind-`E` event to every handler registered on `sender`,
/// synchronously, on the calling thread, in registration order.
///
/// `None` targets the process-wide [`static_source`] sentinel. A sender
/// with no registered handlers is a no-op. Handlers registered from inside
/// a callback are not invoked during the delivery that is already in
/// flight.
///
/// # Panics
/// Does not panic itself; a panic raised by a handler propagates to the
/// caller, aborting the remaining handlers of this pass. The in-flight
/// delivery marker is still released.
pub fn deliver_event<E, S>(sender: Option<&Arc<S>>, args: &E::Args)
where
    E: EventKind,
    S: Send + Sync + 'static,
{
    let sender: SourceRef = match sender {
        Some(sender) => {
            let strong: Arc<S> = Arc::clone(sender);
            strong
        }
        None => static_source(),
    };
    current::<E>().deliver(&sender, args);
}

/// Explicitly compacts the handler list of `source`, dropping stale
/// entries.
///
/// Structural operations already purge opportunistically; this is for
/// callers that want staleness collected at a moment of their choosing.
pub fn purge<E, S>(source: &Arc<S>)
where
    E: EventKind,
    S: Send + Sync + 'static,
{
    let strong: Arc<S> = Arc::clone(source);
    let source: SourceRef = strong;
    current::<E>().purge(&source);
}
