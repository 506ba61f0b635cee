//! # weakevent
//!
//! **Weakevent** is a weak-reference event registry for Rust.
//!
//! It lets many independent listeners subscribe to change notifications
//! from a source object without the registry keeping the listeners (or
//! their sources) alive — the accidental-leak pattern where an event
//! subscription silently extends an observer's lifetime to match the
//! source's cannot happen here.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   add_handler(source, handler)        deliver_event(sender, args)
//!            │                                    │
//!            ▼                                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Delivery coordinator (one lazy singleton per notification kind)  │
//! │  - validates inputs, routes by kind                               │
//! └──────────────┬────────────────────────────────┬───────────────────┘
//!                ▼                                ▼
//! ┌───────────────────────────┐    ┌───────────────────────────────┐
//! │ sources: id → HandlerList │    │ receivers: id → callables     │
//! │   (source held weakly)    │    │   (pinned while the receiver  │
//! │                           │    │    object lives)              │
//! └──────────────┬────────────┘    └───────────────────────────────┘
//!                ▼
//!    ┌───────────────────────┐   one ordered list per source:
//!    │ [WeakHandle, ...]     │   weak slots, in-flight delivery
//!    │  delivery counter     │   counter, clone-on-write while
//!    └───────────────────────┘   delivery-active
//! ```
//!
//! ### Delivery
//! Synchronous, on the calling thread, in registration order. A handler
//! callback may itself add or remove handlers on the very source being
//! delivered: structural changes made while a delivery is in flight mutate
//! an active-only clone that is published with a single map upsert, so the
//! in-flight pass keeps its snapshot and the change takes effect from the
//! next delivery.
//!
//! ### Lifetimes
//! - A source is attached on its first registration
//!   ([`EventKind::start_listening`] fires once) and detached when its
//!   handler count returns to zero ([`EventKind::stop_listening`], once).
//! - A handler bound to a receiver object goes inert when the receiver is
//!   dropped — no unsubscription required; stale entries are purged by the
//!   next structural operation.
//! - A panic in a handler propagates to the `deliver_event` caller; the
//!   in-flight delivery marker is still released.
//!
//! ## Modules
//! | Area              | Description                                               | Key items                                        |
//! |-------------------|-----------------------------------------------------------|--------------------------------------------------|
//! | **Entry points**  | Validated static-style subscribe/unsubscribe/deliver.     | [`add_handler`], [`remove_handler`], [`deliver_event`], [`purge`] |
//! | **Events**        | Notification kinds, handler values, change payloads.      | [`EventKind`], [`EventHandler`], [`PropertyChange`] |
//! | **Facade**        | Before/after change streams with suppression and delay.   | [`Observable`], [`ChangeTracker`]                |
//! | **Errors**        | Synchronous validation failures.                          | [`RegistryError`]                                |
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use weakevent::{
//!     add_handler, deliver_event, remove_handler, EventHandler, EventKind, PropertyChange,
//! };
//!
//! // One registry per notification kind; a kind is a marker type.
//! struct Renamed;
//!
//! impl EventKind for Renamed {
//!     type Args = PropertyChange;
//! }
//!
//! let document = Arc::new("report.md".to_string());
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! // the registry holds `seen` weakly; dropping it would end the
//! // subscription without any unsubscribe call
//! let handler = EventHandler::<Renamed>::bound(&seen, |seen, _sender, change| {
//!     assert_eq!(change.property(), "title");
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! add_handler(&document, &handler)?;
//! deliver_event::<Renamed, _>(Some(&document), &PropertyChange::new("title"));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//!
//! remove_handler(&document, &handler)?;
//! deliver_event::<Renamed, _>(Some(&document), &PropertyChange::new("title"));
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! # Ok::<(), weakevent::RegistryError>(())
//! ```

mod error;
mod events;
mod observable;
mod registry;

// ---- Public re-exports ----

pub use error::RegistryError;
pub use events::{
    static_source, Callback, Changed, Changing, EventHandler, EventKind, PropertyChange,
    SourceRef, StaticSource,
};
pub use observable::{ChangeTracker, DelayGuard, Observable, ObservableExt, SuppressionGuard};
pub use registry::{add_handler, deliver_event, purge, remove_handler};
