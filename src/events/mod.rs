//! Notification kinds, handler values and change payloads.
//!
//! This module groups the event **data model** of the registry:
//!
//! ## Contents
//! - [`EventKind`] notification-kind marker trait with attach/detach
//!   extension points, [`SourceRef`] type-erased source identity,
//!   [`static_source`] sender-less delivery sentinel
//! - [`EventHandler`], [`Callback`] listener registration values
//! - [`PropertyChange`], [`Changing`], [`Changed`] the property-change
//!   payload and the two built-in kinds used by the facade
//!
//! ## Quick reference
//! - **Producers**: notifying objects call
//!   [`deliver_event`](crate::deliver_event) (directly or through
//!   [`Observable`](crate::Observable)).
//! - **Consumers**: listener objects build an [`EventHandler`] and register
//!   it with [`add_handler`](crate::add_handler).

mod change;
mod handler;
mod kind;

pub use change::{Changed, Changing, PropertyChange};
pub use handler::{Callback, EventHandler};
pub use kind::{static_source, EventKind, SourceRef, StaticSource};

pub(crate) use kind::source_key;
