//! Error types used by the weak-event registry.
//!
//! The registry has a deliberately small synchronous error surface:
//! registration and removal validate their inputs up front and fail with
//! [`RegistryError`]; delivery never fails. A panic raised by a listener
//! callback is not represented here — it propagates to the caller of
//! [`deliver_event`](crate::deliver_event) unchanged, and the in-flight
//! delivery marker is still released on the way out.
//!
//! Removing a handler that was never added, or delivering to a source with
//! no registered handlers, are silent no-ops rather than errors.

use thiserror::Error;

/// # Errors produced by handler registration and removal.
///
/// Raised synchronously by [`add_handler`](crate::add_handler) and
/// [`remove_handler`](crate::remove_handler); never by
/// [`deliver_event`](crate::deliver_event).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The handler is bound to a receiver object that has already been
    /// dropped, so the subscription could never fire.
    #[error("handler's receiver was dropped before registration")]
    HandlerGone,
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use weakevent::RegistryError;
    ///
    /// let err = RegistryError::HandlerGone;
    /// assert_eq!(err.as_label(), "handler_gone");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::HandlerGone => "handler_gone",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::HandlerGone => "receiver dropped before registration".to_string(),
        }
    }
}
