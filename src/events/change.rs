//! # Property-change notifications.
//!
//! The structured payload raised by notifying objects when a property
//! mutates, plus the two built-in notification kinds consumed by the
//! [`Observable`](crate::Observable) facade:
//!
//! - [`Changing`] fires *before* a property is about to change;
//! - [`Changed`] fires *after* a property has changed.
//!
//! Each kind has its own independent registry; subscribing to one does not
//! subscribe to the other.

use std::fmt;
use std::sync::Arc;

use crate::events::kind::EventKind;

/// Payload of a property-change notification: which property moved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyChange {
    property: Arc<str>,
}

impl PropertyChange {
    /// Creates a notification payload for the named property.
    pub fn new(property: impl Into<Arc<str>>) -> Self {
        Self {
            property: property.into(),
        }
    }

    /// Name of the property that is changing / has changed.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property {{ name: {} }}", self.property)
    }
}

/// Notification kind raised before a property changes.
pub struct Changing;

impl EventKind for Changing {
    type Args = PropertyChange;
}

/// Notification kind raised after a property has changed.
pub struct Changed;

impl EventKind for Changed {
    type Args = PropertyChange;
}
