//! Domain event trait.

use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate.
pub trait Event: Clone + core::fmt::Debug {
    /// Stable dotted name, e.g. `inventory.item.created`.
    fn event_type(&self) -> &'static str;

    /// Schema version of the payload.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
