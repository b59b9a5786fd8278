//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Used by the plain record types (suppliers, customers, staff) that have no
/// command/event lifecycle of their own.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
