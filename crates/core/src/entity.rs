//! Entity traits: identity and optimistic-concurrency version.

/// A record with a stable identity.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// A mutable record that carries a monotonically increasing version.
///
/// Version 1 is the state right after creation; every accepted update bumps
/// it by one.
pub trait Versioned: Entity {
    fn version(&self) -> u64;
}
