//! Identity types for the reactive engine.
//!
//! Dependencies are keyed by *object identity*, never by value equality:
//! two equal-looking objects are distinct dependency roots. The
//! interception layer allocates one [`TargetId`] per reactive object and
//! passes it, together with the property [`Key`] being read or written,
//! to `track`/`trigger`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

/// Unique identifier for an effect.
///
/// Each effect gets a unique ID when created. The ID is what dependency
/// sets store, so membership checks never touch the effect itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity handle for a reactive source object.
///
/// The engine never sees the object itself, only this handle. The
/// interception layer mints one per wrapped object and keeps it for the
/// object's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocate a fresh target identity.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for TargetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A property key on a reactive source object.
///
/// Source objects may be read by named property or by index, so both are
/// first-class key forms. Named keys are reference-counted so cloning a
/// key during tracking never copies the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named property, e.g. `user.age`.
    Name(Arc<str>),
    /// An indexed slot, e.g. `items[3]`.
    Index(usize),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A `(target, key)` pair: one slot in the dependency registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepKey {
    /// Identity of the source object.
    pub target: TargetId,
    /// The property that was read or written.
    pub key: Key,
}

impl DepKey {
    /// Build a dependency key from a target and anything convertible to
    /// a property key.
    pub fn new(target: TargetId, key: impl Into<Key>) -> Self {
        Self {
            target,
            key: key.into(),
        }
    }
}

impl fmt::Display for DepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target.raw(), self.key)
    }
}

/// The list of registry slots an effect is currently a member of.
///
/// Effects rarely read more than a handful of properties, so the list is
/// inline up to four entries.
pub(crate) type DepList = SmallVec<[DepKey; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_ids_are_unique() {
        let id1 = EffectId::new();
        let id2 = EffectId::new();
        let id3 = EffectId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn target_ids_are_unique() {
        let t1 = TargetId::new();
        let t2 = TargetId::new();
        assert_ne!(t1, t2);
    }

    #[test]
    fn distinct_targets_are_distinct_dep_keys() {
        // Identity, not value equality: same property name on two targets
        // must hash and compare as different slots.
        let a = DepKey::new(TargetId::new(), "age");
        let b = DepKey::new(TargetId::new(), "age");
        assert_ne!(a, b);
    }

    #[test]
    fn key_conversions() {
        assert_eq!(Key::from("age"), Key::Name(Arc::from("age")));
        assert_eq!(Key::from(String::from("age")), Key::from("age"));
        assert_eq!(Key::from(3usize), Key::Index(3));
    }

    #[test]
    fn key_display() {
        assert_eq!(Key::from("age").to_string(), "age");
        assert_eq!(Key::from(7usize).to_string(), "[7]");
    }
}
