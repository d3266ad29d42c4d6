//! Stable type identifiers for the type index
//!
//! The container indexes components by *type key* rather than by a live
//! type-system object. A definition declares its primary key plus an
//! explicit "provides" list (the registration-time replacement for walking
//! implemented interfaces and ancestor types), and by-type lookups query
//! the same keys.

use std::any::type_name;
use std::fmt;

/// A stable identifier for a declared component type.
///
/// Keys are ordinary `&'static str` names. `TypeKey::of::<T>()` derives one
/// from the Rust type (trait objects work too: `TypeKey::of::<dyn Greeter>()`),
/// and `TypeKey::named` builds one from an arbitrary static string for types
/// the registrant wants to alias.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeKey(&'static str);

impl TypeKey {
    /// Derive the key for a Rust type
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(type_name::<T>())
    }

    /// Build a key from an explicit name
    pub const fn named(name: &'static str) -> Self {
        TypeKey(name)
    }

    /// The underlying key name
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn keys_for_distinct_types_differ() {
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<i64>());
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
    }

    #[test]
    fn trait_object_keys_are_supported() {
        let key = TypeKey::of::<dyn Marker>();
        assert!(key.name().contains("Marker"));
    }

    #[test]
    fn named_key_round_trips() {
        let key = TypeKey::named("app::Greeter");
        assert_eq!(key.name(), "app::Greeter");
        assert_eq!(key, TypeKey::named("app::Greeter"));
    }
}
