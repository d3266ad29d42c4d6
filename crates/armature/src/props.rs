//! Process-wide property table
//!
//! The global key/value table consulted by the built-in global-property
//! override source. Entries set here become (or override) stored-literal
//! string components on the next container build.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;

static GLOBAL_PROPERTIES: Lazy<RwLock<BTreeMap<String, String>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

fn read_table() -> RwLockReadGuard<'static, BTreeMap<String, String>> {
    match GLOBAL_PROPERTIES.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_table() -> RwLockWriteGuard<'static, BTreeMap<String, String>> {
    match GLOBAL_PROPERTIES.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Set a process-wide property
pub fn set_property(key: impl Into<String>, value: impl Into<String>) {
    write_table().insert(key.into(), value.into());
}

/// Read a process-wide property
pub fn property(key: &str) -> Option<String> {
    read_table().get(key).cloned()
}

/// Remove a process-wide property
pub fn clear_property(key: &str) {
    write_table().remove(key);
}

/// Snapshot of the whole table, in key order
pub fn snapshot() -> BTreeMap<String, String> {
    read_table().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_read_clear_round_trip() {
        set_property("props.test.key", "value");
        assert_eq!(property("props.test.key").as_deref(), Some("value"));

        let snap = snapshot();
        assert_eq!(snap.get("props.test.key").map(String::as_str), Some("value"));

        clear_property("props.test.key");
        assert_eq!(property("props.test.key"), None);
    }
}
