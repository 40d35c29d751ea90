//! Soft defaults supplied by overlays before binding.
//!
//! Overlays (configuration files, environment variables) run before the
//! binder and record one structured value per *slot*: a leaf record field,
//! or an atomic container (mapping, sequence, tuple, sum). The first source
//! to fill a slot owns it. Explicit CLI tokens always override soft
//! defaults during binding.

use std::collections::BTreeMap;

/// One overlay-supplied value.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDefault {
    /// Value as parsed from the source; strings still go through the
    /// registered coercer at bind time.
    pub value: serde_json::Value,
    /// Where the value came from (file path, `env`, ...).
    pub source: String,
}

/// Slot path → soft default.
///
/// # Examples
///
/// ```
/// use argbind_core::SoftDefaults;
/// use serde_json::json;
///
/// let mut defaults = SoftDefaults::new();
/// let slot = vec!["user".to_string(), "name".to_string()];
/// assert!(defaults.insert_if_absent(slot.clone(), json!("Alice"), "pyproject.toml"));
/// assert!(!defaults.insert_if_absent(slot.clone(), json!("Bob"), "env"));
/// assert_eq!(defaults.get(&slot).unwrap().value, json!("Alice"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftDefaults {
    entries: BTreeMap<Vec<String>, SoftDefault>,
}

impl SoftDefaults {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Records `value` for `slot` unless another source already owns it.
    /// Returns whether the value was stored.
    pub fn insert_if_absent(
        &mut self,
        slot: Vec<String>,
        value: serde_json::Value,
        source: impl Into<String>,
    ) -> bool {
        if self.entries.contains_key(&slot) {
            return false;
        }
        self.entries.insert(
            slot,
            SoftDefault {
                value,
                source: source.into(),
            },
        );
        true
    }

    pub fn get(&self, slot: &[String]) -> Option<&SoftDefault> {
        self.entries.get(slot)
    }

    pub fn contains(&self, slot: &[String]) -> bool {
        self.entries.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates slots in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&[String], &SoftDefault)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }
}
