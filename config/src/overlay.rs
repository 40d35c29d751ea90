//! The overlay contract and the driver that runs overlays in order.

use argbind_core::{CommandSignature, SoftDefaults};
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use crate::Result;

/// A source of soft defaults applied before binding.
///
/// Implementations add values with [`SoftDefaults::insert_if_absent`], so a
/// slot filled by an earlier overlay is never overwritten.
pub trait Overlay: Send + Sync {
    /// Label recorded as the source of every value this overlay supplies.
    fn source_name(&self) -> String;

    /// Adds this source's values for the command at `command_path`.
    fn apply(
        &self,
        signature: &CommandSignature,
        command_path: &[String],
        defaults: &mut SoftDefaults,
    ) -> Result<()>;
}

/// Runs `overlays` in order and collects their soft defaults.
///
/// # Examples
///
/// ```
/// use argbind_config::{apply_overlays, Env, Overlay};
/// use argbind_core::*;
///
/// let signature = CommandSignature::new("serve")
///     .with_parameter(SchemaNode::scalar("port", ScalarKind::Int).with_default(80i64));
/// let env = Env::new("APP_").with_vars([("APP_PORT", "8080")]);
///
/// let defaults = apply_overlays(&[&env as &dyn Overlay], &signature, &[]).unwrap();
/// let registry = CoercerRegistry::default();
/// let result = bind(&signature, Vec::<String>::new(), &registry, &defaults);
/// assert_eq!(result.get("port"), Some(&Value::Int(8080)));
/// ```
pub fn apply_overlays(
    overlays: &[&dyn Overlay],
    signature: &CommandSignature,
    command_path: &[String],
) -> Result<SoftDefaults> {
    let mut defaults = SoftDefaults::new();
    for overlay in overlays {
        let before = defaults.len();
        overlay.apply(signature, command_path, &mut defaults)?;
        debug!(
            source = %overlay.source_name(),
            added = defaults.len() - before,
            "Applied overlay"
        );
    }
    Ok(defaults)
}

/// Values one overlay collected, grouped by slot before committing.
///
/// Keys below a slot (mapping keys, tuple indices) nest into one object per
/// slot, so an atomic slot is owned by a single source.
#[derive(Debug, Default)]
pub(crate) struct SlotValues {
    entries: Vec<(Vec<String>, Json)>,
}

impl SlotValues {
    pub fn insert(&mut self, slot: Vec<String>, rest: &[String], leaf: Json) {
        let index = match self.entries.iter().position(|(s, _)| *s == slot) {
            Some(index) => index,
            None => {
                self.entries.push((slot, Json::Null));
                self.entries.len() - 1
            }
        };
        insert_nested(&mut self.entries[index].1, rest, leaf);
    }

    /// Stores every slot not already owned. Returns how many were stored.
    pub fn commit(self, defaults: &mut SoftDefaults, source: &str) -> usize {
        let mut stored = 0;
        for (slot, value) in self.entries {
            if defaults.contains(&slot) {
                trace!(slot = %slot.join("."), source, "Slot already owned by an earlier source");
                continue;
            }
            defaults.insert_if_absent(slot, value, source);
            stored += 1;
        }
        stored
    }
}

fn insert_nested(target: &mut Json, rest: &[String], leaf: Json) {
    let Some((key, tail)) = rest.split_first() else {
        *target = leaf;
        return;
    };
    if !target.is_object() {
        *target = Json::Object(Map::new());
    }
    if let Json::Object(map) = target {
        insert_nested(map.entry(key.clone()).or_insert(Json::Null), tail, leaf);
    }
}

/// Flattens nested tables into `(key path, leaf)` pairs. Arrays are leaves.
pub(crate) fn walk_leaves(value: &Json) -> Vec<(Vec<String>, Json)> {
    let mut out = Vec::new();
    push_leaves(value, &mut Vec::new(), &mut out);
    out
}

fn push_leaves(value: &Json, keys: &mut Vec<String>, out: &mut Vec<(Vec<String>, Json)>) {
    match value {
        Json::Object(map) => {
            for (key, child) in map {
                keys.push(key.clone());
                push_leaves(child, keys, out);
                keys.pop();
            }
        }
        leaf => out.push((keys.clone(), leaf.clone())),
    }
}
