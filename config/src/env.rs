//! Environment-variable overlay.
//!
//! Variables are named `<PREFIX><COMMAND>_<FIELD_PATH>` in upper case, with
//! `-` and `.` mapped to `_` (so `--user.first-name` on command `add` with
//! prefix `APP_` reads `APP_ADD_USER_FIRST_NAME`). Sequence and tuple slots
//! split the value on whitespace; a mapping slot takes the rest of the
//! variable name, lower-cased, as the key.

use std::collections::BTreeMap;

use argbind_core::{CommandSignature, SchemaKind, SchemaNode, SoftDefaults, enumerate_slots};
use serde_json::Value as Json;
use tracing::trace;

use crate::overlay::SlotValues;
use crate::{Overlay, Result};

/// Source label recorded for environment-supplied values.
pub const ENV_SOURCE: &str = "env";

/// Reads soft defaults from environment variables.
///
/// # Examples
///
/// ```
/// use argbind_config::Env;
///
/// let env = Env::new("APP_");
/// let path = ["deploy".to_string()];
/// let slot = ["dry_run".to_string()];
/// assert_eq!(env.variable_name(&path, &slot), "APP_DEPLOY_DRY_RUN");
/// assert_eq!(env.clone().without_command().variable_name(&path, &slot), "APP_DRY_RUN");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Env {
    prefix: String,
    include_command: bool,
    /// Fixed variables; `None` reads the process environment.
    vars: Option<BTreeMap<String, String>>,
}

impl Env {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            include_command: true,
            vars: None,
        }
    }

    /// Leaves the command path out of variable names.
    pub fn without_command(mut self) -> Self {
        self.include_command = false;
        self
    }

    /// Uses the given variables instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Variable name that supplies `slot`, for help renderers.
    pub fn variable_name(&self, command_path: &[String], slot: &[String]) -> String {
        format!("{}{}", self.full_prefix(command_path), transform(&slot.join("_")))
    }

    fn full_prefix(&self, command_path: &[String]) -> String {
        let mut prefix = self.prefix.clone();
        if self.include_command && !command_path.is_empty() {
            let commands: Vec<String> = command_path.iter().map(|c| transform(c)).collect();
            prefix.push_str(&commands.join("_"));
            prefix.push('_');
        }
        prefix
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        }
    }
}

impl Overlay for Env {
    fn source_name(&self) -> String {
        ENV_SOURCE.to_string()
    }

    fn apply(
        &self,
        signature: &CommandSignature,
        command_path: &[String],
        defaults: &mut SoftDefaults,
    ) -> Result<()> {
        let prefix = self.full_prefix(command_path);
        let slots: Vec<(String, _)> = enumerate_slots(&signature.parameters)
            .into_iter()
            .map(|info| (transform(&info.slot.join("_")), info))
            .collect();

        let mut values = SlotValues::default();
        for (name, raw) in self.snapshot() {
            let Some(suffix) = name.strip_prefix(&prefix) else {
                continue;
            };
            for (slot_name, info) in &slots {
                if suffix == slot_name {
                    let slot = info.slot.join(".");
                    trace!(variable = %name, slot = %slot, "Matched environment variable");
                    values.insert(info.slot.clone(), &[], split_value(info.node, &raw));
                    break;
                }
                if let SchemaKind::Mapping { value, .. } = &info.node.kind {
                    let key = suffix
                        .strip_prefix(slot_name.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                        .filter(|key| !key.is_empty());
                    if let Some(key) = key {
                        let key = key.to_lowercase();
                        values.insert(info.slot.clone(), &[key], split_value(value, &raw));
                        break;
                    }
                }
            }
        }

        values.commit(defaults, ENV_SOURCE);
        Ok(())
    }
}

fn transform(name: &str) -> String {
    name.to_uppercase()
        .replace(['-', '.'], "_")
        .trim_start_matches('_')
        .to_string()
}

fn split_value(node: &SchemaNode, raw: &str) -> Json {
    match node.kind {
        SchemaKind::Sequence(_) | SchemaKind::VariadicTuple(_) | SchemaKind::FixedTuple(_) => {
            Json::Array(
                raw.split_whitespace()
                    .map(|part| Json::String(part.to_string()))
                    .collect(),
            )
        }
        _ => Json::String(raw.to_string()),
    }
}
