use serde::{Deserialize, Serialize};

use crate::types::names_match;
use crate::{SchemaKind, SchemaNode, Value};

/// Version of the signature contract (semver).
pub const SIGNATURE_CONTRACT_VERSION: &str = "1.0.0";

/// The parameter schema of one command, registered once and shared
/// read-only across invocations.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let mut signature = CommandSignature::new("deploy");
/// signature.parameters.push(SchemaNode::scalar("target", ScalarKind::Str));
/// signature.parameters.push(SchemaNode::flag("dry_run"));
/// signature.subcommands.push("rollback".into());
///
/// assert!(signature.find_parameter("dry-run").is_some());
/// assert_eq!(signature.parameter_names(), vec!["target", "dry_run"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSignature {
    /// Signature contract version (populated from
    /// [`SIGNATURE_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Command name (e.g. "deploy").
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<SchemaNode>,
    /// Names of nested commands; configuration keys with these names are
    /// skipped by overlays.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<String>,
}

impl CommandSignature {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            schema_version: Some(SIGNATURE_CONTRACT_VERSION.to_string()),
            command: command.into(),
            description: None,
            parameters: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: SchemaNode) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Finds a top-level parameter by name (`_` and `-` are equivalent).
    pub fn find_parameter(&self, name: &str) -> Option<&SchemaNode> {
        self.parameters.iter().find(|p| names_match(&p.name, name))
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn is_subcommand(&self, key: &str) -> bool {
        self.subcommands.iter().any(|s| s == key)
    }

    /// Flattens parameters into renderer-facing metadata.
    ///
    /// Records expand into one entry per field (`user.name`); every other
    /// node is a single entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::*;
    ///
    /// let signature = CommandSignature::new("add").with_parameter(
    ///     SchemaNode::record("user", vec![
    ///         SchemaNode::scalar("name", ScalarKind::Str),
    ///         SchemaNode::scalar("admin", ScalarKind::Bool).with_default(false),
    ///     ]),
    /// );
    /// let info = signature.parameter_info();
    /// assert_eq!(info.len(), 2);
    /// assert_eq!(info[0].path, "user.name");
    /// assert_eq!(info[1].cli_names, vec!["--user.admin", "--user.no-admin"]);
    /// ```
    pub fn parameter_info(&self) -> Vec<ParameterInfo> {
        let mut out = Vec::new();
        for parameter in &self.parameters {
            collect_info(parameter, "", &parameter.aliases, &mut out);
        }
        out
    }
}

/// Metadata about one addressable parameter, consumed by help renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Dotted path (`user.name`).
    pub path: String,
    /// Flags that address this parameter; empty for positional-only ones.
    pub cli_names: Vec<String>,
    pub type_name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub positional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn collect_info(node: &SchemaNode, prefix: &str, aliases: &[String], out: &mut Vec<ParameterInfo>) {
    let path = if prefix.is_empty() {
        node.name.clone()
    } else {
        format!("{prefix}.{}", node.name)
    };

    if let SchemaKind::Record(fields) = &node.kind {
        for field in fields {
            collect_info(field, &path, &[], out);
        }
        return;
    }

    let mut cli_names = Vec::new();
    if node.accepts_keyword() {
        let flag_path = path.replace('_', "-");
        cli_names.push(format!("--{flag_path}"));
        if node.is_bool() {
            cli_names.push(prefixed_flag(&flag_path, "no-"));
        }
        if node.consumes_all() {
            cli_names.push(prefixed_flag(&flag_path, "empty-"));
        }
        cli_names.extend(aliases.iter().cloned());
    }

    out.push(ParameterInfo {
        path,
        cli_names,
        type_name: node.type_name(),
        required: node.required && node.default.is_none(),
        default: node.default.clone(),
        positional: node.accepts_positional(),
        description: node.description.clone(),
    });
}

/// `--parent.no-leaf` style flag: the prefix goes on the last segment.
fn prefixed_flag(flag_path: &str, prefix: &str) -> String {
    match flag_path.rsplit_once('.') {
        Some((parent, leaf)) => format!("--{parent}.{prefix}{leaf}"),
        None => format!("--{prefix}{flag_path}"),
    }
}
