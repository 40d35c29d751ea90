//! Signature validation.
//!
//! Checks structural invariants of a [`CommandSignature`] at registration
//! time, catching problems such as duplicate field names, empty sums, or
//! scalar kinds nobody registered a coercer for, before any token is bound.
//!
//! # Examples
//!
//! ```
//! use argbind_core::*;
//!
//! let registry = CoercerRegistry::default();
//! let signature = CommandSignature::new("deploy")
//!     .with_parameter(SchemaNode::scalar("target", ScalarKind::Str))
//!     .with_parameter(SchemaNode::flag("verbose").with_alias("-v"));
//! assert!(validate_signature(&signature, &registry).is_empty());
//!
//! // Invalid: alias missing its leading dash
//! let bad = CommandSignature::new("deploy")
//!     .with_parameter(SchemaNode::flag("verbose").with_alias("v"));
//! assert!(!validate_signature(&bad, &registry).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::normalize_name;
use crate::{CoercerRegistry, CommandSignature, SchemaKind, SchemaNode};

/// Signature validation errors.
///
/// Each variant names the dotted path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Command name is empty or whitespace-only.
    #[error("signature command cannot be empty")]
    EmptyCommandName,
    /// A parameter or record field has no name.
    #[error("empty parameter or field name under: {0}")]
    EmptyName(String),
    /// Two names in one scope normalize to the same flag.
    #[error("duplicate name in scope: {0}")]
    DuplicateName(String),
    #[error("literal set has no allowed values: {0}")]
    EmptyLiteralSet(String),
    #[error("sum has no variants: {0}")]
    EmptySum(String),
    #[error("record has no fields: {0}")]
    EmptyRecord(String),
    /// Alias does not start with `-` or is a bare dash.
    #[error("invalid alias format: {0}")]
    InvalidAlias(String),
    /// Two parameters claim the same alias.
    #[error("duplicate alias: {0}")]
    DuplicateAlias(String),
    #[error("no coercer registered for kind {kind:?} at {path}")]
    UnregisteredKind { path: String, kind: String },
    /// A second greedy positional parameter could never receive tokens.
    #[error("more than one consume-all positional parameter: {0}")]
    MultipleConsumeAll(String),
}

/// Validates a command signature against the kinds in `registry`.
///
/// Stops at the first problem found, like a compiler's first error.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let registry = CoercerRegistry::default();
/// let signature = CommandSignature::new("send").with_parameter(
///     SchemaNode::scalar("to", ScalarKind::custom("email")),
/// );
/// assert_eq!(
///     validate_signature(&signature, &registry),
///     vec![SchemaError::UnregisteredKind { path: "to".into(), kind: "email".into() }]
/// );
/// ```
pub fn validate_signature(
    signature: &CommandSignature,
    registry: &CoercerRegistry,
) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    if signature.command.trim().is_empty() {
        errors.push(SchemaError::EmptyCommandName);
        return errors;
    }

    errors.extend(validate_scope(&signature.parameters, &signature.command));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_aliases(&signature.parameters));
    if !errors.is_empty() {
        return errors;
    }

    let mut greedy = signature
        .parameters
        .iter()
        .filter(|p| p.consumes_all() && p.accepts_positional());
    if let (Some(_), Some(second)) = (greedy.next(), greedy.next()) {
        errors.push(SchemaError::MultipleConsumeAll(second.name.clone()));
        return errors;
    }

    for parameter in &signature.parameters {
        errors.extend(validate_node(parameter, &parameter.name, registry));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Checks names of one record (or the top-level parameter list).
fn validate_scope(nodes: &[SchemaNode], scope: &str) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for node in nodes {
        if node.name.trim().is_empty() {
            errors.push(SchemaError::EmptyName(scope.to_string()));
            return errors;
        }
        if !seen.insert(normalize_name(&node.name)) {
            errors.push(SchemaError::DuplicateName(node.name.clone()));
            return errors;
        }
    }

    errors
}

fn validate_aliases(parameters: &[SchemaNode]) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for alias in parameters.iter().flat_map(|p| &p.aliases) {
        if !alias.starts_with('-') || alias.len() < 2 {
            errors.push(SchemaError::InvalidAlias(alias.clone()));
            return errors;
        }
        if !seen.insert(alias.as_str()) {
            errors.push(SchemaError::DuplicateAlias(alias.clone()));
            return errors;
        }
    }

    errors
}

fn validate_node(node: &SchemaNode, path: &str, registry: &CoercerRegistry) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    match &node.kind {
        SchemaKind::Scalar(kind) => {
            if !registry.contains(kind) {
                errors.push(SchemaError::UnregisteredKind {
                    path: path.to_string(),
                    kind: kind.type_name().to_string(),
                });
            }
        }
        SchemaKind::LiteralSet(allowed) => {
            if allowed.is_empty() {
                errors.push(SchemaError::EmptyLiteralSet(path.to_string()));
            }
        }
        SchemaKind::Sum(variants) if variants.is_empty() => {
            errors.push(SchemaError::EmptySum(path.to_string()));
        }
        SchemaKind::Record(fields) if fields.is_empty() => {
            errors.push(SchemaError::EmptyRecord(path.to_string()));
        }
        SchemaKind::Record(fields) => {
            errors.extend(validate_scope(fields, path));
            if !errors.is_empty() {
                return errors;
            }
            for field in fields {
                errors.extend(validate_node(field, &format!("{path}.{}", field.name), registry));
                if !errors.is_empty() {
                    return errors;
                }
            }
        }
        SchemaKind::Mapping { key, value } => {
            if !registry.contains(key) {
                errors.push(SchemaError::UnregisteredKind {
                    path: path.to_string(),
                    kind: key.type_name().to_string(),
                });
                return errors;
            }
            errors.extend(validate_node(value, path, registry));
        }
        SchemaKind::Sequence(_)
        | SchemaKind::VariadicTuple(_)
        | SchemaKind::FixedTuple(_)
        | SchemaKind::Sum(_) => {
            for child in node.children() {
                errors.extend(validate_node(child, path, registry));
                if !errors.is_empty() {
                    return errors;
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScalarKind;

    fn registry() -> CoercerRegistry {
        CoercerRegistry::default()
    }

    #[test]
    fn test_rejects_duplicate_names_after_normalization() {
        let signature = CommandSignature::new("run")
            .with_parameter(SchemaNode::flag("dry_run"))
            .with_parameter(SchemaNode::flag("dry-run"));
        assert_eq!(
            validate_signature(&signature, &registry()),
            vec![SchemaError::DuplicateName("dry-run".to_string())]
        );
    }

    #[test]
    fn test_rejects_empty_nested_sum() {
        let signature = CommandSignature::new("run").with_parameter(SchemaNode::record(
            "opts",
            vec![SchemaNode::sum("mode", Vec::new())],
        ));
        assert_eq!(
            validate_signature(&signature, &registry()),
            vec![SchemaError::EmptySum("opts.mode".to_string())]
        );
    }

    #[test]
    fn test_rejects_two_greedy_positionals() {
        let element = || SchemaNode::element(SchemaKind::Scalar(ScalarKind::Str));
        let signature = CommandSignature::new("run")
            .with_parameter(SchemaNode::sequence("a", element()))
            .with_parameter(SchemaNode::sequence("b", element()));
        assert_eq!(
            validate_signature(&signature, &registry()),
            vec![SchemaError::MultipleConsumeAll("b".to_string())]
        );

        let keyword_only = CommandSignature::new("run")
            .with_parameter(SchemaNode::sequence("a", element()))
            .with_parameter(SchemaNode::sequence("b", element()).keyword_only());
        assert!(validate_signature(&keyword_only, &registry()).is_empty());
    }

    #[test]
    fn test_rejects_duplicate_alias() {
        let signature = CommandSignature::new("run")
            .with_parameter(SchemaNode::flag("verbose").with_alias("-v"))
            .with_parameter(SchemaNode::flag("version").with_alias("-v"));
        assert_eq!(
            validate_signature(&signature, &registry()),
            vec![SchemaError::DuplicateAlias("-v".to_string())]
        );
    }

    #[test]
    fn test_accepts_valid_signature() {
        let signature = CommandSignature::new("run")
            .with_parameter(SchemaNode::literal("mode", ["fast", "slow"]))
            .with_parameter(SchemaNode::mapping(
                "env",
                SchemaNode::element(SchemaKind::Scalar(ScalarKind::Str)),
            ));
        assert!(validate_signature(&signature, &registry()).is_empty());
    }
}
