//! Conversion of structured (JSON-shaped) values into bound values.
//!
//! Used for JSON literals supplied as a single CLI token (`'{"a": 1}'`) and
//! for every overlay-supplied soft default. Pre-typed values are taken
//! natively when the scalar coercer accepts them; strings still go through
//! the registered coercer.

use serde_json::Value as Json;

use crate::types::names_match;
use crate::{BindError, CoercerRegistry, ScalarKind, SchemaKind, SchemaNode, Value, VariantFailure};

/// `true` when the node (or any sum variant below it) accepts every raw
/// string, which disables structured-literal decoding.
pub(crate) fn accepts_bare_string(registry: &CoercerRegistry, node: &SchemaNode) -> bool {
    match &node.kind {
        SchemaKind::Scalar(kind) => registry.accepts_any_string(kind),
        SchemaKind::Sum(variants) => variants.iter().any(|v| accepts_bare_string(registry, v)),
        _ => false,
    }
}

/// Whether `raw` should be decoded as a JSON literal for `node`.
///
/// Objects decode into records and mappings, arrays into sequences whose
/// element does not accept bare strings. Sums decode only when no variant
/// accepts a bare string.
pub(crate) fn allows_structured(
    registry: &CoercerRegistry,
    node: &SchemaNode,
    raw: &str,
) -> bool {
    let trimmed = raw.trim_start();
    let object = trimmed.starts_with('{');
    let array = trimmed.starts_with('[');
    if !object && !array {
        return false;
    }
    match &node.kind {
        SchemaKind::Record(_) | SchemaKind::Mapping { .. } => object,
        SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
            array && !accepts_bare_string(registry, element)
        }
        SchemaKind::Sum(variants) => {
            !accepts_bare_string(registry, node)
                && variants.iter().any(|v| allows_structured(registry, v, raw))
        }
        _ => false,
    }
}

/// Parses a JSON literal token.
pub(crate) fn decode_literal(
    node: &SchemaNode,
    raw: &str,
    field: &str,
) -> Result<Json, BindError> {
    serde_json::from_str(raw).map_err(|e| {
        BindError::conversion(field, raw, node.type_name(), format!("invalid JSON: {e}"))
    })
}

/// Converts a structured value into a bound [`Value`] for `node`.
///
/// Errors name `field` (or a dotted child path below it).
///
/// # Examples
///
/// ```
/// use argbind_core::*;
/// use serde_json::json;
///
/// let registry = CoercerRegistry::default();
/// let user = SchemaNode::record("user", vec![
///     SchemaNode::scalar("name", ScalarKind::Str),
///     SchemaNode::scalar("id", ScalarKind::Int),
/// ]);
/// let input = json!({"name": "Alice", "id": "7"});
/// let value = from_structured(&registry, &user, &input, "user").unwrap();
/// assert_eq!(value.get("id"), Some(&Value::Int(7)));
///
/// let err = from_structured(&registry, &user, &json!({"name": "Alice"}), "user").unwrap_err();
/// assert_eq!(err, BindError::MissingArgument { field: "user.id".into() });
/// ```
pub fn from_structured(
    registry: &CoercerRegistry,
    node: &SchemaNode,
    value: &Json,
    field: &str,
) -> Result<Value, BindError> {
    convert(registry, node, value, field, false)
}

fn convert(
    registry: &CoercerRegistry,
    node: &SchemaNode,
    value: &Json,
    field: &str,
    strict: bool,
) -> Result<Value, BindError> {
    if value.is_null() && matches!(node.default, Some(Value::Null)) {
        return Ok(Value::Null);
    }

    match &node.kind {
        SchemaKind::Scalar(kind) => convert_scalar(registry, node, kind, value, field, strict),
        SchemaKind::LiteralSet(allowed) => {
            let text = scalar_text(value).ok_or_else(|| {
                BindError::conversion(
                    field,
                    value.to_string(),
                    node.type_name(),
                    "expected a string",
                )
            })?;
            if allowed.iter().any(|a| *a == text) {
                Ok(Value::Str(text))
            } else {
                Err(BindError::conversion(
                    field,
                    text,
                    node.type_name(),
                    "not one of the allowed values",
                ))
            }
        }
        SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
            let items = match parse_embedded(value) {
                Json::Array(items) => items,
                other => vec![other],
            };
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(convert(registry, element, item, field, strict)?);
            }
            Ok(match node.kind {
                SchemaKind::Sequence(_) => Value::List(out),
                _ => Value::Tuple(out),
            })
        }
        SchemaKind::FixedTuple(elements) => {
            let items = match parse_embedded(value) {
                Json::Array(items) => items,
                Json::Object(entries) => {
                    let mut items = Vec::with_capacity(elements.len());
                    for index in 0..elements.len() {
                        match entries.get(&index.to_string()) {
                            Some(item) => items.push(item.clone()),
                            None => return Err(BindError::missing(format!("{field}.{index}"))),
                        }
                    }
                    if let Some(extra) = entries
                        .keys()
                        .find(|k| k.parse::<usize>().map_or(true, |i| i >= elements.len()))
                    {
                        return Err(BindError::conversion(
                            field,
                            extra.clone(),
                            node.type_name(),
                            "unknown tuple index",
                        ));
                    }
                    items
                }
                other => {
                    return Err(BindError::conversion(
                        field,
                        other.to_string(),
                        node.type_name(),
                        "expected an array",
                    ));
                }
            };
            if items.len() < elements.len() {
                return Err(BindError::missing(format!("{field}.{}", items.len())));
            }
            if items.len() > elements.len() {
                return Err(BindError::conversion(
                    field,
                    Json::Array(items).to_string(),
                    node.type_name(),
                    format!("expected {} elements", elements.len()),
                ));
            }
            let mut out = Vec::with_capacity(items.len());
            for (index, (element, item)) in elements.iter().zip(&items).enumerate() {
                out.push(convert(registry, element, item, &format!("{field}.{index}"), strict)?);
            }
            Ok(Value::Tuple(out))
        }
        SchemaKind::Record(fields) => {
            let Json::Object(entries) = parse_embedded(value) else {
                return Err(BindError::conversion(
                    field,
                    value.to_string(),
                    node.type_name(),
                    "expected an object",
                ));
            };
            if let Some(unknown) = entries
                .keys()
                .find(|k| !fields.iter().any(|f| names_match(&f.name, k)))
            {
                return Err(BindError::conversion(
                    field,
                    unknown.clone(),
                    node.type_name(),
                    "unknown field",
                ));
            }
            let mut out = Vec::with_capacity(fields.len());
            for child in fields {
                let path = format!("{field}.{}", child.name);
                match entries.iter().find(|(k, _)| names_match(&child.name, k)) {
                    Some((_, item)) => {
                        let bound = convert(registry, child, item, &path, strict)?;
                        out.push((child.name.clone(), bound));
                    }
                    None => match &child.default {
                        Some(default) => out.push((child.name.clone(), default.clone())),
                        None if child.required => return Err(BindError::missing(path)),
                        None => {}
                    },
                }
            }
            Ok(Value::Record(out))
        }
        SchemaKind::Mapping { key, value: element } => {
            let Json::Object(entries) = parse_embedded(value) else {
                return Err(BindError::conversion(
                    field,
                    value.to_string(),
                    node.type_name(),
                    "expected an object",
                ));
            };
            let mut out = Vec::with_capacity(entries.len());
            for (k, item) in &entries {
                registry.coerce(key, k).map_err(|reason| {
                    BindError::conversion(field, k.clone(), key.type_name(), reason)
                })?;
                let bound = convert(registry, element, item, &format!("{field}.{k}"), strict)?;
                out.push((k.clone(), bound));
            }
            Ok(Value::Map(out))
        }
        SchemaKind::Sum(variants) => convert_sum(registry, node, variants, value, field),
    }
}

fn convert_scalar(
    registry: &CoercerRegistry,
    node: &SchemaNode,
    kind: &ScalarKind,
    value: &Json,
    field: &str,
    strict: bool,
) -> Result<Value, BindError> {
    let coercer = registry.get(kind).ok_or_else(|| {
        BindError::conversion(
            field,
            value.to_string(),
            node.type_name(),
            format!("no coercer registered for kind {:?}", kind.type_name()),
        )
    })?;
    if let Some(typed) = coercer.from_typed(value) {
        return Ok(typed);
    }
    match value {
        Json::String(raw) => coercer
            .coerce(raw)
            .map_err(|reason| BindError::conversion(field, raw.clone(), node.type_name(), reason)),
        Json::Number(_) | Json::Bool(_) if !strict => {
            let raw = value.to_string();
            coercer
                .coerce(&raw)
                .map_err(|reason| BindError::conversion(field, raw, node.type_name(), reason))
        }
        other => Err(BindError::conversion(
            field,
            other.to_string(),
            node.type_name(),
            "value has the wrong type",
        )),
    }
}

/// Sums try natively typed matches first, so `5` from a TOML file binds to
/// `int` in `str | int` while `"5"` still binds to `str`.
fn convert_sum(
    registry: &CoercerRegistry,
    node: &SchemaNode,
    variants: &[SchemaNode],
    value: &Json,
    field: &str,
) -> Result<Value, BindError> {
    if let Json::String(raw) = value {
        if allows_structured(registry, node, raw) {
            let decoded = decode_literal(node, raw, field)?;
            return convert_sum(registry, node, variants, &decoded, field);
        }
    } else {
        for variant in variants {
            if let Ok(bound) = convert(registry, variant, value, field, true) {
                return Ok(bound);
            }
        }
    }

    let mut tried = Vec::with_capacity(variants.len());
    for variant in variants {
        match convert(registry, variant, value, field, false) {
            Ok(bound) => return Ok(bound),
            Err(error) => tried.push(VariantFailure {
                variant: variant.type_name(),
                error,
            }),
        }
    }
    Err(BindError::NoMatchingVariant {
        field: field.to_string(),
        expected: node.type_name(),
        tried,
    })
}

/// Strings holding a JSON object or array are parsed in place; anything
/// else is returned unchanged.
fn parse_embedded(value: &Json) -> Json {
    if let Json::String(raw) = value {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str(raw) {
                return parsed;
            }
        }
    }
    value.clone()
}

fn scalar_text(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int() -> SchemaNode {
        SchemaNode::element(SchemaKind::Scalar(ScalarKind::Int))
    }

    fn string() -> SchemaNode {
        SchemaNode::element(SchemaKind::Scalar(ScalarKind::Str))
    }

    #[test]
    fn test_sum_prefers_native_types() {
        let registry = CoercerRegistry::default();
        let sum = SchemaNode::sum("v", vec![string(), int()]);
        assert_eq!(from_structured(&registry, &sum, &json!(5), "v"), Ok(Value::Int(5)));
        assert_eq!(
            from_structured(&registry, &sum, &json!("5"), "v"),
            Ok(Value::Str("5".into()))
        );
    }

    #[test]
    fn test_scalar_numbers_fall_back_to_coercion() {
        let registry = CoercerRegistry::default();
        let name = SchemaNode::scalar("name", ScalarKind::Str);
        assert_eq!(
            from_structured(&registry, &name, &json!(42), "name"),
            Ok(Value::Str("42".into()))
        );
        let count = SchemaNode::scalar("count", ScalarKind::Int);
        assert_eq!(
            from_structured(&registry, &count, &json!("0x10"), "count"),
            Ok(Value::Int(16))
        );
    }

    #[test]
    fn test_out_of_range_config_numbers_are_rejected() {
        let registry = CoercerRegistry::default();
        let count = SchemaNode::scalar("count", ScalarKind::Int);
        for value in [json!(1e20), json!(u64::MAX), json!(-1e19)] {
            let err = from_structured(&registry, &count, &value, "count").unwrap_err();
            assert!(
                matches!(
                    &err,
                    BindError::Conversion { field, reason, .. }
                        if field == "count" && reason.contains("out of range")
                ),
                "{value}: {err:?}"
            );
        }
        assert_eq!(
            from_structured(&registry, &count, &json!(i64::MAX), "count"),
            Ok(Value::Int(i64::MAX))
        );
    }

    #[test]
    fn test_single_value_wraps_into_sequence() {
        let registry = CoercerRegistry::default();
        let xs = SchemaNode::sequence("xs", int());
        assert_eq!(
            from_structured(&registry, &xs, &json!(3), "xs"),
            Ok(Value::List(vec![Value::Int(3)]))
        );
        assert_eq!(
            from_structured(&registry, &xs, &json!("[1, 2]"), "xs"),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn test_tuple_from_indexed_object() {
        let registry = CoercerRegistry::default();
        let point = SchemaNode::fixed_tuple("point", vec![int(), int()]);
        assert_eq!(
            from_structured(&registry, &point, &json!({"0": 1, "1": 2}), "point"),
            Ok(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(
            from_structured(&registry, &point, &json!([1]), "point"),
            Err(BindError::missing("point.1"))
        );
    }

    #[test]
    fn test_record_rejects_unknown_fields() {
        let registry = CoercerRegistry::default();
        let user = SchemaNode::record("user", vec![SchemaNode::scalar("name", ScalarKind::Str)]);
        let input = json!({"name": "A", "age": 3});
        let err = from_structured(&registry, &user, &input, "user").unwrap_err();
        assert!(matches!(err, BindError::Conversion { raw, .. } if raw == "age"));
    }

    #[test]
    fn test_null_only_for_optional() {
        let registry = CoercerRegistry::default();
        let opt = SchemaNode::scalar("opt", ScalarKind::Int).optional();
        assert_eq!(from_structured(&registry, &opt, &json!(null), "opt"), Ok(Value::Null));
        let req = SchemaNode::scalar("req", ScalarKind::Int);
        assert!(from_structured(&registry, &req, &json!(null), "req").is_err());
    }

    #[test]
    fn test_structured_decoding_rules() {
        let registry = CoercerRegistry::default();
        let record =
            SchemaNode::element(SchemaKind::Record(vec![SchemaNode::scalar("a", ScalarKind::Int)]));
        let with_str = SchemaNode::sum("v", vec![string(), record.clone()]);
        let without_str = SchemaNode::sum("v", vec![int(), record]);
        assert!(!allows_structured(&registry, &with_str, r#"{"a": 1}"#));
        assert!(allows_structured(&registry, &without_str, r#"{"a": 1}"#));
        assert!(!allows_structured(&registry, &without_str, "7"));

        let strings = SchemaNode::sequence("xs", string());
        assert!(!allows_structured(&registry, &strings, "[1]"));
        let ints = SchemaNode::sequence("xs", int());
        assert!(allows_structured(&registry, &ints, "[1]"));
    }
}
