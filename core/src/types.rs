//! Schema type definitions for parameter shape modeling.
//!
//! This module defines the abstract description of a parameter that the
//! binder walks. A [`SchemaNode`] is built once per command registration
//! (usually by an adapter reading language-native declarations) and is then
//! shared read-only across every invocation. The types derive [`serde`]
//! traits so signatures can be stored as JSON or YAML.

use serde::{Deserialize, Serialize};

use crate::Value;

/// Scalar value kind, resolved to a [`Coercer`](crate::Coercer) through the
/// [`CoercerRegistry`](crate::CoercerRegistry).
///
/// # Examples
///
/// ```
/// use argbind_core::ScalarKind;
///
/// assert_eq!(ScalarKind::Int.type_name(), "int");
/// assert_eq!(ScalarKind::custom("email").type_name(), "email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Any string.
    Str,
    /// Integer (decimal, `0x`, `0b`, `0o`; float text is rounded).
    Int,
    Float,
    /// `yes/no`, `true/false`, `1/0` and friends.
    Bool,
    /// Filesystem path (kept as a string).
    Path,
    /// UTF-8 encoded bytes.
    Bytes,
    /// User-registered kind, looked up by name.
    Custom(String),
}

impl ScalarKind {
    /// Creates a user-registered kind.
    pub fn custom(name: impl Into<String>) -> Self {
        ScalarKind::Custom(name.into())
    }

    /// Short type name used in error messages and parameter metadata.
    pub fn type_name(&self) -> &str {
        match self {
            ScalarKind::Str => "str",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Path => "path",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Custom(name) => name,
        }
    }
}

/// How a top-level parameter or record field may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamBinding {
    /// Only by position; not addressable as `--name`.
    PositionalOnly,
    /// Only as `--name`; never consumes positional tokens.
    KeywordOnly,
    /// Either form (the default).
    #[default]
    PositionalOrKeyword,
}

/// Shape of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Single value converted by the registered coercer.
    Scalar(ScalarKind),
    /// Exact, case-sensitive set of allowed strings.
    LiteralSet(Vec<String>),
    /// Homogeneous list; repeated flags aggregate.
    Sequence(Box<SchemaNode>),
    /// String-keyed mapping addressed as `--field.<key>`.
    Mapping {
        key: ScalarKind,
        value: Box<SchemaNode>,
    },
    /// Named fields in declaration order.
    Record(Vec<SchemaNode>),
    /// Positional elements of fixed count.
    FixedTuple(Vec<SchemaNode>),
    /// Any number of elements of one shape.
    VariadicTuple(Box<SchemaNode>),
    /// Candidate shapes tried in declaration order.
    Sum(Vec<SchemaNode>),
}

/// Immutable description of one parameter or nested field.
///
/// Element nodes (sequence elements, tuple members, sum variants) may leave
/// `name` empty; record fields and top-level parameters must be named.
///
/// # Examples
///
/// ```
/// use argbind_core::{SchemaNode, ScalarKind};
///
/// let user = SchemaNode::record("user", vec![
///     SchemaNode::scalar("name", ScalarKind::Str),
///     SchemaNode::scalar("id", ScalarKind::Int),
/// ]);
/// assert_eq!(user.children().len(), 2);
/// assert_eq!(user.positional_arity(), 2);
/// assert!(user.required);
///
/// let verbose = SchemaNode::flag("verbose").with_alias("-v");
/// assert!(!verbose.required);
/// assert_eq!(verbose.keyword_arity(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Field or parameter name (unique within its enclosing record).
    #[serde(default)]
    pub name: String,
    pub kind: SchemaKind,
    /// Whether binding fails when no value and no default are available.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Pre-set value used when nothing else supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub binding: ParamBinding,
    /// Extra flags (e.g. `-v`) for top-level parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Help text passed through to renderers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_required() -> bool {
    true
}

impl SchemaNode {
    /// Creates a required node of the given kind.
    pub fn new(name: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            binding: ParamBinding::default(),
            aliases: Vec::new(),
            description: None,
        }
    }

    /// Creates an unnamed element node.
    pub fn element(kind: SchemaKind) -> Self {
        Self::new("", kind)
    }

    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, SchemaKind::Scalar(kind))
    }

    /// Creates an optional keyword-only boolean defaulting to `false`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarKind::Bool)
            .with_default(Value::Bool(false))
            .keyword_only()
    }

    pub fn literal<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            SchemaKind::LiteralSet(allowed.into_iter().map(Into::into).collect()),
        )
    }

    pub fn sequence(name: impl Into<String>, element: SchemaNode) -> Self {
        Self::new(name, SchemaKind::Sequence(Box::new(element)))
    }

    /// Creates a mapping with string keys.
    pub fn mapping(name: impl Into<String>, value: SchemaNode) -> Self {
        Self::new(
            name,
            SchemaKind::Mapping {
                key: ScalarKind::Str,
                value: Box::new(value),
            },
        )
    }

    pub fn record(name: impl Into<String>, fields: Vec<SchemaNode>) -> Self {
        Self::new(name, SchemaKind::Record(fields))
    }

    pub fn fixed_tuple(name: impl Into<String>, elements: Vec<SchemaNode>) -> Self {
        Self::new(name, SchemaKind::FixedTuple(elements))
    }

    pub fn variadic_tuple(name: impl Into<String>, element: SchemaNode) -> Self {
        Self::new(name, SchemaKind::VariadicTuple(Box::new(element)))
    }

    pub fn sum(name: impl Into<String>, variants: Vec<SchemaNode>) -> Self {
        Self::new(name, SchemaKind::Sum(variants))
    }

    /// Marks the node optional with a `Null` default.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self.default = Some(Value::Null);
        self
    }

    /// Sets a default and marks the node optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn positional_only(mut self) -> Self {
        self.binding = ParamBinding::PositionalOnly;
        self
    }

    pub fn keyword_only(mut self) -> Self {
        self.binding = ParamBinding::KeywordOnly;
        self
    }

    /// Returns child nodes: record fields, tuple members, sum variants, or
    /// the single element/value node of a collection.
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            SchemaKind::Record(children)
            | SchemaKind::FixedTuple(children)
            | SchemaKind::Sum(children) => children,
            SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
                std::slice::from_ref(element)
            }
            SchemaKind::Mapping { value, .. } => std::slice::from_ref(value),
            SchemaKind::Scalar(_) | SchemaKind::LiteralSet(_) => &[],
        }
    }

    /// Finds a record field by name, treating `_` and `-` as equal.
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Record(fields) => fields.iter().find(|f| names_match(&f.name, name)),
            _ => None,
        }
    }

    pub fn accepts_positional(&self) -> bool {
        self.binding != ParamBinding::KeywordOnly
    }

    pub fn accepts_keyword(&self) -> bool {
        self.binding != ParamBinding::PositionalOnly
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, SchemaKind::Scalar(ScalarKind::Bool))
    }

    /// `true` for sequences and variadic tuples, which capture greedily.
    pub fn consumes_all(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::Sequence(_) | SchemaKind::VariadicTuple(_)
        )
    }

    /// Number of positional tokens one value (or one element group of a
    /// collection) occupies.
    pub fn positional_arity(&self) -> usize {
        match &self.kind {
            SchemaKind::Scalar(_) | SchemaKind::LiteralSet(_) | SchemaKind::Mapping { .. } => 1,
            SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
                element.positional_arity()
            }
            SchemaKind::Record(children) | SchemaKind::FixedTuple(children) => {
                children.iter().map(SchemaNode::positional_arity).sum()
            }
            SchemaKind::Sum(variants) => variants.first().map_or(1, SchemaNode::positional_arity),
        }
    }

    /// `true` when a bare `--name` binds `true` without claiming a value:
    /// booleans, sums with a boolean variant, and collections of booleans.
    pub fn is_implicit_flag(&self) -> bool {
        match &self.kind {
            SchemaKind::Scalar(ScalarKind::Bool) => true,
            SchemaKind::Sum(variants) => variants.iter().any(SchemaNode::is_bool),
            SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
                element.is_implicit_flag()
            }
            _ => false,
        }
    }

    /// Number of tokens a bare `--name` claims after itself.
    pub fn keyword_arity(&self) -> usize {
        if self.is_implicit_flag() {
            return 0;
        }
        match &self.kind {
            SchemaKind::Sum(variants) => variants.first().map_or(1, SchemaNode::keyword_arity),
            _ => self.positional_arity(),
        }
    }

    /// Human-readable type description, e.g. `list[int]` or `int | str`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            SchemaKind::Scalar(kind) => kind.type_name().to_string(),
            SchemaKind::LiteralSet(allowed) => format!("{{{}}}", allowed.join(", ")),
            SchemaKind::Sequence(element) => format!("list[{}]", element.type_name()),
            SchemaKind::Mapping { key, value } => {
                format!("dict[{}, {}]", key.type_name(), value.type_name())
            }
            SchemaKind::Record(_) if !self.name.is_empty() => format!("record {}", self.name),
            SchemaKind::Record(fields) => format!(
                "record {{{}}}",
                fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SchemaKind::FixedTuple(elements) => format!(
                "tuple[{}]",
                elements
                    .iter()
                    .map(SchemaNode::type_name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            SchemaKind::VariadicTuple(element) => format!("tuple[{}, ...]", element.type_name()),
            SchemaKind::Sum(variants) => variants
                .iter()
                .map(SchemaNode::type_name)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Normalizes a name for matching: `_` and `-` are interchangeable.
pub(crate) fn normalize_name(name: &str) -> String {
    name.replace('_', "-")
}

pub(crate) fn names_match(declared: &str, supplied: &str) -> bool {
    normalize_name(declared) == normalize_name(supplied)
}
