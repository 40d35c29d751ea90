//! Bound value tree.
//!
//! A [`Value`] is what the binder produces for one parameter: a scalar, a
//! homogeneous list, a tuple, a string-keyed mapping or a record with its
//! fields in declaration order. Values serialize as natural JSON and can be
//! re-rendered as dotted keyword tokens with [`Value::to_cli_tokens`].

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// A typed value bound from CLI tokens, configuration, or a declared default.
///
/// # Examples
///
/// ```
/// use argbind_core::Value;
///
/// let user = Value::Record(vec![
///     ("name".into(), Value::Str("Alice".into())),
///     ("id".into(), Value::Int(7)),
/// ]);
/// assert_eq!(user.get("id"), Some(&Value::Int(7)));
/// assert_eq!(
///     serde_json::to_string(&user).unwrap(),
///     r#"{"name":"Alice","id":7}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Value {
    /// Absent optional value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Homogeneous sequence.
    List(Vec<Value>),
    /// Fixed or variadic tuple.
    Tuple(Vec<Value>),
    /// String-keyed mapping in insertion order.
    Map(Vec<(String, Value)>),
    /// Record fields in declaration order.
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Returns the string payload of a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements of a list or tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a field of a record or a key of a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) | Value::Record(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders this value as dotted keyword tokens rooted at `path`.
    ///
    /// Records and mappings expand into one token per leaf
    /// (`--user.name=Alice`), lists repeat the flag once per element, and
    /// tuples use dot-indexed paths (`--point.0=1`).
    ///
    /// # Examples
    ///
    /// ```
    /// use argbind_core::Value;
    ///
    /// let v = Value::Record(vec![
    ///     ("name".into(), Value::Str("A".into())),
    ///     ("tags".into(), Value::List(vec![Value::Int(1), Value::Int(2)])),
    /// ]);
    /// assert_eq!(
    ///     v.to_cli_tokens("user"),
    ///     vec!["--user.name=A", "--user.tags=1", "--user.tags=2"]
    /// );
    /// ```
    pub fn to_cli_tokens(&self, path: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.push_cli_tokens(path, &mut out);
        out
    }

    fn push_cli_tokens(&self, path: &str, out: &mut Vec<String>) {
        match self {
            Value::Null => {}
            Value::List(items) => {
                for item in items {
                    match item.scalar_text() {
                        Some(text) => out.push(format!("--{path}={text}")),
                        None => out.push(format!("--{path}={}", json_text(item))),
                    }
                }
            }
            Value::Tuple(items) => {
                for (index, item) in items.iter().enumerate() {
                    item.push_cli_tokens(&format!("{path}.{index}"), out);
                }
            }
            Value::Map(entries) | Value::Record(entries) => {
                for (key, item) in entries {
                    item.push_cli_tokens(&format!("{path}.{key}"), out);
                }
            }
            scalar => {
                if let Some(text) = scalar.scalar_text() {
                    out.push(format!("--{path}={text}"));
                }
            }
        }
    }

    fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) | Value::Record(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in entries {
                    map.serialize_entry(key, item)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}
