//! String → value conversion for scalar kinds.
//!
//! A [`Coercer`] converts one raw token into a [`Value`]. The
//! [`CoercerRegistry`] maps every [`ScalarKind`] to its coercer; it starts
//! with the built-in kinds and accepts user registrations for
//! [`ScalarKind::Custom`] kinds. Once handed to a binder the registry is
//! only read, so one instance can be shared across threads.

use std::collections::HashMap;
use std::num::IntErrorKind;
use std::sync::Arc;

use crate::{ScalarKind, Value};

/// Converts raw strings (and optionally pre-typed structured values) into
/// [`Value`]s for one scalar kind.
///
/// Any `Fn(&str) -> Result<Value, String>` closure is a coercer.
///
/// # Examples
///
/// ```
/// use argbind_core::{Coercer, Value};
///
/// let upper = |raw: &str| -> Result<Value, String> { Ok(Value::Str(raw.to_uppercase())) };
/// assert_eq!(upper.coerce("abc"), Ok(Value::Str("ABC".into())));
/// assert!(!upper.accepts_any_string());
/// ```
pub trait Coercer: Send + Sync {
    /// Converts a raw token; the error is a short reason for diagnostics.
    fn coerce(&self, raw: &str) -> Result<Value, String>;

    /// Whether every raw string converts successfully. A sum with such a
    /// variant never attempts structured-literal decoding.
    fn accepts_any_string(&self) -> bool {
        false
    }

    /// Accepts an already-typed structured value (from configuration or a
    /// decoded JSON literal) without going through string conversion.
    /// Returning `None` routes the value through [`Coercer::coerce`].
    fn from_typed(&self, _value: &serde_json::Value) -> Option<Value> {
        None
    }
}

impl<F> Coercer for F
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync,
{
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        self(raw)
    }
}

/// Closure-backed coercer that can be flagged as a wrapper over a string.
///
/// # Examples
///
/// ```
/// use argbind_core::{Coercer, FnCoercer, Value};
///
/// let email = FnCoercer::new(|raw: &str| {
///     if raw.contains('@') {
///         Ok(Value::Str(raw.to_string()))
///     } else {
///         Err("missing '@'".to_string())
///     }
/// })
/// .string_compatible();
/// assert!(email.accepts_any_string());
/// assert!(email.coerce("nobody").is_err());
/// ```
pub struct FnCoercer<F> {
    f: F,
    string_compatible: bool,
}

impl<F> FnCoercer<F>
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            string_compatible: false,
        }
    }

    /// Marks the kind as a named wrapper over a string, which disables
    /// structured-literal decoding for sums containing it.
    pub fn string_compatible(mut self) -> Self {
        self.string_compatible = true;
        self
    }
}

impl<F> Coercer for FnCoercer<F>
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync,
{
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        (self.f)(raw)
    }

    fn accepts_any_string(&self) -> bool {
        self.string_compatible
    }
}

struct StrCoercer;

impl Coercer for StrCoercer {
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        Ok(Value::Str(raw.to_string()))
    }

    fn accepts_any_string(&self) -> bool {
        true
    }

    fn from_typed(&self, value: &serde_json::Value) -> Option<Value> {
        value.as_str().map(|s| Value::Str(s.to_string()))
    }
}

struct IntCoercer;

impl Coercer for IntCoercer {
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        parse_int(raw).map(Value::Int)
    }

    fn from_typed(&self, value: &serde_json::Value) -> Option<Value> {
        if let Some(i) = value.as_i64() {
            return Some(Value::Int(i));
        }
        if value.is_u64() {
            return None;
        }
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && in_i64_range(*f))
            .map(|f| Value::Int(f as i64))
    }
}

/// Parses integers the way shells users expect: `0x`/`0b`/`0o` prefixes,
/// and float text rounded half-to-even (`"30.0"` → 30).
fn parse_int(raw: &str) -> Result<i64, String> {
    let lowered = raw.trim().to_ascii_lowercase();
    let (negative, digits) = match lowered.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, lowered.strip_prefix('+').unwrap_or(&lowered)),
    };

    let radix = [("0x", 16), ("0b", 2), ("0o", 8)]
        .into_iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|rest| (rest, radix)));
    if let Some((rest, radix)) = radix {
        let magnitude = i64::from_str_radix(rest, radix).map_err(|e| e.to_string())?;
        return Ok(if negative { -magnitude } else { magnitude });
    }

    match lowered.parse::<i64>() {
        Ok(i) => return Ok(i),
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            return Err(format!("integer {raw:?} is out of range"));
        }
        Err(_) => {}
    }
    let f: f64 = lowered
        .parse()
        .map_err(|_| format!("invalid integer literal {raw:?}"))?;
    if !f.is_finite() {
        return Err(format!("invalid integer literal {raw:?}"));
    }
    let rounded = f.round_ties_even();
    if !in_i64_range(rounded) {
        return Err(format!("integer {raw:?} is out of range"));
    }
    Ok(rounded as i64)
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn in_i64_range(f: f64) -> bool {
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

struct FloatCoercer;

impl Coercer for FloatCoercer {
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        raw.trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string())
    }

    fn from_typed(&self, value: &serde_json::Value) -> Option<Value> {
        value.as_f64().map(Value::Float)
    }
}

struct BoolCoercer;

impl Coercer for BoolCoercer {
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        match raw.to_ascii_lowercase().as_str() {
            "yes" | "y" | "1" | "true" | "t" => Ok(Value::Bool(true)),
            "no" | "n" | "0" | "false" | "f" => Ok(Value::Bool(false)),
            _ => Err(format!("{raw:?} is not a boolean")),
        }
    }

    fn from_typed(&self, value: &serde_json::Value) -> Option<Value> {
        value.as_bool().map(Value::Bool)
    }
}

struct BytesCoercer;

impl Coercer for BytesCoercer {
    fn coerce(&self, raw: &str) -> Result<Value, String> {
        Ok(Value::Bytes(raw.as_bytes().to_vec()))
    }

    fn accepts_any_string(&self) -> bool {
        true
    }
}

/// Lookup table from [`ScalarKind`] to [`Coercer`].
///
/// # Examples
///
/// ```
/// use argbind_core::{CoercerRegistry, ScalarKind, Value};
///
/// let mut registry = CoercerRegistry::default();
/// assert_eq!(registry.coerce(&ScalarKind::Int, "0x10"), Ok(Value::Int(16)));
///
/// registry.register(ScalarKind::custom("percent"), |raw: &str| {
///     raw.trim_end_matches('%')
///         .parse::<f64>()
///         .map(|p| Value::Float(p / 100.0))
///         .map_err(|e| e.to_string())
/// });
/// assert_eq!(
///     registry.coerce(&ScalarKind::custom("percent"), "50%"),
///     Ok(Value::Float(0.5))
/// );
/// ```
#[derive(Clone)]
pub struct CoercerRegistry {
    coercers: HashMap<ScalarKind, Arc<dyn Coercer>>,
}

impl CoercerRegistry {
    /// Creates a registry with no coercers at all.
    pub fn empty() -> Self {
        Self {
            coercers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the coercer for `kind`.
    pub fn register(&mut self, kind: ScalarKind, coercer: impl Coercer + 'static) -> &mut Self {
        self.coercers.insert(kind, Arc::new(coercer));
        self
    }

    pub fn get(&self, kind: &ScalarKind) -> Option<&dyn Coercer> {
        self.coercers.get(kind).map(|c| c.as_ref())
    }

    pub fn contains(&self, kind: &ScalarKind) -> bool {
        self.coercers.contains_key(kind)
    }

    /// Converts `raw` with the coercer registered for `kind`.
    pub fn coerce(&self, kind: &ScalarKind, raw: &str) -> Result<Value, String> {
        match self.get(kind) {
            Some(coercer) => coercer.coerce(raw),
            None => Err(format!("no coercer registered for kind {:?}", kind.type_name())),
        }
    }

    /// Whether `kind` converts every raw string. Unregistered kinds do not.
    pub fn accepts_any_string(&self, kind: &ScalarKind) -> bool {
        self.get(kind).is_some_and(|c| c.accepts_any_string())
    }
}

impl Default for CoercerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(ScalarKind::Str, StrCoercer)
            .register(ScalarKind::Path, StrCoercer)
            .register(ScalarKind::Int, IntCoercer)
            .register(ScalarKind::Float, FloatCoercer)
            .register(ScalarKind::Bool, BoolCoercer)
            .register(ScalarKind::Bytes, BytesCoercer);
        registry
    }
}

impl std::fmt::Debug for CoercerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.coercers.keys().map(ScalarKind::type_name).collect();
        kinds.sort_unstable();
        f.debug_struct("CoercerRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefixes_and_float_text() {
        let registry = CoercerRegistry::default();
        assert_eq!(registry.coerce(&ScalarKind::Int, "0b101"), Ok(Value::Int(5)));
        assert_eq!(registry.coerce(&ScalarKind::Int, "0o17"), Ok(Value::Int(15)));
        assert_eq!(registry.coerce(&ScalarKind::Int, "-0x10"), Ok(Value::Int(-16)));
        assert_eq!(registry.coerce(&ScalarKind::Int, "30.0"), Ok(Value::Int(30)));
        assert_eq!(registry.coerce(&ScalarKind::Int, "2.5"), Ok(Value::Int(2)));
        assert!(registry.coerce(&ScalarKind::Int, "ten").is_err());
    }

    #[test]
    fn test_bool_is_conservative() {
        let registry = CoercerRegistry::default();
        assert_eq!(registry.coerce(&ScalarKind::Bool, "Yes"), Ok(Value::Bool(true)));
        assert_eq!(registry.coerce(&ScalarKind::Bool, "f"), Ok(Value::Bool(false)));
        assert!(registry.coerce(&ScalarKind::Bool, "maybe").is_err());
    }

    #[test]
    fn test_string_compatibility() {
        let mut registry = CoercerRegistry::default();
        assert!(registry.accepts_any_string(&ScalarKind::Str));
        assert!(registry.accepts_any_string(&ScalarKind::Path));
        assert!(!registry.accepts_any_string(&ScalarKind::Int));

        registry.register(
            ScalarKind::custom("slug"),
            FnCoercer::new(|raw: &str| Ok(Value::Str(raw.to_lowercase()))).string_compatible(),
        );
        assert!(registry.accepts_any_string(&ScalarKind::custom("slug")));
        assert!(!registry.accepts_any_string(&ScalarKind::custom("unknown")));
    }

    #[test]
    fn test_unregistered_kind_errors() {
        let registry = CoercerRegistry::default();
        let err = registry
            .coerce(&ScalarKind::custom("date"), "2024-01-01")
            .unwrap_err();
        assert!(err.contains("date"));
    }

    #[test]
    fn test_typed_values() {
        let registry = CoercerRegistry::default();
        let int = registry.get(&ScalarKind::Int).unwrap();
        assert_eq!(int.from_typed(&serde_json::json!(4)), Some(Value::Int(4)));
        assert_eq!(int.from_typed(&serde_json::json!(4.0)), Some(Value::Int(4)));
        assert_eq!(int.from_typed(&serde_json::json!("4")), None);
        assert_eq!(int.from_typed(&serde_json::json!(u64::MAX)), None);
        assert_eq!(int.from_typed(&serde_json::json!(1e20)), None);
    }

    #[test]
    fn test_int_overflow_is_an_error() {
        let registry = CoercerRegistry::default();
        for raw in ["99999999999999999999", "-99999999999999999999", "1e30", "-1e30", "9.3e18"] {
            let err = registry.coerce(&ScalarKind::Int, raw).unwrap_err();
            assert!(err.contains("out of range"), "{raw}: {err}");
        }
        assert_eq!(
            registry.coerce(&ScalarKind::Int, "9223372036854775807"),
            Ok(Value::Int(i64::MAX))
        );
        assert_eq!(
            registry.coerce(&ScalarKind::Int, "-9.2e18"),
            Ok(Value::Int(-9_200_000_000_000_000_000))
        );
    }
}
