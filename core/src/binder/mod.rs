//! Recursive, type-directed binding of tokens to a command signature.
//!
//! Binding runs in two passes over one [`TokenStream`]:
//!
//! 1. **Keyword pass.** Every keyword token that resolves to a field path is
//!    claimed together with the values it needs (its keyword arity, or the
//!    attached `=value`). Unresolved keywords stay in the stream.
//! 2. **Schema walk.** Parameters are visited in declaration order. For each
//!    node the binder prefers keyword occurrences for its exact path, then
//!    composes containers from keyword sub-paths, then consumes positional
//!    tokens, then falls back to overlay soft defaults and finally the
//!    declared default.
//!
//! Failures are collected per top-level parameter; whatever the walk did
//! not consume is reported as unused, in input order.

mod keywords;
mod resolve;
mod structured;

pub use resolve::{enumerate_slots, resolve_slot, SlotInfo, SlotMatch};
pub use structured::from_structured;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use self::keywords::{KeywordIndex, Occurrence};
use self::resolve::resolve_keyword;
use self::structured::{allows_structured, decode_literal};
use crate::{
    BindError, CoercerRegistry, CommandSignature, ParamBinding, ScalarKind, SchemaKind,
    SchemaNode, SoftDefaults, TokenKind, TokenStream, Value, tokenize,
};

static NO_DEFAULTS: SoftDefaults = SoftDefaults::new();

/// Outcome of binding one command invocation.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let signature = CommandSignature::new("greet")
///     .with_parameter(SchemaNode::scalar("name", ScalarKind::Str))
///     .with_parameter(SchemaNode::scalar("times", ScalarKind::Int).with_default(1i64));
/// let registry = CoercerRegistry::default();
///
/// let result = Binder::new(&registry).bind(&signature, ["Alice", "--extra"]);
/// assert_eq!(result.get("name"), Some(&Value::Str("Alice".into())));
/// assert_eq!(result.get("times"), Some(&Value::Int(1)));
/// assert_eq!(result.unused, vec!["--extra"]);
/// assert_eq!(result.to_cli_tokens(), vec!["--name=Alice", "--times=1"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundResult {
    /// Bound top-level parameters in declaration order.
    #[serde(serialize_with = "serialize_arguments")]
    pub arguments: Vec<(String, Value)>,
    pub errors: Vec<BindError>,
    /// Tokens nothing consumed, in input order.
    pub unused: Vec<String>,
}

fn serialize_arguments<S: Serializer>(
    arguments: &[(String, Value)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(arguments.len()))?;
    for (name, value) in arguments {
        map.serialize_entry(name, value)?;
    }
    map.end()
}

impl BoundResult {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into the bound arguments, or every collected error.
    pub fn into_result(self) -> Result<Vec<(String, Value)>, Vec<BindError>> {
        if self.errors.is_empty() {
            Ok(self.arguments)
        } else {
            Err(self.errors)
        }
    }

    /// Renders the bound arguments back into keyword tokens.
    pub fn to_cli_tokens(&self) -> Vec<String> {
        self.arguments
            .iter()
            .flat_map(|(name, value)| value.to_cli_tokens(&name.replace('_', "-")))
            .collect()
    }
}

/// Binds tokens against signatures using one coercer registry and,
/// optionally, overlay-supplied soft defaults.
///
/// A binder only reads its inputs, so it can be shared across threads and
/// reused for any number of invocations.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'a> {
    registry: &'a CoercerRegistry,
    defaults: &'a SoftDefaults,
}

impl<'a> Binder<'a> {
    pub fn new(registry: &'a CoercerRegistry) -> Self {
        Self {
            registry,
            defaults: &NO_DEFAULTS,
        }
    }

    /// Uses `defaults` wherever no CLI token supplies a slot.
    pub fn with_defaults(mut self, defaults: &'a SoftDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Binds raw, already shell-split tokens to `signature`.
    pub fn bind<I, S>(&self, signature: &CommandSignature, raw: I) -> BoundResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokenize(raw);
        debug!(
            command = %signature.command,
            tokens = tokens.len(),
            soft_defaults = self.defaults.len(),
            "Binding command"
        );

        let mut stream = TokenStream::new(tokens);
        let mut ctx = BindingContext {
            registry: self.registry,
            defaults: self.defaults,
            keywords: KeywordIndex::default(),
        };
        let mut pending = ctx.claim_keywords(&signature.parameters, &mut stream);

        let mut result = BoundResult::default();
        let params = &signature.parameters;
        // Positional-or-keyword parameters already given as `--name`.
        let mut by_keyword: Vec<String> = Vec::new();
        let mut positional = true;
        for (position, param) in params.iter().enumerate() {
            let slot = Slot::root(&param.name);
            let either = param.binding == ParamBinding::PositionalOrKeyword;
            if let Some(i) = pending.iter().position(|e| e.parameter() == param.name) {
                if either {
                    by_keyword.push(param.name.clone());
                }
                result.errors.push(pending.remove(i));
                ctx.keywords.discard_under(&slot.path);
                continue;
            }

            let supplied = either && ctx.keyword_supplied(param, &slot);
            if supplied {
                by_keyword.push(param.name.clone());
            }
            let out_of_order = either
                && !supplied
                && positional
                && !by_keyword.is_empty()
                && stream.positional_run() > 0;
            if let Some(token) = stream.peek_positional().filter(|_| out_of_order) {
                let token = token.to_string();
                debug!(parameter = %param.name, token = %token, "Positional value out of order");
                result.errors.push(BindError::ArgumentOrder {
                    field: param.name.clone(),
                    token,
                    after: by_keyword.clone(),
                });
                ctx.keywords.discard_under(&slot.path);
                positional = false;
                continue;
            }

            if param.consumes_all() && param.accepts_positional() {
                stream.reserve(reserved_tail(&params[position + 1..]));
            }
            let outcome = match ctx.bind_node(param, &slot, &mut stream, positional) {
                Ok(None) => ctx.fallback(param, &slot),
                other => other,
            };
            stream.reserve(0);

            match outcome {
                Ok(Some(value)) => {
                    trace!(parameter = %param.name, "Bound parameter");
                    result.arguments.push((param.name.clone(), value));
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(parameter = %param.name, error = %error, "Parameter failed to bind");
                    ctx.keywords.discard_under(&slot.path);
                    result.errors.push(error);
                }
            }
        }
        result.errors.extend(pending);

        let mut leftovers: Vec<(usize, String)> = stream
            .remaining()
            .into_iter()
            .map(|t| (t.index, t.raw.clone()))
            .collect();
        leftovers.extend(ctx.keywords.leftover_tokens().cloned());
        leftovers.sort_by_key(|(index, _)| *index);
        result.unused = leftovers.into_iter().map(|(_, raw)| raw).collect();

        debug!(
            command = %signature.command,
            bound = result.arguments.len(),
            errors = result.errors.len(),
            unused = result.unused.len(),
            "Binding finished"
        );
        result
    }
}

/// Binds `raw` to `signature` in one call.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let signature = CommandSignature::new("add").with_parameter(
///     SchemaNode::record("user", vec![
///         SchemaNode::scalar("name", ScalarKind::Str),
///         SchemaNode::scalar("id", ScalarKind::Int),
///     ]),
/// );
/// let result = bind(
///     &signature,
///     ["--user.id=7", "--user.name", "Alice"],
///     &CoercerRegistry::default(),
///     &SoftDefaults::new(),
/// );
/// let user = result.get("user").unwrap();
/// assert_eq!(user.get("name"), Some(&Value::Str("Alice".into())));
/// assert_eq!(user.get("id"), Some(&Value::Int(7)));
/// ```
pub fn bind<I, S>(
    signature: &CommandSignature,
    raw: I,
    registry: &CoercerRegistry,
    defaults: &SoftDefaults,
) -> BoundResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Binder::new(registry).with_defaults(defaults).bind(signature, raw)
}

/// Positional tokens a greedy parameter leaves for the positional-only
/// parameters directly after it.
fn reserved_tail(rest: &[SchemaNode]) -> usize {
    rest.iter()
        .take_while(|p| p.binding == ParamBinding::PositionalOnly)
        .map(SchemaNode::positional_arity)
        .sum()
}

/// Where a node sits: its field path, whether keyword occurrences may
/// address it, and whether soft defaults apply.
#[derive(Debug, Clone)]
struct Slot {
    path: Vec<String>,
    keyed: bool,
    defaults: bool,
}

impl Slot {
    fn root(name: &str) -> Self {
        Self {
            path: vec![name.to_string()],
            keyed: true,
            defaults: true,
        }
    }

    fn child(&self, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self {
            path,
            keyed: self.keyed,
            defaults: self.defaults,
        }
    }

    /// Slot of a sequence element or of values claimed by a keyword.
    fn element(&self) -> Self {
        Self {
            path: self.path.clone(),
            keyed: false,
            defaults: false,
        }
    }

    /// Same path inside an atomic overlay slot.
    fn atomic(&self) -> Self {
        Self {
            path: self.path.clone(),
            keyed: self.keyed,
            defaults: false,
        }
    }

    fn field(&self) -> String {
        self.path.join(".")
    }
}

struct BindingContext<'a> {
    registry: &'a CoercerRegistry,
    defaults: &'a SoftDefaults,
    keywords: KeywordIndex,
}

impl BindingContext<'_> {
    /// First pass: claims resolvable keywords and their values. Returns at
    /// most one error per parameter.
    fn claim_keywords(
        &mut self,
        params: &[SchemaNode],
        stream: &mut TokenStream,
    ) -> Vec<BindError> {
        let mut errors: Vec<BindError> = Vec::new();

        for position in 0..stream.tokens().len() {
            if stream.is_consumed(position) {
                continue;
            }
            let token = stream.tokens()[position].clone();
            let TokenKind::Keyword { flag, path, value } = &token.kind else {
                continue;
            };
            let Some(resolved) = resolve_keyword(params, flag, path) else {
                trace!(flag = %flag, "Unknown keyword left unused");
                continue;
            };

            let field = resolved.path.join(".");
            let mut occurrence = Occurrence {
                path: resolved.path,
                values: Vec::new(),
                negated: resolved.negated,
                empty: resolved.empty,
                tokens: vec![(token.index, token.raw.clone())],
            };

            if let Some(value) = value {
                occurrence.values.push(value.clone());
            } else if !occurrence.empty {
                let (claimed, wanted) = self.claim_values(resolved.node, position, stream);
                if claimed.len() < wanted {
                    let error = BindError::missing(field);
                    if !errors.iter().any(|e| e.parameter() == error.parameter()) {
                        errors.push(error);
                    }
                    continue;
                }
                for index in claimed {
                    let claimed_token = stream.tokens()[index].clone();
                    stream.claim(index);
                    occurrence
                        .values
                        .push(claimed_token.positional_value().unwrap_or_default().to_string());
                    occurrence.tokens.push((claimed_token.index, claimed_token.raw));
                }
            }
            stream.claim(position);

            trace!(field = %field, values = ?occurrence.values, "Claimed keyword");
            self.keywords.push(occurrence);
        }

        errors
    }

    /// Picks the unconsumed positional tokens after `position` that a bare
    /// keyword for `node` claims. A leading JSON literal counts as the
    /// whole value.
    fn claim_values(
        &self,
        node: &SchemaNode,
        position: usize,
        stream: &TokenStream,
    ) -> (Vec<usize>, usize) {
        let mut wanted = node.keyword_arity();
        let mut claimed = Vec::with_capacity(wanted);
        let mut next = position + 1;

        while claimed.len() < wanted {
            let unconsumed = (next..stream.tokens().len()).find(|i| !stream.is_consumed(*i));
            let Some(index) = unconsumed else {
                break;
            };
            let value = match &stream.tokens()[index].kind {
                TokenKind::Positional { value, forced: false } => value,
                _ => break,
            };
            if claimed.is_empty() && wanted > 1 && allows_structured(self.registry, node, value) {
                wanted = 1;
            }
            claimed.push(index);
            next = index + 1;
        }

        (claimed, wanted)
    }

    /// `true` when keywords address `param` as a whole. Records only count
    /// when given as one literal, since their fields may still bind by
    /// position.
    fn keyword_supplied(&self, param: &SchemaNode, slot: &Slot) -> bool {
        self.keywords.has_exact(&slot.path)
            || (!matches!(param.kind, SchemaKind::Record(_))
                && self.keywords.has_under(&slot.path))
    }

    /// Binds one node. `Ok(None)` means nothing supplied it; the caller
    /// decides between the declared default, a missing error, or omission.
    fn bind_node(
        &mut self,
        node: &SchemaNode,
        slot: &Slot,
        stream: &mut TokenStream,
        positional: bool,
    ) -> Result<Option<Value>, BindError> {
        let positional = positional && node.accepts_positional();

        if slot.keyed {
            let occurrences = self.keywords.take_exact(&slot.path);
            if !occurrences.is_empty() {
                return self.bind_occurrences(node, slot, occurrences).map(Some);
            }
        }

        match &node.kind {
            SchemaKind::Record(fields) => {
                return self.bind_record(node, fields, slot, stream, positional);
            }
            SchemaKind::Sum(variants) => {
                return self.bind_sum(node, variants, slot, stream, positional);
            }
            SchemaKind::Mapping { key, value }
                if slot.keyed && self.keywords.has_under(&slot.path) =>
            {
                return self.bind_mapping_keywords(key, value, slot, stream).map(Some);
            }
            SchemaKind::FixedTuple(elements)
                if slot.keyed && self.keywords.has_under(&slot.path) =>
            {
                return self.bind_tuple_keywords(elements, slot, stream).map(Some);
            }
            _ => {}
        }

        if positional && self.starts_positional(node, stream) {
            return self.bind_positional(node, slot, stream).map(Some);
        }
        self.soft_default(node, slot)
    }

    fn starts_positional(&self, node: &SchemaNode, stream: &TokenStream) -> bool {
        if stream.positional_run() == 0 {
            return false;
        }
        match (&node.kind, stream.peek_positional()) {
            (_, None) => false,
            (SchemaKind::Mapping { .. }, Some(raw)) => allows_structured(self.registry, node, raw),
            _ => true,
        }
    }

    /// Binds keyword occurrences that address `node` exactly.
    fn bind_occurrences(
        &mut self,
        node: &SchemaNode,
        slot: &Slot,
        occurrences: Vec<Occurrence>,
    ) -> Result<Value, BindError> {
        let field = slot.field();

        if let SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) = &node.kind {
            let mut items = Vec::new();
            for occurrence in occurrences {
                if occurrence.empty {
                    if let Some(raw) = occurrence.values.first() {
                        return Err(BindError::conversion(
                            field,
                            raw,
                            node.type_name(),
                            "an empty flag takes no value",
                        ));
                    }
                    items.clear();
                    continue;
                }
                if occurrence.values.is_empty() && element.is_implicit_flag() {
                    items.push(Value::Bool(!occurrence.negated));
                    continue;
                }
                if let [raw] = occurrence.values.as_slice() {
                    if allows_structured(self.registry, node, raw) {
                        let json = decode_literal(node, raw, &field)?;
                        match from_structured(self.registry, node, &json, &field)? {
                            Value::List(values) | Value::Tuple(values) => items.extend(values),
                            other => items.push(other),
                        }
                        continue;
                    }
                }
                let mut group = TokenStream::from_values(occurrence.values);
                items.push(self.bind_exact(element, &slot.element(), &mut group)?);
            }
            return Ok(collection(node, items));
        }

        if occurrences.len() > 1 {
            debug!(field = %field, count = occurrences.len(), "Repeated keyword, last value wins");
        }
        let Some(occurrence) = occurrences.into_iter().last() else {
            return Err(BindError::missing(field));
        };

        if occurrence.values.is_empty() && node.is_implicit_flag() {
            return Ok(Value::Bool(!occurrence.negated));
        }
        if let [raw] = occurrence.values.as_slice() {
            if allows_structured(self.registry, node, raw) {
                let json = decode_literal(node, raw, &field)?;
                return from_structured(self.registry, node, &json, &field);
            }
        }

        let negated = occurrence.negated;
        let mut values = TokenStream::from_values(occurrence.values);
        match self.bind_exact(node, &slot.element(), &mut values)? {
            Value::Bool(b) if negated => Ok(Value::Bool(!b)),
            other => Ok(other),
        }
    }

    /// Binds `node` from a stream that must be used up exactly.
    fn bind_exact(
        &mut self,
        node: &SchemaNode,
        slot: &Slot,
        stream: &mut TokenStream,
    ) -> Result<Value, BindError> {
        let value = self.bind_positional(node, slot, stream)?;
        if let Some(extra) = stream.peek_positional() {
            return Err(BindError::conversion(
                slot.field(),
                extra,
                node.type_name(),
                "unexpected extra value",
            ));
        }
        Ok(value)
    }

    /// Binds `node` from positional tokens, failing when they run out.
    fn bind_positional(
        &mut self,
        node: &SchemaNode,
        slot: &Slot,
        stream: &mut TokenStream,
    ) -> Result<Value, BindError> {
        let field = slot.field();
        match &node.kind {
            SchemaKind::Scalar(kind) => {
                let raw = stream
                    .consume_positional()
                    .ok_or_else(|| BindError::missing(&field))?;
                self.coerce(node, kind, &raw, &field)
            }
            SchemaKind::LiteralSet(allowed) => {
                let raw = stream
                    .consume_positional()
                    .ok_or_else(|| BindError::missing(&field))?;
                if allowed.contains(&raw) {
                    Ok(Value::Str(raw))
                } else {
                    Err(BindError::conversion(
                        field,
                        raw,
                        node.type_name(),
                        "not one of the allowed values",
                    ))
                }
            }
            SchemaKind::Sequence(element) | SchemaKind::VariadicTuple(element) => {
                self.bind_greedy(node, element, slot, stream)
            }
            SchemaKind::FixedTuple(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    if stream.positional_run() == 0 {
                        return Err(BindError::missing(field));
                    }
                    items.push(self.bind_positional(element, &slot.element(), stream)?);
                }
                Ok(Value::Tuple(items))
            }
            SchemaKind::Record(fields) => {
                match self.bind_record(node, fields, slot, stream, true)? {
                    Some(value) => Ok(value),
                    None => self
                        .fallback(node, slot)?
                        .ok_or_else(|| BindError::missing(field)),
                }
            }
            SchemaKind::Mapping { .. } => {
                let raw = stream
                    .consume_positional()
                    .ok_or_else(|| BindError::missing(&field))?;
                if !allows_structured(self.registry, node, &raw) {
                    return Err(BindError::conversion(
                        field,
                        raw,
                        node.type_name(),
                        "expected a JSON object",
                    ));
                }
                let json = decode_literal(node, &raw, &field)?;
                from_structured(self.registry, node, &json, &field)
            }
            SchemaKind::Sum(variants) => self
                .bind_sum(node, variants, slot, stream, true)?
                .ok_or_else(|| BindError::missing(field)),
        }
    }

    /// Captures element groups until the positional run ends. A trailing
    /// partial group is a missing-argument error.
    fn bind_greedy(
        &mut self,
        node: &SchemaNode,
        element: &SchemaNode,
        slot: &Slot,
        stream: &mut TokenStream,
    ) -> Result<Value, BindError> {
        let field = slot.field();
        let arity = element.positional_arity().max(1);
        let mut items = Vec::new();

        loop {
            let available = stream.positional_run();
            if available == 0 {
                break;
            }
            let literal = stream
                .peek_positional()
                .filter(|raw| allows_structured(self.registry, node, raw))
                .map(String::from);
            if let Some(raw) = literal {
                stream.consume_positional();
                let json = decode_literal(node, &raw, &field)?;
                match from_structured(self.registry, node, &json, &field)? {
                    Value::List(values) | Value::Tuple(values) => items.extend(values),
                    other => items.push(other),
                }
                continue;
            }
            if available < arity {
                return Err(BindError::missing(field));
            }
            let Some(mut group) = stream.take_group(arity) else {
                break;
            };
            items.push(self.bind_exact(element, &slot.element(), &mut group)?);
        }

        Ok(collection(node, items))
    }

    fn bind_record(
        &mut self,
        node: &SchemaNode,
        fields: &[SchemaNode],
        slot: &Slot,
        stream: &mut TokenStream,
        positional: bool,
    ) -> Result<Option<Value>, BindError> {
        let field = slot.field();
        let addressed = slot.keyed && self.keywords.has_under(&slot.path);
        if positional && !addressed && stream.positional_run() > 0 {
            let literal = stream
                .peek_positional()
                .filter(|raw| allows_structured(self.registry, node, raw))
                .map(String::from);
            if let Some(raw) = literal {
                stream.consume_positional();
                let json = decode_literal(node, &raw, &field)?;
                return from_structured(self.registry, node, &json, &field).map(Some);
            }
        }

        let mut values = Vec::with_capacity(fields.len());
        let mut supplied = false;
        let mut missing = None;
        for child in fields {
            let child_slot = slot.child(&child.name);
            match self.bind_node(child, &child_slot, stream, positional)? {
                Some(value) => {
                    supplied = true;
                    values.push((child.name.clone(), value));
                }
                None => match self.fallback(child, &child_slot) {
                    Ok(Some(value)) => values.push((child.name.clone(), value)),
                    Ok(None) => {}
                    Err(error) => {
                        missing.get_or_insert(error);
                    }
                },
            }
        }

        if !supplied {
            return self.soft_default(node, slot);
        }
        match missing {
            Some(error) => Err(error),
            None => Ok(Some(Value::Record(values))),
        }
    }

    /// Tries each variant in declaration order, restoring the stream and
    /// keyword index after every failed attempt.
    fn bind_sum(
        &mut self,
        node: &SchemaNode,
        variants: &[SchemaNode],
        slot: &Slot,
        stream: &mut TokenStream,
        positional: bool,
    ) -> Result<Option<Value>, BindError> {
        let field = slot.field();
        if positional && stream.positional_run() > 0 {
            let literal = stream
                .peek_positional()
                .filter(|raw| allows_structured(self.registry, node, raw))
                .map(String::from);
            if let Some(raw) = literal {
                stream.consume_positional();
                let json = decode_literal(node, &raw, &field)?;
                return from_structured(self.registry, node, &json, &field).map(Some);
            }
        }

        let variant_slot = slot.atomic();
        let mut tried = Vec::new();
        for variant in variants {
            let mark = stream.mark();
            let keywords = self.keywords.clone();
            match self.bind_node(variant, &variant_slot, stream, positional) {
                Ok(Some(value)) => {
                    trace!(field = %field, variant = %variant.type_name(), "Sum variant matched");
                    return Ok(Some(value));
                }
                Ok(None) => {
                    stream.reset(mark);
                    self.keywords = keywords;
                }
                Err(error) => {
                    stream.reset(mark);
                    self.keywords = keywords;
                    tried.push(crate::VariantFailure {
                        variant: variant.type_name(),
                        error,
                    });
                }
            }
        }

        if tried.is_empty() {
            return self.soft_default(node, slot);
        }
        Err(BindError::NoMatchingVariant {
            field,
            expected: node.type_name(),
            tried,
        })
    }

    /// Builds a mapping from `--field.<key>` occurrences.
    fn bind_mapping_keywords(
        &mut self,
        key: &ScalarKind,
        value: &SchemaNode,
        slot: &Slot,
        stream: &mut TokenStream,
    ) -> Result<Value, BindError> {
        let mut entries = Vec::new();
        for name in self.keywords.child_keys(&slot.path) {
            self.registry.coerce(key, &name).map_err(|reason| {
                BindError::conversion(slot.field(), name.clone(), key.type_name(), reason)
            })?;
            let child = slot.child(&name).atomic();
            match self.bind_node(value, &child, stream, false)? {
                Some(bound) => entries.push((name, bound)),
                None => return Err(BindError::missing(child.field())),
            }
        }
        Ok(Value::Map(entries))
    }

    /// Builds a fixed tuple from `--field.<index>` occurrences.
    fn bind_tuple_keywords(
        &mut self,
        elements: &[SchemaNode],
        slot: &Slot,
        stream: &mut TokenStream,
    ) -> Result<Value, BindError> {
        let mut items = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let child = slot.child(&index.to_string()).atomic();
            let bound = match self.bind_node(element, &child, stream, false)? {
                Some(value) => Some(value),
                None => self.fallback(element, &child)?,
            };
            items.push(bound.ok_or_else(|| BindError::missing(child.field()))?);
        }
        Ok(Value::Tuple(items))
    }

    fn soft_default(&self, node: &SchemaNode, slot: &Slot) -> Result<Option<Value>, BindError> {
        if !(slot.keyed && slot.defaults) {
            return Ok(None);
        }
        let Some(default) = self.defaults.get(&slot.path) else {
            return Ok(None);
        };
        let field = slot.field();
        trace!(field = %field, source = %default.source, "Using soft default");
        from_structured(self.registry, node, &default.value, &field).map(Some)
    }

    /// Value for a node nothing supplied: its declared default, a record
    /// assembled from field defaults, or a missing-argument error when
    /// required.
    fn fallback(&self, node: &SchemaNode, slot: &Slot) -> Result<Option<Value>, BindError> {
        if let Some(default) = &node.default {
            return Ok(Some(default.clone()));
        }
        if !node.required {
            return Ok(None);
        }
        if let SchemaKind::Record(fields) = &node.kind {
            let mut values = Vec::with_capacity(fields.len());
            for child in fields {
                if let Some(value) = self.fallback(child, &slot.child(&child.name))? {
                    values.push((child.name.clone(), value));
                }
            }
            return Ok(Some(Value::Record(values)));
        }
        Err(BindError::missing(slot.field()))
    }

    fn coerce(
        &self,
        node: &SchemaNode,
        kind: &ScalarKind,
        raw: &str,
        field: &str,
    ) -> Result<Value, BindError> {
        self.registry
            .coerce(kind, raw)
            .map_err(|reason| BindError::conversion(field, raw, node.type_name(), reason))
    }
}

fn collection(node: &SchemaNode, items: Vec<Value>) -> Value {
    match node.kind {
        SchemaKind::VariadicTuple(_) => Value::Tuple(items),
        _ => Value::List(items),
    }
}
