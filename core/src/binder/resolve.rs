//! Name resolution for keyword tokens and overlay keys.
//!
//! Keyword tokens resolve to a *field path*: the declared names from the
//! top-level parameter down through record fields, plus opaque mapping keys
//! and tuple indices. Overlay keys resolve to a *slot*: the deepest record
//! field they reach, with the remainder of the key left to the slot's own
//! structured decoding.

use crate::types::names_match;
use crate::{SchemaKind, SchemaNode};

/// A keyword flag matched against the schema.
#[derive(Debug, Clone)]
pub(crate) struct Resolved<'a> {
    pub path: Vec<String>,
    pub node: &'a SchemaNode,
    /// Matched through a `no-` prefix on a boolean.
    pub negated: bool,
    /// Matched through an `empty-` prefix on a sequence or variadic tuple.
    pub empty: bool,
}

/// Resolves a keyword token to the node it addresses.
///
/// Short flags (empty `segments`) match aliases only; long flags match
/// aliases first, then the dotted path.
pub(crate) fn resolve_keyword<'a>(
    params: &'a [SchemaNode],
    flag: &str,
    segments: &[String],
) -> Option<Resolved<'a>> {
    if let Some(param) = params
        .iter()
        .find(|p| p.accepts_keyword() && p.aliases.iter().any(|a| a == flag))
    {
        return Some(Resolved::plain(vec![param.name.clone()], param));
    }

    let (first, rest) = segments.split_first()?;
    if let Some(param) = params
        .iter()
        .find(|p| p.accepts_keyword() && names_match(&p.name, first))
    {
        return descend(param, vec![param.name.clone()], rest);
    }

    if rest.is_empty() {
        return prefixed(params, first, Vec::new());
    }
    None
}

impl<'a> Resolved<'a> {
    fn plain(path: Vec<String>, node: &'a SchemaNode) -> Self {
        Self {
            path,
            node,
            negated: false,
            empty: false,
        }
    }
}

/// Matches `no-<bool>` and `empty-<collection>` segments among `nodes`.
fn prefixed<'a>(
    nodes: &'a [SchemaNode],
    segment: &str,
    mut path: Vec<String>,
) -> Option<Resolved<'a>> {
    let candidates = nodes.iter().filter(|n| n.accepts_keyword());
    if let Some(name) = segment.strip_prefix("no-") {
        if let Some(node) = candidates.clone().find(|n| n.is_bool() && names_match(&n.name, name)) {
            path.push(node.name.clone());
            return Some(Resolved {
                negated: true,
                ..Resolved::plain(path, node)
            });
        }
    }
    let name = segment.strip_prefix("empty-")?;
    let node = candidates
        .clone()
        .find(|n| n.consumes_all() && names_match(&n.name, name))?;
    path.push(node.name.clone());
    Some(Resolved {
        empty: true,
        ..Resolved::plain(path, node)
    })
}

fn descend<'a>(
    node: &'a SchemaNode,
    mut path: Vec<String>,
    rest: &[String],
) -> Option<Resolved<'a>> {
    let Some((segment, tail)) = rest.split_first() else {
        return Some(Resolved::plain(path, node));
    };

    match &node.kind {
        SchemaKind::Record(fields) => {
            if let Some(field) = fields.iter().find(|f| names_match(&f.name, segment)) {
                path.push(field.name.clone());
                return descend(field, path, tail);
            }
            if !tail.is_empty() {
                return None;
            }
            prefixed(fields, segment, path)
        }
        SchemaKind::Mapping { value, .. } => {
            path.push(segment.clone());
            descend(value, path, tail)
        }
        SchemaKind::FixedTuple(elements) => {
            let index: usize = segment.parse().ok()?;
            let element = elements.get(index)?;
            path.push(index.to_string());
            descend(element, path, tail)
        }
        SchemaKind::Sum(variants) => variants
            .iter()
            .find_map(|variant| descend(variant, path.clone(), rest)),
        _ => None,
    }
}

/// An overlay key matched against the schema.
#[derive(Debug, Clone)]
pub struct SlotMatch<'a> {
    /// Declared names from the top-level parameter to the slot.
    pub slot: Vec<String>,
    /// Key segments below the slot (mapping keys, tuple indices, sum
    /// fields); empty when the key names the slot itself.
    pub rest: Vec<String>,
    pub node: &'a SchemaNode,
}

/// Resolves a dotted overlay key to its slot.
///
/// Records are descended field by field; mappings, tuples and sums are
/// atomic slots that absorb the rest of the key. Keys that dead-end in a
/// scalar or sequence, or name no parameter, resolve to `None`.
///
/// # Examples
///
/// ```
/// use argbind_core::*;
///
/// let params = vec![SchemaNode::record("user", vec![
///     SchemaNode::scalar("name", ScalarKind::Str),
///     SchemaNode::mapping("tags", SchemaNode::element(SchemaKind::Scalar(ScalarKind::Int))),
/// ])];
/// let key = |s: &str| s.split('.').map(String::from).collect::<Vec<_>>();
///
/// let m = resolve_slot(&params, &key("user.tags.red")).unwrap();
/// assert_eq!(m.slot, vec!["user", "tags"]);
/// assert_eq!(m.rest, vec!["red"]);
///
/// assert!(resolve_slot(&params, &key("user.name.first")).is_none());
/// assert!(resolve_slot(&params, &key("group")).is_none());
/// ```
pub fn resolve_slot<'a>(params: &'a [SchemaNode], segments: &[String]) -> Option<SlotMatch<'a>> {
    let (first, rest) = segments.split_first()?;
    let mut node = params
        .iter()
        .find(|p| p.accepts_keyword() && names_match(&p.name, first))?;
    let mut slot = vec![node.name.clone()];
    let mut remaining = rest;

    while let Some((segment, tail)) = remaining.split_first() {
        match &node.kind {
            SchemaKind::Record(_) => {
                node = node.field(segment)?;
                slot.push(node.name.clone());
                remaining = tail;
            }
            SchemaKind::Mapping { .. } | SchemaKind::FixedTuple(_) | SchemaKind::Sum(_) => break,
            _ => return None,
        }
    }

    Some(SlotMatch {
        slot,
        rest: remaining.to_vec(),
        node,
    })
}

/// A slot reachable from the signature, as enumerated for environment
/// lookups.
#[derive(Debug, Clone)]
pub struct SlotInfo<'a> {
    pub slot: Vec<String>,
    pub node: &'a SchemaNode,
}

/// Lists every keyword-addressable slot: leaf record fields and non-record
/// parameters, in declaration order.
pub fn enumerate_slots(params: &[SchemaNode]) -> Vec<SlotInfo<'_>> {
    let mut out = Vec::new();
    for param in params.iter().filter(|p| p.accepts_keyword()) {
        push_slots(param, vec![param.name.clone()], &mut out);
    }
    out
}

fn push_slots<'a>(node: &'a SchemaNode, slot: Vec<String>, out: &mut Vec<SlotInfo<'a>>) {
    match &node.kind {
        SchemaKind::Record(fields) => {
            for field in fields {
                let mut child = slot.clone();
                child.push(field.name.clone());
                push_slots(field, child, out);
            }
        }
        _ => out.push(SlotInfo { slot, node }),
    }
}
