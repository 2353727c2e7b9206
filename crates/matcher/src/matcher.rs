/*!
The matching engine.

A match walks the pattern tree and the target tree in lockstep: node
patterns against nodes, field patterns against field values, lists
element-wise with exact arity. Matching is a single pass with no
backtracking; the first local mismatch is final. Captures accumulate in a
per-call environment and are partitioned into positional and named groups
when the walk succeeds.

Statement wrappers are looked through symmetrically: an expression pattern
matches a wrapped target and a wrapper pattern matches a bare expression,
with identical bindings either way. Which kinds are wrappers is schema
metadata, not hard-coded here.
*/

use crate::ast::{Node, Value};
use crate::error::{Error, MatchError, MatchErrorKind};
use crate::pattern::{CaptureKey, NodePat, Pat, Pattern};
use crate::Name;
use rustc_hash::FxHashMap;
use std::fmt;

mod trace;
pub use trace::Trace;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A value bound by a capture: a whole node, or one field value of a node.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound<'t> {
    Node(&'t Node<'t>),
    Field(&'t Value<'t>),
}

impl<'t> Bound<'t> {
    /// The bound node, looking through a node-valued field binding.
    pub fn as_node(&self) -> Option<&'t Node<'t>> {
        match *self {
            Bound::Node(node) => Some(node),
            Bound::Field(Value::Node(node)) => Some(&**node),
            Bound::Field(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&'t Value<'t>> {
        match *self {
            Bound::Field(value) => Some(value),
            Bound::Node(_) => None,
        }
    }

    /// The bound identifier, if an identifier field was captured.
    pub fn as_ident(&self) -> Option<Name<'t>> {
        match *self {
            Bound::Field(Value::Ident(id)) => Some(*id),
            _ => None,
        }
    }
}

impl<'t> fmt::Display for Bound<'t> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Node(node) => node.fmt(f),
            Bound::Field(value) => value.fmt(f),
        }
    }
}

/// Capture environment of one match attempt. Fresh per call.
pub type CaptureEnv<'p, 't> = FxHashMap<CaptureKey<'p>, Bound<'t>>;

/// A successful match: the matched node plus the resolved captures.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'p, 't> {
    /// the target node the pattern was matched against
    pub node: &'t Node<'t>,
    /// positional captures, ordered by index
    pub groups: Vec<Bound<'t>>,
    /// named captures
    pub kw_groups: FxHashMap<Name<'p>, Bound<'t>>,
}

struct MatchCx<'p, 't, 'c> {
    env: CaptureEnv<'p, 't>,
    trace: Option<&'c mut Trace>,
}

macro_rules! trace_log {
    ($cx: expr, $depth: expr, $($arg: tt)*) => {
        if let Some(t) = $cx.trace.as_deref_mut() {
            t.log($depth, format_args!($($arg)*));
        }
    };
}

impl<'p, 't, 'c> MatchCx<'p, 't, 'c> {
    /// Matches a pattern in node position against a target node.
    fn match_node(
        &mut self,
        pat: &Pat<'p>,
        target: &'t Node<'t>,
        depth: usize,
    ) -> Result<bool, MatchError> {
        trace_log!(self, depth, "matching {} against {}", pat, target);

        // wrapper unwrapping, both directions
        if let Some(wrapping) = target.kind().schema().wraps {
            if pat.category() == Some(wrapping.category) {
                if let Some(Value::Node(inner)) = target.children().get(wrapping.field) {
                    trace_log!(self, depth, "target is {}, expand", target.kind().name());
                    return self.match_node(pat, &**inner, depth + 1);
                }
            }
        }
        if let Pat::Node(np) = pat {
            if let Some(wrapping) = np.kind().schema().wraps {
                if target.kind().category() == wrapping.category {
                    trace_log!(self, depth, "pattern is {}, expand", np.kind().name());
                    return self.match_node(&np.children()[wrapping.field], target, depth + 1);
                }
            }
        }

        match pat {
            Pat::Wildcard => {
                trace_log!(self, depth, "pattern is wildcard, shortcut");
                Ok(true)
            }
            Pat::WildcardId => {
                trace_log!(self, depth, "identifier wildcard cannot match a whole node");
                Ok(false)
            }
            Pat::Capture(capture) => {
                trace_log!(self, depth, "pattern is capture {}, expand", capture.key);
                self.env.insert(capture.key, Bound::Node(target));
                self.match_node(&capture.inner, target, depth + 1)
            }
            Pat::Node(np) => self.match_concrete(np, target, depth),
            Pat::Ident(_) | Pat::Const(_) | Pat::List(_) | Pat::Null => {
                trace_log!(self, depth, "field-only pattern in node position, mismatch");
                Ok(false)
            }
        }
    }

    fn match_concrete(
        &mut self,
        np: &NodePat<'p>,
        target: &'t Node<'t>,
        depth: usize,
    ) -> Result<bool, MatchError> {
        if !target.kind().is_subkind_of(np.kind()) {
            trace_log!(
                self,
                depth,
                "{} is not {}, mismatch",
                target.kind().name(),
                np.kind().name()
            );
            return Ok(false);
        }
        let schema = np.kind().schema();
        if np.plain().len() != schema.plain_fields.len()
            || np.children().len() != schema.child_fields.len()
        {
            return Err(MatchError::schema_mismatch(
                schema.name,
                "pattern field arity disagrees with the schema",
            ));
        }
        if target.plain().len() != schema.plain_fields.len()
            || target.children().len() != schema.child_fields.len()
        {
            return Err(MatchError::schema_mismatch(
                target.kind().name(),
                "target field arity disagrees with the schema",
            ));
        }

        for (i, name) in schema.plain_fields.iter().enumerate() {
            if !self.match_field(&np.plain()[i], &target.plain()[i], depth) {
                trace_log!(self, depth, "field {} mismatch", name);
                return Ok(false);
            }
            trace_log!(self, depth, "field {} matched", name);
        }
        for (i, name) in schema.child_fields.iter().enumerate() {
            if !self.match_child(&np.children()[i], &target.children()[i], name, depth)? {
                trace_log!(self, depth, "child {} mismatch", name);
                return Ok(false);
            }
        }
        trace_log!(self, depth, "match {} success", np.kind().name());
        Ok(true)
    }

    /// Matches a plain field. Nodes are not legal on either side here; that
    /// is the type-confusion guard between plain and child fields.
    fn match_field(&mut self, pat: &Pat<'p>, target: &'t Value<'t>, depth: usize) -> bool {
        match pat {
            Pat::Wildcard | Pat::WildcardId => {
                trace_log!(self, depth, "field pattern is wildcard, shortcut");
                true
            }
            Pat::Capture(capture) => {
                trace_log!(self, depth, "field pattern is capture {}, expand", capture.key);
                self.env.insert(capture.key, Bound::Field(target));
                self.match_field(&capture.inner, target, depth + 1)
            }
            Pat::Node(_) => {
                trace_log!(self, depth, "node pattern in plain field, mismatch");
                false
            }
            _ if matches!(target, Value::Node(_)) => {
                trace_log!(self, depth, "node value in plain field, mismatch");
                false
            }
            Pat::List(pats) => match target {
                Value::List(values) => {
                    if pats.len() != values.len() {
                        trace_log!(self, depth, "field list length mismatch");
                        return false;
                    }
                    pats.iter()
                        .zip(values)
                        .all(|(p, v)| self.match_field(p, v, depth))
                }
                _ => false,
            },
            Pat::Ident(id) => matches!(target, Value::Ident(t) if t == id),
            Pat::Const(c) => matches!(target, Value::Const(t) if t == c),
            Pat::Null => matches!(target, Value::Null),
        }
    }

    /// Matches a child field: a sub-node, a list of sub-nodes or an absent
    /// optional. Leading captures bind the whole child value.
    fn match_child(
        &mut self,
        pat: &Pat<'p>,
        target: &'t Value<'t>,
        name: &str,
        depth: usize,
    ) -> Result<bool, MatchError> {
        if let Pat::Wildcard = pat {
            trace_log!(self, depth, "child {} is wildcard, shortcut", name);
            return Ok(true);
        }
        let mut pat = pat;
        while let Pat::Capture(capture) = pat {
            trace_log!(self, depth, "child {} is capture {}, expand", name, capture.key);
            self.env.insert(capture.key, Bound::Field(target));
            pat = &capture.inner;
        }
        if let Pat::Wildcard = pat {
            return Ok(true);
        }

        match (pat, target) {
            (Pat::List(pats), Value::List(values)) => {
                if pats.len() != values.len() {
                    trace_log!(self, depth, "child {} list length mismatch", name);
                    return Ok(false);
                }
                for (p, v) in pats.iter().zip(values) {
                    let matched = match v {
                        Value::Node(node) => self.match_node(p, &**node, depth + 1)?,
                        other => self.match_field(p, other, depth),
                    };
                    if !matched {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Pat::List(_), _) | (_, Value::List(_)) => {
                trace_log!(self, depth, "child {} list shape mismatch", name);
                Ok(false)
            }
            (Pat::Null, Value::Null) => Ok(true),
            (Pat::Null, _) | (_, Value::Null) => {
                trace_log!(self, depth, "child {} optional mismatch", name);
                Ok(false)
            }
            (_, Value::Node(node)) => self.match_node(pat, &**node, depth + 1),
            _ => {
                trace_log!(self, depth, "child {} is not a node, mismatch", name);
                Ok(false)
            }
        }
    }
}

impl<'p> Pattern<'p> {
    /// Matches against `target`. `Ok(None)` is the normal no-match outcome;
    /// errors are schema or capture-index bugs, never a failed match.
    pub fn match_node<'t>(
        &self,
        target: &'t Node<'t>,
    ) -> Result<Option<MatchResult<'p, 't>>, MatchError> {
        self.run(target, None)
    }

    /// Like `match_node`, but a failed match is an error carrying the target
    /// dump and the full decision trace. For tests and pattern debugging.
    pub fn assert_match<'t>(
        &self,
        target: &'t Node<'t>,
    ) -> Result<MatchResult<'p, 't>, MatchError> {
        let mut trace = Trace::new();
        match self.run(target, Some(&mut trace))? {
            Some(result) => Ok(result),
            None => Err(MatchError::new(MatchErrorKind::AssertionFailed)
                .with_additional_message(format!(
                    "pattern {} does not match:\n{}\nTrace:\n{}",
                    self, target, trace
                ))),
        }
    }

    /// First match in `target` or any of its sub-nodes, preorder. A wrapper
    /// and its wrapped child count as one position; the wrapper wins.
    pub fn find_first<'t>(
        &self,
        target: &'t Node<'t>,
    ) -> Result<Option<MatchResult<'p, 't>>, MatchError> {
        self.find_first_in(target, true)
    }

    fn find_first_in<'t>(
        &self,
        target: &'t Node<'t>,
        try_here: bool,
    ) -> Result<Option<MatchResult<'p, 't>>, MatchError> {
        if try_here {
            if let Some(result) = self.run(target, None)? {
                return Ok(Some(result));
            }
        }
        // matching at the wrapped child would repeat the wrapper's match
        let child_is_redundant = target.kind().schema().wraps.is_some();
        for child in target.child_nodes() {
            if let Some(result) = self.find_first_in(child, !child_is_redundant)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// All matches in `target` and its sub-nodes, preorder. Sub-nodes of a
    /// matched node are searched too, so nested matches all surface.
    pub fn find_all<'t>(
        &self,
        target: &'t Node<'t>,
    ) -> Result<Vec<MatchResult<'p, 't>>, MatchError> {
        let mut results = vec![];
        self.find_into(target, true, &mut results)?;
        Ok(results)
    }

    fn find_into<'t>(
        &self,
        target: &'t Node<'t>,
        try_here: bool,
        results: &mut Vec<MatchResult<'p, 't>>,
    ) -> Result<(), MatchError> {
        if try_here {
            if let Some(result) = self.run(target, None)? {
                results.push(result);
            }
        }
        let child_is_redundant = target.kind().schema().wraps.is_some();
        for child in target.child_nodes() {
            self.find_into(child, !child_is_redundant, results)?;
        }
        Ok(())
    }

    fn run<'t>(
        &self,
        target: &'t Node<'t>,
        trace: Option<&mut Trace>,
    ) -> Result<Option<MatchResult<'p, 't>>, MatchError> {
        let mut cx = MatchCx {
            env: CaptureEnv::default(),
            trace,
        };
        if cx.match_node(self.root(), target, 0)? {
            resolve(cx.env, target).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Partitions the capture environment into positional and named groups.
/// Positional indices must be exactly `0..=max`; a gap is a pattern bug.
fn resolve<'p, 't>(
    env: CaptureEnv<'p, 't>,
    node: &'t Node<'t>,
) -> Result<MatchResult<'p, 't>, MatchError> {
    let mut indexed = vec![];
    let mut kw_groups = FxHashMap::default();
    for (key, bound) in env {
        match key {
            CaptureKey::Index(index) => indexed.push((index, bound)),
            CaptureKey::Name(name) => {
                kw_groups.insert(name, bound);
            }
        }
    }
    indexed.sort_unstable_by_key(|(index, _)| *index);
    if indexed.iter().enumerate().any(|(at, (index, _))| at != *index) {
        let indices: Vec<_> = indexed.iter().map(|(index, _)| *index).collect();
        return Err(MatchError::capture_index_gap(&indices));
    }
    Ok(MatchResult {
        node,
        groups: indexed.into_iter().map(|(_, bound)| bound).collect(),
        kw_groups,
    })
}

/// Compiles `pattern` and matches it against `target` in one call.
pub fn match_pattern<'p, 't>(
    pattern: &'p str,
    target: &'t Node<'t>,
) -> Result<Option<MatchResult<'p, 't>>, Error> {
    let compiled = crate::pattern::parse::compile(pattern)?;
    compiled.match_node(target).map_err(Error::from)
}
