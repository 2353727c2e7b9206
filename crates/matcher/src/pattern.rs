/*!
The pattern data model.

A compiled pattern is a tree of `Pat` values. At node positions the closed
set is concrete node / wildcard / identifier wildcard / capture; at field
positions the same enum also carries identifier, constant, list and null
literals. Patterns are immutable after compilation and safe to share across
threads and match calls.
*/

use crate::ast::Const;
use crate::error::MatchError;
use crate::schema::{Category, NodeKind};
use crate::Name;
use bitflags::bitflags;
use std::fmt;

pub mod parse;

/// A capture is addressed by name (`$x`) or by group index (`$0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKey<'a> {
    Name(Name<'a>),
    Index(usize),
}

impl<'a> fmt::Display for CaptureKey<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKey::Name(name) => write!(f, "${}", name),
            CaptureKey::Index(index) => write!(f, "${}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pat<'a> {
    /// `~`, matches any node, value or whole list
    Wildcard,
    /// `` ` ``, matches any identifier leaf; illegal as a whole-node pattern
    WildcardId,
    /// `$k` / `$k{...}`, binds then matches the inner pattern
    Capture(Box<CapturePat<'a>>),
    /// a concrete node pattern
    Node(NodePat<'a>),

    // field-position literals
    Ident(Name<'a>),
    Const(Const<'a>),
    List(Vec<Pat<'a>>),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturePat<'a> {
    pub key: CaptureKey<'a>,
    pub inner: Pat<'a>,
}

impl<'a> Pat<'a> {
    pub fn capture(key: CaptureKey<'a>, inner: Pat<'a>) -> Self {
        Pat::Capture(Box::new(CapturePat { key, inner }))
    }

    /// Category used by the wrapper-unwrap rule. Wildcards and captures
    /// count as expressions, the way the surface DSL produces them.
    pub(crate) fn category(&self) -> Option<Category> {
        match self {
            Pat::Node(np) => Some(np.kind.category()),
            Pat::Wildcard | Pat::WildcardId | Pat::Capture(_) => Some(Category::Expression),
            _ => None,
        }
    }
}

/// A concrete node pattern: a kind plus one pattern per schema field.
/// Fields not set explicitly default to `Wildcard`, so a freshly built
/// `NodePat` constrains nothing but the node kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePat<'a> {
    kind: NodeKind,
    plain: Vec<Pat<'a>>,
    children: Vec<Pat<'a>>,
}

impl<'a> NodePat<'a> {
    pub fn new(kind: NodeKind) -> Self {
        let schema = kind.schema();
        Self {
            kind,
            plain: schema.plain_fields.iter().map(|_| Pat::Wildcard).collect(),
            children: schema.child_fields.iter().map(|_| Pat::Wildcard).collect(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    pub fn plain(&self) -> &[Pat<'a>] {
        &self.plain
    }
    pub fn children(&self) -> &[Pat<'a>] {
        &self.children
    }

    /// Field names are validated against the schema here, when the pattern
    /// is built, so the matcher never resolves names at match time.
    pub fn with_plain(mut self, name: &str, pat: Pat<'a>) -> Result<Self, MatchError> {
        match self.kind.plain_index(name) {
            Some(i) => {
                self.plain[i] = pat;
                Ok(self)
            }
            None => Err(crate::ast::unknown_field(self.kind, name)),
        }
    }

    pub fn with_child(mut self, name: &str, pat: Pat<'a>) -> Result<Self, MatchError> {
        match self.kind.child_index(name) {
            Some(i) => {
                self.children[i] = pat;
                Ok(self)
            }
            None => Err(crate::ast::unknown_field(self.kind, name)),
        }
    }

    pub(crate) fn set_plain_at(&mut self, index: usize, pat: Pat<'a>) {
        self.plain[index] = pat;
    }
    pub(crate) fn set_child_at(&mut self, index: usize, pat: Pat<'a>) {
        self.children[index] = pat;
    }
}

bitflags! {
    /// Summary of a compiled pattern, computed once at build time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PatternFlags: u8 {
        const NAMED_CAPTURES = 1 << 0;
        const POSITIONAL_CAPTURES = 1 << 1;
        const WILDCARD = 1 << 2;
        const WILDCARD_ID = 1 << 3;
    }
}

/// A compiled, reusable pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern<'a> {
    root: Pat<'a>,
    flags: PatternFlags,
}

impl<'a> Pattern<'a> {
    pub fn new(root: Pat<'a>) -> Self {
        let mut flags = PatternFlags::empty();
        collect_flags(&root, &mut flags);
        Self { root, flags }
    }

    /// The pattern that matches any node whatsoever.
    pub fn wildcard() -> Self {
        Self::new(Pat::Wildcard)
    }

    pub fn root(&self) -> &Pat<'a> {
        &self.root
    }
    pub fn flags(&self) -> PatternFlags {
        self.flags
    }
    pub fn has_captures(&self) -> bool {
        self.flags
            .intersects(PatternFlags::NAMED_CAPTURES | PatternFlags::POSITIONAL_CAPTURES)
    }
}

fn collect_flags(pat: &Pat, flags: &mut PatternFlags) {
    match pat {
        Pat::Wildcard => *flags |= PatternFlags::WILDCARD,
        Pat::WildcardId => *flags |= PatternFlags::WILDCARD_ID,
        Pat::Capture(c) => {
            *flags |= match c.key {
                CaptureKey::Name(_) => PatternFlags::NAMED_CAPTURES,
                CaptureKey::Index(_) => PatternFlags::POSITIONAL_CAPTURES,
            };
            collect_flags(&c.inner, flags);
        }
        Pat::Node(np) => {
            for p in np.plain.iter().chain(&np.children) {
                collect_flags(p, flags);
            }
        }
        Pat::List(list) => {
            for p in list {
                collect_flags(p, flags);
            }
        }
        Pat::Ident(_) | Pat::Const(_) | Pat::Null => {}
    }
}

impl<'a> fmt::Display for Pattern<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            f.write_str(sep)?;
        }
        first = false;
        item.fmt(f)?;
    }
    Ok(())
}

/// Prints a pattern back in DSL form, for traces and error messages.
impl<'a> fmt::Display for Pat<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pat::Wildcard => f.write_str("~"),
            Pat::WildcardId => f.write_str("`"),
            Pat::Capture(c) => match &c.inner {
                Pat::Wildcard => c.key.fmt(f),
                inner => write!(f, "{}{{{}}}", c.key, inner),
            },
            Pat::Node(np) => np.fmt(f),
            Pat::Ident(id) => f.write_str(id),
            Pat::Const(c) => c.fmt(f),
            Pat::List(list) => write_joined(f, list, ", "),
            Pat::Null => Ok(()),
        }
    }
}

impl<'a> fmt::Display for NodePat<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NodeKind::*;
        match self.kind {
            ExprStmt => write!(f, "{}", self.children[0]),
            Assign => {
                write_joined(f, &list_items(&self.children[0]), " = ")?;
                write!(f, " = {}", self.children[1])
            }
            AnnAssign => {
                write!(f, "{}: {}", self.children[0], self.children[1])?;
                match &self.children[2] {
                    Pat::Null => Ok(()),
                    value => write!(f, " = {}", value),
                }
            }
            Return => match &self.children[0] {
                Pat::Null => f.write_str("return"),
                value => write!(f, "return {}", value),
            },
            Name => write!(f, "{}", self.plain[0]),
            Attribute => write!(f, "{}.{}", self.children[0], self.plain[0]),
            Call => {
                write!(f, "{}(", self.children[0])?;
                match (&self.children[1], &self.children[2]) {
                    // a whole-list wildcard prints as the rest quantifier
                    (Pat::Wildcard, _) => f.write_str("~*")?,
                    (Pat::Capture(c), _) if matches!(c.inner, Pat::Wildcard) => {
                        write!(f, "{}{{~*}}", c.key)?
                    }
                    (Pat::List(args), Pat::List(kws)) => {
                        write_joined(f, args, ", ")?;
                        if !args.is_empty() && !kws.is_empty() {
                            f.write_str(", ")?;
                        }
                        write_joined(f, kws, ", ")?;
                    }
                    (args, _) => args.fmt(f)?,
                }
                f.write_str(")")
            }
            Subscript => write!(f, "{}[{}]", self.children[0], self.children[1]),
            Slice => {
                write!(f, "{}:{}", self.children[0], self.children[1])?;
                match &self.children[2] {
                    Pat::Null => Ok(()),
                    step => write!(f, ":{}", step),
                }
            }
            Starred => write!(f, "*{}", self.children[0]),
            Await => write!(f, "await {}", self.children[0]),
            Constant => write!(f, "{}", self.plain[0]),
            Tuple => match &self.children[0] {
                Pat::List(elts) if elts.len() == 1 => write!(f, "({},)", elts[0]),
                elts => write!(f, "({})", elts),
            },
            List => write!(f, "[{}]", self.children[0]),
            Dict => {
                f.write_str("{")?;
                if let (Pat::List(keys), Pat::List(values)) = (&self.children[0], &self.children[1])
                {
                    let mut first = true;
                    for (k, v) in keys.iter().zip(values) {
                        if !first {
                            f.write_str(", ")?;
                        }
                        first = false;
                        write!(f, "{}: {}", k, v)?;
                    }
                }
                f.write_str("}")
            }
            Keyword => write!(f, "{}={}", self.plain[0], self.children[0]),
        }
    }
}

fn list_items<'s, 'a>(pat: &'s Pat<'a>) -> Vec<&'s Pat<'a>> {
    match pat {
        Pat::List(list) => list.iter().collect(),
        other => vec![other],
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn node_pat_defaults_to_wildcards() {
        let np = NodePat::new(NodeKind::Call);
        assert!(np.children().iter().all(|p| *p == Pat::Wildcard));
    }

    #[test]
    fn with_field_validates_names() {
        let np = NodePat::new(NodeKind::Attribute)
            .with_plain("attr", Pat::Ident("method"))
            .unwrap();
        assert_eq!(np.plain(), &[Pat::Ident("method")]);
        let err = NodePat::new(NodeKind::Attribute)
            .with_plain("no_such", Pat::Wildcard)
            .unwrap_err();
        assert_eq!(err.kind, crate::error::MatchErrorKind::SchemaMismatch);
    }

    #[test]
    fn flags_summarize_captures() {
        let pat = Pat::capture(CaptureKey::Name("x"), Pat::Wildcard);
        let pattern = Pattern::new(pat);
        assert!(pattern.has_captures());
        assert!(pattern.flags().contains(PatternFlags::NAMED_CAPTURES));
        assert!(pattern.flags().contains(PatternFlags::WILDCARD));
        assert!(!pattern.flags().contains(PatternFlags::POSITIONAL_CAPTURES));
        assert!(!Pattern::wildcard().has_captures());
    }
}
