/*!
Node kind schema.

Every node kind the engine understands is described here once, in a static
table: its ordered plain fields (compared by value), its ordered child fields
(compared recursively), its category, an optional supertype link and optional
statement-wrapper metadata. The matcher resolves fields by index through this
table and never reflects over field names at match time.
*/

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // statements
    ExprStmt,
    Assign,
    AnnAssign,
    Return,
    // expressions
    Name,
    Attribute,
    Call,
    Subscript,
    Slice,
    Starred,
    Await,
    Constant,
    Tuple,
    List,
    Dict,
    // call helper
    Keyword,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Statement,
    Expression,
    /// neither a statement nor an expression, e.g. a call keyword
    Helper,
}

/// Declares a kind as a wrapper: a node that only holds a single child of
/// another category. The matcher may look through it in both directions.
#[derive(Debug, Clone, Copy)]
pub struct Wrapping {
    /// category of the held child
    pub category: Category,
    /// index of the held child in `child_fields`
    pub field: usize,
}

pub struct KindSchema {
    pub kind: NodeKind,
    pub name: &'static str,
    pub category: Category,
    pub supertype: Option<NodeKind>,
    pub plain_fields: &'static [&'static str],
    pub child_fields: &'static [&'static str],
    pub wraps: Option<Wrapping>,
}

macro_rules! schema {
    ($kind: ident, $cat: ident, plain: $plain: expr, children: $children: expr) => {
        schema!($kind, $cat, plain: $plain, children: $children, wraps: None)
    };
    ($kind: ident, $cat: ident, plain: $plain: expr, children: $children: expr, wraps: $wraps: expr) => {
        KindSchema {
            kind: NodeKind::$kind,
            name: stringify!($kind),
            category: Category::$cat,
            supertype: None,
            plain_fields: $plain,
            child_fields: $children,
            wraps: $wraps,
        }
    };
}

/// Indexed by `NodeKind as usize`. Order must follow the enum declaration.
pub const SCHEMAS: &[KindSchema] = &[
    schema!(ExprStmt, Statement, plain: &[], children: &["value"],
            wraps: Some(Wrapping { category: Category::Expression, field: 0 })),
    schema!(Assign, Statement, plain: &[], children: &["targets", "value"]),
    schema!(AnnAssign, Statement, plain: &[], children: &["target", "annotation", "value"]),
    schema!(Return, Statement, plain: &[], children: &["value"]),
    schema!(Name, Expression, plain: &["id"], children: &[]),
    schema!(Attribute, Expression, plain: &["attr"], children: &["value"]),
    schema!(Call, Expression, plain: &[], children: &["func", "args", "keywords"]),
    schema!(Subscript, Expression, plain: &[], children: &["value", "slice"]),
    schema!(Slice, Expression, plain: &[], children: &["lower", "upper", "step"]),
    schema!(Starred, Expression, plain: &[], children: &["value"]),
    schema!(Await, Expression, plain: &[], children: &["value"]),
    schema!(Constant, Expression, plain: &["value"], children: &[]),
    schema!(Tuple, Expression, plain: &[], children: &["elts"]),
    schema!(List, Expression, plain: &[], children: &["elts"]),
    schema!(Dict, Expression, plain: &[], children: &["keys", "values"]),
    schema!(Keyword, Helper, plain: &["arg"], children: &["value"]),
];

lazy_static! {
    static ref KIND_BY_NAME: FxHashMap<&'static str, NodeKind> =
        SCHEMAS.iter().map(|s| (s.name, s.kind)).collect();
}

impl NodeKind {
    pub fn schema(self) -> &'static KindSchema {
        &SCHEMAS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    pub fn category(self) -> Category {
        self.schema().category
    }

    pub fn from_name(name: &str) -> Option<NodeKind> {
        KIND_BY_NAME.get(name).copied()
    }

    /// Walks the supertype chain. A kind is its own subkind.
    pub fn is_subkind_of(self, sup: NodeKind) -> bool {
        let mut kind = self;
        loop {
            if kind == sup {
                return true;
            }
            match kind.schema().supertype {
                Some(s) => kind = s,
                None => return false,
            }
        }
    }

    pub(crate) fn plain_index(self, name: &str) -> Option<usize> {
        self.schema().plain_fields.iter().position(|f| *f == name)
    }

    pub(crate) fn child_index(self, name: &str) -> Option<usize> {
        self.schema().child_fields.iter().position(|f| *f == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_follows_enum_order() {
        for (i, schema) in SCHEMAS.iter().enumerate() {
            assert_eq!(schema.kind as usize, i, "misplaced entry {}", schema.name);
        }
    }

    #[test]
    fn wrapper_field_is_declared() {
        for schema in SCHEMAS {
            if let Some(w) = schema.wraps {
                assert!(w.field < schema.child_fields.len());
                assert_ne!(w.category, schema.category);
            }
        }
    }

    #[test]
    fn field_sets_are_disjoint() {
        for schema in SCHEMAS {
            for plain in schema.plain_fields {
                assert!(!schema.child_fields.contains(plain));
            }
        }
    }

    #[test]
    fn name_lookup_round_trips() {
        for schema in SCHEMAS {
            assert_eq!(NodeKind::from_name(schema.name), Some(schema.kind));
        }
        assert_eq!(NodeKind::from_name("NoSuchKind"), None);
    }

    #[test]
    fn subkind_is_reflexive() {
        assert!(NodeKind::Call.is_subkind_of(NodeKind::Call));
        assert!(!NodeKind::Call.is_subkind_of(NodeKind::Attribute));
    }
}
