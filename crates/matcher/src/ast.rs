/*!
The target tree the engine matches against.

Nodes borrow from their source text and store field values in schema order:
plain fields hold identifiers, constants or lists thereof; child fields hold
sub-nodes, lists of sub-nodes or `Null` for an absent optional. The engine
only ever reads a target tree.
*/

use crate::error::MatchError;
use crate::schema::NodeKind;
use crate::{Name, SourceLocation};
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Const<'a> {
    Str(&'a str),
    Int(i64),
    Bool(bool),
    None,
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    Ident(Name<'a>),
    Const(Const<'a>),
    Node(Box<Node<'a>>),
    List(Vec<Value<'a>>),
    /// an optional field that is absent
    Null,
}

pub type FieldVec<'a> = Vec<Value<'a>>;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<'a> {
    kind: NodeKind,
    /// aligned with the schema's plain_fields
    plain: FieldVec<'a>,
    /// aligned with the schema's child_fields
    children: FieldVec<'a>,
    location: SourceLocation,
}

impl<'a> Node<'a> {
    /// An empty node of `kind` with every field set to `Null`.
    pub fn new(kind: NodeKind) -> Self {
        let schema = kind.schema();
        Self {
            kind,
            plain: schema.plain_fields.iter().map(|_| Value::Null).collect(),
            children: schema.child_fields.iter().map(|_| Value::Null).collect(),
            location: Default::default(),
        }
    }

    pub(crate) fn build(
        kind: NodeKind,
        plain: FieldVec<'a>,
        children: FieldVec<'a>,
        location: SourceLocation,
    ) -> Self {
        let schema = kind.schema();
        debug_assert_eq!(plain.len(), schema.plain_fields.len());
        debug_assert_eq!(children.len(), schema.child_fields.len());
        Self {
            kind,
            plain,
            children,
            location,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
    pub fn plain(&self) -> &[Value<'a>] {
        &self.plain
    }
    pub fn children(&self) -> &[Value<'a>] {
        &self.children
    }

    pub fn plain_field(&self, name: &str) -> Option<&Value<'a>> {
        self.kind.plain_index(name).map(|i| &self.plain[i])
    }
    pub fn child_field(&self, name: &str) -> Option<&Value<'a>> {
        self.kind.child_index(name).map(|i| &self.children[i])
    }

    pub fn set_plain(&mut self, name: &str, value: Value<'a>) -> Result<(), MatchError> {
        match self.kind.plain_index(name) {
            Some(i) => {
                self.plain[i] = value;
                Ok(())
            }
            None => Err(unknown_field(self.kind, name)),
        }
    }
    pub fn set_child(&mut self, name: &str, value: Value<'a>) -> Result<(), MatchError> {
        match self.kind.child_index(name) {
            Some(i) => {
                self.children[i] = value;
                Ok(())
            }
            None => Err(unknown_field(self.kind, name)),
        }
    }

    /// All direct sub-nodes, flattening list-valued child fields.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node<'a>> {
        self.children.iter().flat_map(|value| {
            let slice: &[Value<'a>] = match value {
                Value::List(list) => list,
                single => std::slice::from_ref(single),
            };
            slice.iter().filter_map(|v| match v {
                Value::Node(n) => Some(&**n),
                _ => None,
            })
        })
    }
}

pub(crate) fn unknown_field(kind: NodeKind, name: &str) -> MatchError {
    MatchError::schema_mismatch(kind.name(), &format!("no field named {:?}", name))
}

impl<'a> fmt::Display for Const<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Const::Str(s) => write!(f, "\"{}\"", s),
            Const::Int(i) => write!(f, "{}", i),
            Const::Bool(true) => f.write_str("True"),
            Const::Bool(false) => f.write_str("False"),
            Const::None => f.write_str("None"),
        }
    }
}

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Ident(id) => f.write_str(id),
            Value::Const(c) => c.fmt(f),
            Value::Node(n) => n.fmt(f),
            Value::List(list) => write_joined(f, list, ", "),
            Value::Null => Ok(()),
        }
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

/// Prints a node back in source form. The output is canonical, not a copy of
/// the original spelling; it is what error messages and the CLI show.
impl<'a> fmt::Display for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NodeKind::*;
        match self.kind {
            ExprStmt => write!(f, "{}", self.children[0]),
            Assign => {
                if let Value::List(targets) = &self.children[0] {
                    write_joined(f, targets, " = ")?;
                }
                write!(f, " = {}", self.children[1])
            }
            AnnAssign => {
                write!(f, "{}: {}", self.children[0], self.children[1])?;
                match &self.children[2] {
                    Value::Null => Ok(()),
                    value => write!(f, " = {}", value),
                }
            }
            Return => match &self.children[0] {
                Value::Null => f.write_str("return"),
                value => write!(f, "return {}", value),
            },
            Name => write!(f, "{}", self.plain[0]),
            Attribute => write!(f, "{}.{}", self.children[0], self.plain[0]),
            Call => {
                write!(f, "{}(", self.children[0])?;
                write!(f, "{}", self.children[1])?;
                if let (Value::List(args), Value::List(kws)) = (&self.children[1], &self.children[2])
                {
                    if !args.is_empty() && !kws.is_empty() {
                        f.write_str(", ")?;
                    }
                }
                write!(f, "{})", self.children[2])
            }
            Subscript => write!(f, "{}[{}]", self.children[0], self.children[1]),
            Slice => {
                write!(f, "{}:{}", self.children[0], self.children[1])?;
                match &self.children[2] {
                    Value::Null => Ok(()),
                    step => write!(f, ":{}", step),
                }
            }
            Starred => write!(f, "*{}", self.children[0]),
            Await => write!(f, "await {}", self.children[0]),
            Constant => write!(f, "{}", self.plain[0]),
            Tuple => match &self.children[0] {
                Value::List(elts) if elts.len() == 1 => write!(f, "({},)", elts[0]),
                elts => write!(f, "({})", elts),
            },
            List => write!(f, "[{}]", self.children[0]),
            Dict => {
                f.write_str("{")?;
                if let (Value::List(keys), Value::List(values)) =
                    (&self.children[0], &self.children[1])
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse_stmt;

    #[test]
    fn new_node_is_all_null() {
        let node = Node::new(NodeKind::Call);
        assert_eq!(node.children(), &[Value::Null, Value::Null, Value::Null]);
        assert!(node.plain().is_empty());
    }

    #[test]
    fn set_field_checks_schema() {
        let mut node = Node::new(NodeKind::Name);
        node.set_plain("id", Value::Ident("x")).unwrap();
        assert_eq!(node.plain_field("id"), Some(&Value::Ident("x")));
        let err = node.set_plain("no_such", Value::Null).unwrap_err();
        assert_eq!(err.kind, crate::error::MatchErrorKind::SchemaMismatch);
    }

    #[test]
    fn child_nodes_flattens_lists() {
        let stmt = parse_stmt("f(a, b.c)").unwrap();
        // ExprStmt -> Call
        let call = stmt.child_nodes().next().unwrap();
        assert_eq!(call.kind(), NodeKind::Call);
        let kinds: Vec<_> = call.child_nodes().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            [NodeKind::Name, NodeKind::Name, NodeKind::Attribute]
        );
    }
}
