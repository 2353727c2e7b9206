//! Structural pattern matching over syntax trees. See README.md

use std::ops::Range;

pub mod ast;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod schema;
pub mod tokenizer;

#[cfg(feature = "serde")]
use serde::Serialize;

pub use ast::{Const, Node, Value};
pub use error::{Error, MatchError, MatchErrorKind, SyntaxError, SyntaxErrorKind};
pub use matcher::{match_pattern, Bound, CaptureEnv, MatchResult, Trace};
pub use parser::{parse_expr, parse_module, parse_stmt};
pub use pattern::parse::{compile, compile_expr};
pub use pattern::{CaptureKey, CapturePat, NodePat, Pat, Pattern, PatternFlags};
pub use schema::{Category, KindSchema, NodeKind};

// use plain &str here for now
// may change to tendril
pub type Name<'a> = &'a str;

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Position {
    /// the 0-indexed offset in the source str modulo newline
    pub offset: usize,
    /// the line number in the source code
    pub line: usize,
    /// the column number in the source code
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl From<SourceLocation> for Range<usize> {
    fn from(location: SourceLocation) -> Self {
        location.start.offset..location.end.offset
    }
}

#[cfg(test)]
#[macro_export]
macro_rules! cast {
    ($target: expr, $pat: path) => {{
        if let $pat(a) = $target {
            a
        } else {
            panic!("mismatch variant when cast to {}", stringify!($pat));
        }
    }};
}
