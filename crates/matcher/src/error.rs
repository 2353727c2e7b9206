use super::SourceLocation;
use std::fmt;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SyntaxErrorKind {
    // tokenizer errors
    UnexpectedCharacter,
    UnterminatedString,
    InvalidNumber,
    InvalidCaptureKey,

    // shared parse errors
    UnexpectedToken,
    UnexpectedEndOfInput,
    ExpectedIdentifier,
    ExpectedStatementEnd,
    EmptyInput,

    // pattern-only parse errors
    MetaTokenOutsideDsl,
    MisplacedIdentWildcard,
    MisplacedRestQuantifier,
    UnsupportedQuantifier,
}

pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub additional_message: Option<String>,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            additional_message: None,
            location: Default::default(),
        }
    }
    pub fn with_location(mut self, loc: SourceLocation) -> Self {
        self.location = loc;
        self
    }
    pub fn with_additional_message(mut self, msg: String) -> Self {
        self.additional_message = Some(msg);
        self
    }

    fn msg(&self) -> &'static str {
        syntax_msg(&self.kind)
    }
}

#[cold]
#[inline(never)]
fn syntax_msg(kind: &SyntaxErrorKind) -> &'static str {
    use SyntaxErrorKind::*;
    match *kind {
        UnexpectedCharacter => "Unexpected character.",
        UnterminatedString => "String literal is missing its closing quote.",
        InvalidNumber => "Integer literal is out of range.",
        InvalidCaptureKey => "'$' must be followed by a name or a group index.",

        UnexpectedToken => "Unexpected token.",
        UnexpectedEndOfInput => "Unexpected end of input.",
        ExpectedIdentifier => "An identifier was expected.",
        ExpectedStatementEnd => "A statement end was expected.",
        EmptyInput => "Input contains no statement.",

        MetaTokenOutsideDsl => "'~', '`' and '$' are pattern syntax and cannot appear in plain source.",
        MisplacedIdentWildcard => "'`' matches an identifier and cannot stand for a whole expression.",
        MisplacedRestQuantifier => "A rest quantifier must be the only element of its argument list.",
        UnsupportedQuantifier =>
            "The one-or-more quantifier is not supported; use '~*' or spell out the arity.",
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(additional) = &self.additional_message {
            write!(f, "{} {}", self.msg(), additional)
        } else {
            write!(f, "{}", self.msg())
        }
    }
}

impl fmt::Debug for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} at {}:{}: {}",
            self.kind, self.location.start.line, self.location.start.column, self
        )
    }
}

impl std::error::Error for SyntaxError {}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum MatchErrorKind {
    /// the pattern or the target disagrees with the node kind schema
    SchemaMismatch,
    /// positional captures do not form a contiguous range from 0
    CaptureIndexGap,
    /// assert-on-failure match found no match
    AssertionFailed,
}

pub struct MatchError {
    pub kind: MatchErrorKind,
    pub additional_message: Option<String>,
}

impl MatchError {
    pub fn new(kind: MatchErrorKind) -> Self {
        Self {
            kind,
            additional_message: None,
        }
    }
    pub fn with_additional_message(mut self, msg: String) -> Self {
        self.additional_message = Some(msg);
        self
    }

    pub(crate) fn schema_mismatch(kind_name: &str, detail: &str) -> Self {
        Self::new(MatchErrorKind::SchemaMismatch)
            .with_additional_message(format!("{}: {}", kind_name, detail))
    }
    pub(crate) fn capture_index_gap(indices: &[usize]) -> Self {
        Self::new(MatchErrorKind::CaptureIndexGap)
            .with_additional_message(format!("got indices {:?}", indices))
    }

    fn msg(&self) -> &'static str {
        match_msg(&self.kind)
    }
}

#[cold]
#[inline(never)]
fn match_msg(kind: &MatchErrorKind) -> &'static str {
    use MatchErrorKind::*;
    match *kind {
        SchemaMismatch =>
            "Field layout disagrees with the node kind schema. The pattern was probably compiled against a stale schema.",
        CaptureIndexGap =>
            "Positional captures must use the contiguous indices $0..$n. This is a bug in the pattern, not a failed match.",
        AssertionFailed => "Pattern did not match.",
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(additional) = &self.additional_message {
            write!(f, "{} {}", self.msg(), additional)
        } else {
            write!(f, "{}", self.msg())
        }
    }
}

impl fmt::Debug for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self)
    }
}

impl std::error::Error for MatchError {}

/// Union of everything `compile` + `match` can fail with, for callers
/// composing both steps.
#[derive(Debug)]
pub enum Error {
    Syntax(SyntaxError),
    Match(MatchError),
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Error::Syntax(e)
    }
}
impl From<MatchError> for Error {
    fn from(e: MatchError) -> Self {
        Error::Match(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(e) => e.fmt(f),
            Error::Match(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {}
