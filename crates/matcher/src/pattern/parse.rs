/*!
The pattern DSL compiler.

Pattern text is the host grammar plus the meta atoms: `~` (wildcard),
`` ` `` (identifier wildcard, identifier positions only), `$k` and
`$k{pattern}` (captures) and the rest quantifier `~*` in call argument
lists, which lowers to a whole-field wildcard. A statement-level pattern is
wrapped in an `ExprStmt` pattern, mirroring how the host parser wraps a bare
expression statement; the matcher's wrapper rule makes the two
interchangeable.

Token plumbing is shared with the host parser; only the grammar actions
differ, producing `Pat` trees instead of nodes.
*/

use crate::error::{SyntaxError, SyntaxErrorKind as ErrorKind};
use crate::parser::Parser;
use crate::pattern::{CaptureKey, NodePat, Pat, Pattern};
use crate::schema::NodeKind;
use crate::tokenizer::{Kw, MetaKey, Token};

/// Compiles one statement-shaped pattern.
pub fn compile(source: &str) -> Result<Pattern, SyntaxError> {
    let mut parser = PatternParser::new(source)?;
    let root = parser.stmt_pattern()?;
    parser.p.expect_eof()?;
    Ok(Pattern::new(root))
}

/// Compiles one bare expression pattern, without the statement wrapper.
pub fn compile_expr(source: &str) -> Result<Pattern, SyntaxError> {
    let mut parser = PatternParser::new(source)?;
    let root = parser.expr_pattern()?;
    parser.p.expect_eof()?;
    Ok(Pattern::new(root))
}

struct PatternParser<'a> {
    p: Parser<'a>,
}

/// One parsed call argument. `Rest` consumes the whole argument list and may
/// only stand alone.
enum Item<'a> {
    One(Pat<'a>),
    Rest(Pat<'a>),
}

impl<'a> PatternParser<'a> {
    fn new(source: &'a str) -> Result<Self, SyntaxError> {
        Ok(Self {
            p: Parser::new(source)?,
        })
    }

    fn stmt_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        while matches!(self.p.cur(), Token::Newline | Token::Semi) {
            self.p.bump()?;
        }
        if self.p.cur() == Token::Eof {
            return Err(SyntaxError::new(ErrorKind::EmptyInput));
        }
        if self.p.eat(Token::Kw(Kw::Return))? {
            let value = if self.p.at_stmt_end() {
                Pat::Null
            } else {
                self.expr_pattern()?
            };
            let mut np = NodePat::new(NodeKind::Return);
            np.set_child_at(0, value);
            return Ok(Pat::Node(np));
        }

        let first = self.expr_pattern()?;
        if self.p.eat(Token::Colon)? {
            let annotation = self.expr_pattern()?;
            let value = if self.p.eat(Token::Assign)? {
                self.expr_pattern()?
            } else {
                Pat::Null
            };
            let mut np = NodePat::new(NodeKind::AnnAssign);
            np.set_child_at(0, first);
            np.set_child_at(1, annotation);
            np.set_child_at(2, value);
            return Ok(Pat::Node(np));
        }
        if self.p.cur() == Token::Assign {
            let mut exprs = vec![first];
            while self.p.eat(Token::Assign)? {
                exprs.push(self.expr_pattern()?);
            }
            let value = exprs.pop().expect("at least two exprs");
            let mut np = NodePat::new(NodeKind::Assign);
            np.set_child_at(0, Pat::List(exprs));
            np.set_child_at(1, value);
            return Ok(Pat::Node(np));
        }
        let mut np = NodePat::new(NodeKind::ExprStmt);
        np.set_child_at(0, first);
        Ok(Pat::Node(np))
    }

    fn expr_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        if self.p.eat(Token::Kw(Kw::Await))? {
            let mut np = NodePat::new(NodeKind::Await);
            np.set_child_at(0, self.expr_pattern()?);
            return Ok(Pat::Node(np));
        }
        if self.p.eat(Token::Star)? {
            let mut np = NodePat::new(NodeKind::Starred);
            np.set_child_at(0, self.expr_pattern()?);
            return Ok(Pat::Node(np));
        }
        let atom = self.atom_pattern()?;
        self.trailers(atom)
    }

    fn trailers(&mut self, mut pat: Pat<'a>) -> Result<Pat<'a>, SyntaxError> {
        loop {
            if self.p.eat(Token::Dot)? {
                let attr = self.attr_pattern()?;
                let mut np = NodePat::new(NodeKind::Attribute);
                np.set_plain_at(0, attr);
                np.set_child_at(0, pat);
                pat = Pat::Node(np);
            } else if self.p.eat(Token::LParen)? {
                pat = self.call_pattern(pat)?;
            } else if self.p.eat(Token::LBracket)? {
                let slice = self.subscript_pattern()?;
                self.p.expect(Token::RBracket)?;
                let mut np = NodePat::new(NodeKind::Subscript);
                np.set_child_at(0, pat);
                np.set_child_at(1, slice);
                pat = Pat::Node(np);
            } else {
                return Ok(pat);
            }
        }
    }

    /// The field after `.`: a literal identifier, `` ` `` or a capture.
    fn attr_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        match self.p.cur() {
            Token::Backtick => {
                self.p.bump()?;
                Ok(Pat::WildcardId)
            }
            Token::Meta(key) => {
                self.p.bump()?;
                Ok(Pat::capture(capture_key(key), Pat::Wildcard))
            }
            _ => self.p.ident().map(Pat::Ident),
        }
    }

    fn atom_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        match self.p.cur() {
            Token::Tilde => {
                self.p.bump()?;
                Ok(Pat::Wildcard)
            }
            Token::Backtick => Err(SyntaxError::new(ErrorKind::MisplacedIdentWildcard)
                .with_location(self.p.cur_location())),
            Token::Meta(key) => {
                self.p.bump()?;
                match self.meta_pattern(key, false)? {
                    Item::One(pat) => Ok(pat),
                    Item::Rest(_) => unreachable!("rest is rejected without allow_rest"),
                }
            }
            Token::Name(id) => {
                self.p.bump()?;
                let mut np = NodePat::new(NodeKind::Name);
                np.set_plain_at(0, Pat::Ident(id));
                Ok(Pat::Node(np))
            }
            Token::Int(i) => {
                self.p.bump()?;
                Ok(constant(crate::ast::Const::Int(i)))
            }
            Token::Str(s) => {
                self.p.bump()?;
                Ok(constant(crate::ast::Const::Str(s)))
            }
            Token::Kw(Kw::None) => {
                self.p.bump()?;
                Ok(constant(crate::ast::Const::None))
            }
            Token::Kw(Kw::True) => {
                self.p.bump()?;
                Ok(constant(crate::ast::Const::Bool(true)))
            }
            Token::Kw(Kw::False) => {
                self.p.bump()?;
                Ok(constant(crate::ast::Const::Bool(false)))
            }
            Token::LParen => {
                self.p.bump()?;
                self.paren_pattern()
            }
            Token::LBracket => {
                self.p.bump()?;
                let elts = self.elements(Token::RBracket)?;
                let mut np = NodePat::new(NodeKind::List);
                np.set_child_at(0, Pat::List(elts));
                Ok(Pat::Node(np))
            }
            Token::LBrace => {
                self.p.bump()?;
                self.dict_pattern()
            }
            _ => self.p.unexpected("expected a pattern"),
        }
    }

    /// A capture atom after its `$key` token. Inside braces `~*` (rest) is
    /// legal only when the caller allows it, and `~+` is always rejected.
    fn meta_pattern(&mut self, key: MetaKey<'a>, allow_rest: bool) -> Result<Item<'a>, SyntaxError> {
        let key = capture_key(key);
        if !self.p.eat(Token::LBrace)? {
            return Ok(Item::One(Pat::capture(key, Pat::Wildcard)));
        }
        if self.p.eat(Token::Tilde)? {
            match self.p.cur() {
                Token::Star if allow_rest => {
                    self.p.bump()?;
                    self.p.expect(Token::RBrace)?;
                    return Ok(Item::Rest(Pat::capture(key, Pat::Wildcard)));
                }
                Token::Star => {
                    return Err(SyntaxError::new(ErrorKind::MisplacedRestQuantifier)
                        .with_location(self.p.cur_location()));
                }
                Token::Plus => {
                    return Err(SyntaxError::new(ErrorKind::UnsupportedQuantifier)
                        .with_location(self.p.cur_location()));
                }
                _ => {}
            }
            let inner = self.trailers(Pat::Wildcard)?;
            self.p.expect(Token::RBrace)?;
            return Ok(Item::One(Pat::capture(key, inner)));
        }
        let inner = self.expr_pattern()?;
        self.p.expect(Token::RBrace)?;
        Ok(Item::One(Pat::capture(key, inner)))
    }

    fn call_item(&mut self) -> Result<Item<'a>, SyntaxError> {
        if self.p.eat(Token::Tilde)? {
            match self.p.cur() {
                Token::Star => {
                    self.p.bump()?;
                    return Ok(Item::Rest(Pat::Wildcard));
                }
                Token::Plus => {
                    return Err(SyntaxError::new(ErrorKind::UnsupportedQuantifier)
                        .with_location(self.p.cur_location()));
                }
                _ => {}
            }
            return self.trailers(Pat::Wildcard).map(Item::One);
        }
        if let Token::Meta(key) = self.p.cur() {
            self.p.bump()?;
            return match self.meta_pattern(key, true)? {
                Item::One(pat) => self.trailers(pat).map(Item::One),
                rest => Ok(rest),
            };
        }
        self.expr_pattern().map(Item::One)
    }

    fn call_pattern(&mut self, func: Pat<'a>) -> Result<Pat<'a>, SyntaxError> {
        let mut np = NodePat::new(NodeKind::Call);
        np.set_child_at(0, func);
        let mut args = vec![];
        let mut keywords = vec![];
        let mut rest = None;
        loop {
            if self.p.eat(Token::RParen)? {
                break;
            }
            if rest.is_some() {
                return Err(SyntaxError::new(ErrorKind::MisplacedRestQuantifier)
                    .with_location(self.p.cur_location()));
            }
            match self.call_item()? {
                Item::Rest(pat) => {
                    if !args.is_empty() || !keywords.is_empty() {
                        return Err(SyntaxError::new(ErrorKind::MisplacedRestQuantifier)
                            .with_location(self.p.cur_location()));
                    }
                    rest = Some(pat);
                }
                Item::One(pat) => {
                    if name_of(&pat).is_some() && self.p.cur() == Token::Assign {
                        self.p.bump()?;
                        let arg = name_of(&pat).expect("checked above");
                        let value = self.expr_pattern()?;
                        let mut kw = NodePat::new(NodeKind::Keyword);
                        kw.set_plain_at(0, Pat::Ident(arg));
                        kw.set_child_at(0, value);
                        keywords.push(Pat::Node(kw));
                    } else {
                        if !keywords.is_empty() {
                            return self
                                .p
                                .unexpected("positional argument follows keyword argument");
                        }
                        args.push(pat);
                    }
                }
            }
            if !self.p.eat(Token::Comma)? {
                self.p.expect(Token::RParen)?;
                break;
            }
        }
        match rest {
            Some(pat) => {
                // the rest quantifier leaves the whole argument list,
                // keywords included, unconstrained
                np.set_child_at(1, pat);
                np.set_child_at(2, Pat::Wildcard);
            }
            None => {
                np.set_child_at(1, Pat::List(args));
                np.set_child_at(2, Pat::List(keywords));
            }
        }
        Ok(Pat::Node(np))
    }

    fn subscript_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        let lower = if self.p.cur() == Token::Colon {
            Pat::Null
        } else {
            self.expr_pattern()?
        };
        if !self.p.eat(Token::Colon)? {
            return match lower {
                Pat::Null => self.p.unexpected("expected a subscript"),
                index => Ok(index),
            };
        }
        let upper = if matches!(self.p.cur(), Token::Colon | Token::RBracket) {
            Pat::Null
        } else {
            self.expr_pattern()?
        };
        let step = if self.p.eat(Token::Colon)? && self.p.cur() != Token::RBracket {
            self.expr_pattern()?
        } else {
            Pat::Null
        };
        let mut np = NodePat::new(NodeKind::Slice);
        np.set_child_at(0, lower);
        np.set_child_at(1, upper);
        np.set_child_at(2, step);
        Ok(Pat::Node(np))
    }

    fn paren_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        if self.p.eat(Token::RParen)? {
            let mut np = NodePat::new(NodeKind::Tuple);
            np.set_child_at(0, Pat::List(vec![]));
            return Ok(Pat::Node(np));
        }
        let first = self.expr_pattern()?;
        if self.p.cur() != Token::Comma {
            self.p.expect(Token::RParen)?;
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.p.eat(Token::Comma)? {
            if self.p.cur() == Token::RParen {
                break;
            }
            elts.push(self.expr_pattern()?);
        }
        self.p.expect(Token::RParen)?;
        let mut np = NodePat::new(NodeKind::Tuple);
        np.set_child_at(0, Pat::List(elts));
        Ok(Pat::Node(np))
    }

    fn dict_pattern(&mut self) -> Result<Pat<'a>, SyntaxError> {
        let mut keys = vec![];
        let mut values = vec![];
        loop {
            if self.p.eat(Token::RBrace)? {
                break;
            }
            keys.push(self.expr_pattern()?);
            self.p.expect(Token::Colon)?;
            values.push(self.expr_pattern()?);
            if !self.p.eat(Token::Comma)? {
                self.p.expect(Token::RBrace)?;
                break;
            }
        }
        let mut np = NodePat::new(NodeKind::Dict);
        np.set_child_at(0, Pat::List(keys));
        np.set_child_at(1, Pat::List(values));
        Ok(Pat::Node(np))
    }

    fn elements(&mut self, close: Token<'a>) -> Result<Vec<Pat<'a>>, SyntaxError> {
        let mut elts = vec![];
        loop {
            if self.p.eat(close)? {
                return Ok(elts);
            }
            elts.push(self.expr_pattern()?);
            if !self.p.eat(Token::Comma)? {
                self.p.expect(close)?;
                return Ok(elts);
            }
        }
    }
}

fn capture_key(key: MetaKey) -> CaptureKey {
    match key {
        MetaKey::Name(name) => CaptureKey::Name(name),
        MetaKey::Index(index) => CaptureKey::Index(index),
    }
}

fn constant(c: crate::ast::Const) -> Pat {
    let mut np = NodePat::new(NodeKind::Constant);
    np.set_plain_at(0, Pat::Const(c));
    Pat::Node(np)
}

fn name_of<'s, 'a>(pat: &'s Pat<'a>) -> Option<crate::Name<'a>> {
    match pat {
        Pat::Node(np) if np.kind() == NodeKind::Name => match np.plain() {
            [Pat::Ident(id)] => Some(*id),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cast;
    use crate::pattern::PatternFlags;

    fn root_of(source: &str) -> Pat {
        compile(source).unwrap().root().clone()
    }

    #[test]
    fn wraps_statement_patterns() {
        let root = root_of("self.method");
        let np = cast!(&root, Pat::Node);
        assert_eq!(np.kind(), NodeKind::ExprStmt);
        let inner = cast!(&np.children()[0], Pat::Node);
        assert_eq!(inner.kind(), NodeKind::Attribute);
        assert_eq!(inner.plain(), &[Pat::Ident("method")]);
    }

    #[test]
    fn compile_expr_skips_the_wrapper() {
        let pattern = compile_expr("self.method").unwrap();
        let np = cast!(pattern.root(), Pat::Node);
        assert_eq!(np.kind(), NodeKind::Attribute);
    }

    #[test]
    fn bare_capture_defaults_to_wildcard() {
        let root = root_of("$x");
        let np = cast!(&root, Pat::Node);
        let capture = cast!(&np.children()[0], Pat::Capture);
        assert_eq!(capture.key, CaptureKey::Name("x"));
        assert_eq!(capture.inner, Pat::Wildcard);
    }

    #[test]
    fn captures_nest() {
        let pattern = compile_expr("$a{$b{~}}").unwrap();
        let outer = cast!(pattern.root(), Pat::Capture);
        let inner = cast!(&outer.inner, Pat::Capture);
        assert_eq!(outer.key, CaptureKey::Name("a"));
        assert_eq!(inner.key, CaptureKey::Name("b"));
        assert_eq!(inner.inner, Pat::Wildcard);
    }

    #[test]
    fn rest_quantifier_lowers_to_whole_field_wildcard() {
        let pattern = compile_expr("f(~*)").unwrap();
        let np = cast!(pattern.root(), Pat::Node);
        assert_eq!(np.children()[1], Pat::Wildcard);
        assert_eq!(np.children()[2], Pat::Wildcard);

        let pattern = compile_expr("f($0{~*})").unwrap();
        let np = cast!(pattern.root(), Pat::Node);
        let capture = cast!(&np.children()[1], Pat::Capture);
        assert_eq!(capture.key, CaptureKey::Index(0));
        assert_eq!(capture.inner, Pat::Wildcard);
    }

    #[test]
    fn explicit_parens_mean_exact_arity() {
        let pattern = compile_expr("f()").unwrap();
        let np = cast!(pattern.root(), Pat::Node);
        assert_eq!(np.children()[1], Pat::List(vec![]));
        assert_eq!(np.children()[2], Pat::List(vec![]));
    }

    #[test]
    fn one_or_more_quantifier_is_rejected() {
        let err = compile("return ~.format($0{~+})").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedQuantifier);
        let err = compile_expr("f(~+)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedQuantifier);
    }

    #[test]
    fn rest_must_stand_alone() {
        let err = compile_expr("f(a, ~*)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MisplacedRestQuantifier);
        let err = compile_expr("f(~*, a)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MisplacedRestQuantifier);
    }

    #[test]
    fn backtick_is_identifier_only() {
        let root = root_of("$chain{~.`.`}");
        // ExprStmt > Capture > Attribute(attr: `)
        let np = cast!(&root, Pat::Node);
        let capture = cast!(&np.children()[0], Pat::Capture);
        let attr = cast!(&capture.inner, Pat::Node);
        assert_eq!(attr.plain(), &[Pat::WildcardId]);

        let err = compile("`").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MisplacedIdentWildcard);
    }

    #[test]
    fn compile_is_pure() {
        let a = compile("$call{self.$method()}.$attr").unwrap();
        let b = compile("$call{self.$method()}.$attr").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn flags_reflect_the_pattern() {
        let pattern = compile("$0.a").unwrap();
        assert!(pattern.flags().contains(PatternFlags::POSITIONAL_CAPTURES));
        assert!(!pattern.flags().contains(PatternFlags::NAMED_CAPTURES));

        let pattern = compile("$sub{lst[~]}").unwrap();
        assert!(pattern.flags().contains(PatternFlags::NAMED_CAPTURES));
        assert!(pattern.flags().contains(PatternFlags::WILDCARD));
    }

    #[test]
    fn patterns_print_in_dsl_form() {
        for source in ["$obj.method", "$sub{lst[~]}", "x: type = value", "f(~*)"] {
            assert_eq!(compile(source).unwrap().to_string(), source);
        }
    }
}
