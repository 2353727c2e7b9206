/*!
Host grammar parser: source text to target `Node` trees.

The grammar is a small statement/expression language: attribute access,
calls with keyword arguments, subscripts and slices, literals, tuples,
lists, dicts, `await`, starred expressions, plain and annotated assignment
and `return`. One statement per line; `;` also separates. Pattern meta
tokens are a syntax error here; they belong to the pattern compiler.
*/

use crate::ast::{Const, FieldVec, Node, Value};
use crate::error::{SyntaxError, SyntaxErrorKind as ErrorKind};
use crate::schema::NodeKind;
use crate::tokenizer::{Kw, Token, Tokenizer};
use crate::{Name, Position, SourceLocation};

/// Parses a sequence of statements.
pub fn parse_module(source: &str) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser::new(source)?;
    parser.module()
}

/// Parses exactly one statement.
pub fn parse_stmt(source: &str) -> Result<Node, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let mut stmts = parser.module()?;
    match stmts.len() {
        1 => Ok(stmts.pop().expect("len checked")),
        0 => Err(SyntaxError::new(ErrorKind::EmptyInput)),
        _ => Err(SyntaxError::new(ErrorKind::ExpectedStatementEnd)
            .with_location(stmts[1].location().clone())),
    }
}

/// Parses exactly one bare expression.
pub fn parse_expr(source: &str) -> Result<Node, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expr()?;
    parser.expect_eof()?;
    Ok(expr)
}

pub(crate) struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    cur: Token<'a>,
    cur_loc: SourceLocation,
    last_end: Position,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> Result<Self, SyntaxError> {
        let mut tokenizer = Tokenizer::new(source);
        let (cur, cur_loc) = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            cur,
            cur_loc,
            last_end: Position::default(),
        })
    }

    pub(crate) fn cur(&self) -> Token<'a> {
        self.cur
    }

    pub(crate) fn start_pos(&self) -> Position {
        self.cur_loc.start.clone()
    }

    pub(crate) fn cur_location(&self) -> SourceLocation {
        self.cur_loc.clone()
    }

    pub(crate) fn loc_from(&self, start: Position) -> SourceLocation {
        SourceLocation {
            start,
            end: self.last_end.clone(),
        }
    }

    pub(crate) fn bump(&mut self) -> Result<(), SyntaxError> {
        self.last_end = self.cur_loc.end.clone();
        let (token, loc) = self.tokenizer.next_token()?;
        self.cur = token;
        self.cur_loc = loc;
        Ok(())
    }

    pub(crate) fn eat(&mut self, token: Token<'a>) -> Result<bool, SyntaxError> {
        if self.cur == token {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, token: Token<'a>) -> Result<(), SyntaxError> {
        if self.cur == token {
            self.bump()
        } else {
            self.unexpected(&format!("expected {:?}", token))
        }
    }

    pub(crate) fn unexpected<T>(&self, context: &str) -> Result<T, SyntaxError> {
        let kind = match self.cur {
            Token::Eof => ErrorKind::UnexpectedEndOfInput,
            Token::Meta(_) | Token::Tilde | Token::Backtick => ErrorKind::MetaTokenOutsideDsl,
            _ => ErrorKind::UnexpectedToken,
        };
        Err(SyntaxError::new(kind)
            .with_location(self.cur_loc.clone())
            .with_additional_message(format!("got {:?}, {}", self.cur, context)))
    }

    pub(crate) fn ident(&mut self) -> Result<Name<'a>, SyntaxError> {
        match self.cur {
            Token::Name(id) => {
                self.bump()?;
                Ok(id)
            }
            _ => Err(SyntaxError::new(ErrorKind::ExpectedIdentifier)
                .with_location(self.cur_loc.clone())),
        }
    }

    pub(crate) fn at_stmt_end(&self) -> bool {
        matches!(self.cur, Token::Newline | Token::Semi | Token::Eof)
    }

    pub(crate) fn expect_eof(&mut self) -> Result<(), SyntaxError> {
        while matches!(self.cur, Token::Newline | Token::Semi) {
            self.bump()?;
        }
        if self.cur == Token::Eof {
            Ok(())
        } else {
            self.unexpected("expected end of input")
        }
    }

    fn module(&mut self) -> Result<Vec<Node<'a>>, SyntaxError> {
        let mut stmts = vec![];
        loop {
            while matches!(self.cur, Token::Newline | Token::Semi) {
                self.bump()?;
            }
            if self.cur == Token::Eof {
                return Ok(stmts);
            }
            stmts.push(self.stmt()?);
            if !self.at_stmt_end() {
                return self.unexpected("expected a statement end");
            }
        }
    }

    fn stmt(&mut self) -> Result<Node<'a>, SyntaxError> {
        let start = self.start_pos();
        if self.eat(Token::Kw(Kw::Return))? {
            let value = if self.at_stmt_end() {
                Value::Null
            } else {
                v(self.expr()?)
            };
            return Ok(node(NodeKind::Return, vec![], vec![value], self.loc_from(start)));
        }

        let first = self.expr()?;
        if self.eat(Token::Colon)? {
            let annotation = self.expr()?;
            let value = if self.eat(Token::Assign)? {
                v(self.expr()?)
            } else {
                Value::Null
            };
            return Ok(node(
                NodeKind::AnnAssign,
                vec![],
                vec![v(first), v(annotation), value],
                self.loc_from(start),
            ));
        }
        if self.cur == Token::Assign {
            let mut exprs = vec![v(first)];
            while self.eat(Token::Assign)? {
                exprs.push(v(self.expr()?));
            }
            let value = exprs.pop().expect("at least two exprs");
            return Ok(node(
                NodeKind::Assign,
                vec![],
                vec![Value::List(exprs), value],
                self.loc_from(start),
            ));
        }
        Ok(node(
            NodeKind::ExprStmt,
            vec![],
            vec![v(first)],
            self.loc_from(start),
        ))
    }

    fn expr(&mut self) -> Result<Node<'a>, SyntaxError> {
        let start = self.start_pos();
        if self.eat(Token::Kw(Kw::Await))? {
            let value = self.expr()?;
            return Ok(node(NodeKind::Await, vec![], vec![v(value)], self.loc_from(start)));
        }
        if self.eat(Token::Star)? {
            let value = self.expr()?;
            return Ok(node(NodeKind::Starred, vec![], vec![v(value)], self.loc_from(start)));
        }
        let atom = self.atom()?;
        self.trailers(atom, start)
    }

    fn trailers(&mut self, mut node_: Node<'a>, start: Position) -> Result<Node<'a>, SyntaxError> {
        loop {
            if self.eat(Token::Dot)? {
                let attr = self.ident()?;
                node_ = node(
                    NodeKind::Attribute,
                    vec![Value::Ident(attr)],
                    vec![v(node_)],
                    self.loc_from(start.clone()),
                );
            } else if self.eat(Token::LParen)? {
                let (args, keywords) = self.call_args()?;
                node_ = node(
                    NodeKind::Call,
                    vec![],
                    vec![v(node_), Value::List(args), Value::List(keywords)],
                    self.loc_from(start.clone()),
                );
            } else if self.eat(Token::LBracket)? {
                let slice = self.subscript()?;
                self.expect(Token::RBracket)?;
                node_ = node(
                    NodeKind::Subscript,
                    vec![],
                    vec![v(node_), slice],
                    self.loc_from(start.clone()),
                );
            } else {
                return Ok(node_);
            }
        }
    }

    fn call_args(&mut self) -> Result<(Vec<Value<'a>>, Vec<Value<'a>>), SyntaxError> {
        let mut args = vec![];
        let mut keywords = vec![];
        loop {
            if self.eat(Token::RParen)? {
                return Ok((args, keywords));
            }
            let start = self.start_pos();
            let item = self.expr()?;
            if item.kind() == NodeKind::Name && self.cur == Token::Assign {
                self.bump()?;
                let arg = match item.plain() {
                    [Value::Ident(id)] => *id,
                    _ => unreachable!("Name node holds its id"),
                };
                let value = self.expr()?;
                keywords.push(v(node(
                    NodeKind::Keyword,
                    vec![Value::Ident(arg)],
                    vec![v(value)],
                    self.loc_from(start),
                )));
            } else {
                if !keywords.is_empty() {
                    return self.unexpected("positional argument follows keyword argument");
                }
                args.push(v(item));
            }
            if !self.eat(Token::Comma)? {
                self.expect(Token::RParen)?;
                return Ok((args, keywords));
            }
        }
    }

    fn subscript(&mut self) -> Result<Value<'a>, SyntaxError> {
        let start = self.start_pos();
        let lower = if self.cur == Token::Colon {
            Value::Null
        } else {
            v(self.expr()?)
        };
        if !self.eat(Token::Colon)? {
            return match lower {
                Value::Null => self.unexpected("expected a subscript"),
                index => Ok(index),
            };
        }
        let upper = if matches!(self.cur, Token::Colon | Token::RBracket) {
            Value::Null
        } else {
            v(self.expr()?)
        };
        let step = if self.eat(Token::Colon)? && self.cur != Token::RBracket {
            v(self.expr()?)
        } else {
            Value::Null
        };
        Ok(v(node(
            NodeKind::Slice,
            vec![],
            vec![lower, upper, step],
            self.loc_from(start),
        )))
    }

    fn atom(&mut self) -> Result<Node<'a>, SyntaxError> {
        let start = self.start_pos();
        match self.cur {
            Token::Name(id) => {
                self.bump()?;
                Ok(node(
                    NodeKind::Name,
                    vec![Value::Ident(id)],
                    vec![],
                    self.loc_from(start),
                ))
            }
            Token::Int(i) => {
                self.bump()?;
                Ok(constant(Const::Int(i), self.loc_from(start)))
            }
            Token::Str(s) => {
                self.bump()?;
                Ok(constant(Const::Str(s), self.loc_from(start)))
            }
            Token::Kw(Kw::None) => {
                self.bump()?;
                Ok(constant(Const::None, self.loc_from(start)))
            }
            Token::Kw(Kw::True) => {
                self.bump()?;
                Ok(constant(Const::Bool(true), self.loc_from(start)))
            }
            Token::Kw(Kw::False) => {
                self.bump()?;
                Ok(constant(Const::Bool(false), self.loc_from(start)))
            }
            Token::LParen => {
                self.bump()?;
                self.paren_atom(start)
            }
            Token::LBracket => {
                self.bump()?;
                let elts = self.elements(Token::RBracket)?;
                Ok(node(
                    NodeKind::List,
                    vec![],
                    vec![Value::List(elts)],
                    self.loc_from(start),
                ))
            }
            Token::LBrace => {
                self.bump()?;
                self.dict_atom(start)
            }
            _ => self.unexpected("expected an expression"),
        }
    }

    fn paren_atom(&mut self, start: Position) -> Result<Node<'a>, SyntaxError> {
        if self.eat(Token::RParen)? {
            return Ok(node(
                NodeKind::Tuple,
                vec![],
                vec![Value::List(vec![])],
                self.loc_from(start),
            ));
        }
        let first = self.expr()?;
        if self.cur != Token::Comma {
            self.expect(Token::RParen)?;
            return Ok(first);
        }
        let mut elts = vec![v(first)];
        while self.eat(Token::Comma)? {
            if self.cur == Token::RParen {
                break;
            }
            elts.push(v(self.expr()?));
        }
        self.expect(Token::RParen)?;
        Ok(node(
            NodeKind::Tuple,
            vec![],
            vec![Value::List(elts)],
            self.loc_from(start),
        ))
    }

    fn dict_atom(&mut self, start: Position) -> Result<Node<'a>, SyntaxError> {
        let mut keys = vec![];
        let mut values = vec![];
        loop {
            if self.eat(Token::RBrace)? {
                break;
            }
            keys.push(v(self.expr()?));
            self.expect(Token::Colon)?;
            values.push(v(self.expr()?));
            if !self.eat(Token::Comma)? {
                self.expect(Token::RBrace)?;
                break;
            }
        }
        Ok(node(
            NodeKind::Dict,
            vec![],
            vec![Value::List(keys), Value::List(values)],
            self.loc_from(start),
        ))
    }

    fn elements(&mut self, close: Token<'a>) -> Result<Vec<Value<'a>>, SyntaxError> {
        let mut elts = vec![];
        loop {
            if self.eat(close)? {
                return Ok(elts);
            }
            elts.push(v(self.expr()?));
            if !self.eat(Token::Comma)? {
                self.expect(close)?;
                return Ok(elts);
            }
        }
    }
}

fn node<'a>(
    kind: NodeKind,
    plain: FieldVec<'a>,
    children: FieldVec<'a>,
    location: SourceLocation,
) -> Node<'a> {
    Node::build(kind, plain, children, location)
}

fn constant<'a>(c: Const<'a>, location: SourceLocation) -> Node<'a> {
    node(NodeKind::Constant, vec![Value::Const(c)], vec![], location)
}

fn v(node: Node) -> Value {
    Value::Node(Box::new(node))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cast;

    fn roundtrip(source: &str) -> String {
        parse_stmt(source).unwrap().to_string()
    }

    #[test]
    fn parses_postfix_chains() {
        let stmt = parse_stmt("self.method(arg)[0]").unwrap();
        assert_eq!(stmt.kind(), NodeKind::ExprStmt);
        let sub = cast!(&stmt.children()[0], Value::Node);
        assert_eq!(sub.kind(), NodeKind::Subscript);
        assert_eq!(roundtrip("self.method(arg)[0]"), "self.method(arg)[0]");
    }

    #[test]
    fn parses_statements() {
        assert_eq!(roundtrip("x = y"), "x = y");
        assert_eq!(roundtrip("a = b = c"), "a = b = c");
        assert_eq!(roundtrip("x: t = 1"), "x: t = 1");
        assert_eq!(roundtrip("return"), "return");
        assert_eq!(roundtrip("return f(1)"), "return f(1)");
        assert_eq!(roundtrip("await a()"), "await a()");
    }

    #[test]
    fn parses_literals() {
        assert_eq!(roundtrip("{0: None}"), "{0: None}");
        assert_eq!(roundtrip("(1,)"), "(1,)");
        assert_eq!(roundtrip("[1, 'a', True]"), "[1, \"a\", True]");
        assert_eq!(roundtrip("lst[1:2]"), "lst[1:2]");
        assert_eq!(roundtrip("lst[::2]"), "lst[::2]");
    }

    #[test]
    fn parses_call_keywords() {
        assert_eq!(roundtrip("f(a, k=1)"), "f(a, k=1)");
        let err = parse_stmt("f(k=1, a)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn parses_modules() {
        let stmts = parse_module("a = 1\nb = 2; c\n").unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[2].kind(), NodeKind::ExprStmt);
    }

    #[test]
    fn rejects_meta_tokens() {
        let err = parse_stmt("$x.y").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetaTokenOutsideDsl);
        let err = parse_stmt("f(~)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetaTokenOutsideDsl);
    }

    #[test]
    fn tracks_locations() {
        let stmt = parse_stmt("a.b").unwrap();
        let loc = stmt.location();
        assert_eq!((loc.start.offset, loc.end.offset), (0, 3));
    }
}
