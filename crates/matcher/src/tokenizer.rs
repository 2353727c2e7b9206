//! Tokenization shared by the host-grammar parser and the pattern compiler.
//! The token set is the host grammar's plus the pattern meta tokens
//! (`~`, `` ` ``, `$name`/`$index`); the host parser rejects the latter.

use crate::error::{SyntaxError, SyntaxErrorKind as ErrorKind};
use crate::{Name, Position, SourceLocation};
use phf::phf_map;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kw {
    Return,
    Await,
    None,
    True,
    False,
}

static KEYWORDS: phf::Map<&'static str, Kw> = phf_map! {
    "return" => Kw::Return,
    "await" => Kw::Await,
    "None" => Kw::None,
    "True" => Kw::True,
    "False" => Kw::False,
};

/// Key of a `$` capture token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey<'a> {
    Name(Name<'a>),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Name(Name<'a>),
    Int(i64),
    /// string literal content, quotes stripped, escapes kept raw
    Str(&'a str),
    Kw(Kw),

    // pattern meta tokens
    Meta(MetaKey<'a>),
    Tilde,
    Backtick,

    Dot,
    Comma,
    Colon,
    Semi,
    Assign,
    Star,
    Plus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Newline,
    Eof,
}

pub struct Tokenizer<'a> {
    source: &'a str,
    chars: Chars<'a>,
    pos: Position,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars(),
            pos: Position::default(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn location_from(&self, start: Position) -> SourceLocation {
        SourceLocation {
            start,
            end: self.pos.clone(),
        }
    }

    fn error(&self, kind: ErrorKind, start: Position) -> SyntaxError {
        SyntaxError::new(kind).with_location(self.location_from(start))
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn ident(&mut self) -> Name<'a> {
        let start = self.pos.offset;
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        &self.source[start..self.pos.offset]
    }

    fn number(&mut self, start: Position) -> Result<Token<'a>, SyntaxError> {
        let from = self.pos.offset;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[from..self.pos.offset];
        text.parse()
            .map(Token::Int)
            .map_err(|_| self.error(ErrorKind::InvalidNumber, start))
    }

    fn string(&mut self, quote: char, start: Position) -> Result<Token<'a>, SyntaxError> {
        let from = self.pos.offset;
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error(ErrorKind::UnterminatedString, start)),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    let content = &self.source[from..self.pos.offset];
                    self.bump();
                    return Ok(Token::Str(content));
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn meta(&mut self, start: Position) -> Result<Token<'a>, SyntaxError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let from = self.pos.offset;
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
                let index = self.source[from..self.pos.offset]
                    .parse()
                    .map_err(|_| self.error(ErrorKind::InvalidCaptureKey, start))?;
                Ok(Token::Meta(MetaKey::Index(index)))
            }
            Some(c) if c == '_' || c.is_alphabetic() => Ok(Token::Meta(MetaKey::Name(self.ident()))),
            _ => Err(self.error(ErrorKind::InvalidCaptureKey, start)),
        }
    }

    pub fn next_token(&mut self) -> Result<(Token<'a>, SourceLocation), SyntaxError> {
        self.skip_trivia();
        let start = self.pos.clone();
        let c = match self.peek() {
            None => return Ok((Token::Eof, self.location_from(start))),
            Some(c) => c,
        };
        let token = match c {
            '\n' => {
                self.bump();
                Token::Newline
            }
            '"' | '\'' => {
                self.bump();
                self.string(c, start.clone())?
            }
            '$' => {
                self.bump();
                self.meta(start.clone())?
            }
            '~' => {
                self.bump();
                Token::Tilde
            }
            '`' => {
                self.bump();
                Token::Backtick
            }
            '.' => {
                self.bump();
                Token::Dot
            }
            ',' => {
                self.bump();
                Token::Comma
            }
            ':' => {
                self.bump();
                Token::Colon
            }
            ';' => {
                self.bump();
                Token::Semi
            }
            '=' => {
                self.bump();
                Token::Assign
            }
            '*' => {
                self.bump();
                Token::Star
            }
            '+' => {
                self.bump();
                Token::Plus
            }
            '(' => {
                self.bump();
                Token::LParen
            }
            ')' => {
                self.bump();
                Token::RParen
            }
            '[' => {
                self.bump();
                Token::LBracket
            }
            ']' => {
                self.bump();
                Token::RBracket
            }
            '{' => {
                self.bump();
                Token::LBrace
            }
            '}' => {
                self.bump();
                Token::RBrace
            }
            c if c.is_ascii_digit() => self.number(start.clone())?,
            c if c == '_' || c.is_alphabetic() => {
                let name = self.ident();
                match KEYWORDS.get(name) {
                    Some(kw) => Token::Kw(*kw),
                    None => Token::Name(name),
                }
            }
            c => {
                self.bump();
                return Err(self
                    .error(ErrorKind::UnexpectedCharacter, start)
                    .with_additional_message(format!("{:?}", c)));
            }
        };
        Ok((token, self.location_from(start)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(source);
        let mut tokens = vec![];
        loop {
            let (token, _) = tokenizer.next_token().expect("scan failed");
            if token == Token::Eof {
                return tokens;
            }
            tokens.push(token);
        }
    }

    #[test]
    fn scans_host_tokens() {
        use super::Kw;
        use Token::*;
        assert_eq!(
            scan("self.method(1, 'a')"),
            [
                Name("self"),
                Dot,
                Name("method"),
                LParen,
                Int(1),
                Comma,
                Str("a"),
                RParen,
            ]
        );
        assert_eq!(scan("return await f"), [Kw(Kw::Return), Kw(Kw::Await), Name("f")]);
    }

    #[test]
    fn scans_meta_tokens() {
        use Token::*;
        assert_eq!(
            scan("$obj.~ `$0"),
            [
                Meta(MetaKey::Name("obj")),
                Dot,
                Tilde,
                Backtick,
                Meta(MetaKey::Index(0)),
            ]
        );
    }

    #[test]
    fn skips_comments_and_keeps_newlines() {
        use Token::*;
        assert_eq!(scan("a # trailing\nb"), [Name("a"), Newline, Name("b")]);
    }

    #[test]
    fn reports_positions() {
        let mut tokenizer = Tokenizer::new("ab cd");
        let (_, loc) = tokenizer.next_token().unwrap();
        assert_eq!((loc.start.offset, loc.end.offset), (0, 2));
        let (_, loc) = tokenizer.next_token().unwrap();
        assert_eq!((loc.start.offset, loc.end.offset), (3, 5));
        assert_eq!(loc.start.column, 4);
    }

    #[test]
    fn rejects_bad_input() {
        let mut tokenizer = Tokenizer::new("'oops");
        let err = tokenizer.next_token().unwrap_err();
        assert_eq!(err.kind, crate::error::SyntaxErrorKind::UnterminatedString);

        let mut tokenizer = Tokenizer::new("$ x");
        let err = tokenizer.next_token().unwrap_err();
        assert_eq!(err.kind, crate::error::SyntaxErrorKind::InvalidCaptureKey);
    }
}
