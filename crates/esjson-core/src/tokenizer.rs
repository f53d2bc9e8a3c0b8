//! Tokenizer for the loose ECMAScript-flavored JSON grammar.
//!
//! Converts a character stream into tokens: structural punctuation, quoted
//! strings (single or double quotes), unquoted identifier runs, the full
//! range of ECMAScript numeric literals (decimal, hex, octal, floating
//! point, `Infinity`, `NaN`), the `null`/`true`/`false` literals, and an
//! embedded `new Date("...")` constructor recognized as a single token.
//!
//! String tokens carry the *raw* literal body; unescaping happens in the
//! parser. Unquoted identifiers are likewise validated lazily by the
//! parser, not here.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{JsonError, Position, Result};
use crate::ident::{is_identifier_part, is_identifier_start, IdentifierMode};

/// Kinds of tokens in a JSON input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Comma,
    Colon,
    String,
    FloatingNumber,
    IntegerNumber,
    Literal,
    UnquotedId,
    Date,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::StartObject => "'{'",
            TokenKind::EndObject => "'}'",
            TokenKind::StartArray => "'['",
            TokenKind::EndArray => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::String => "string",
            TokenKind::FloatingNumber => "floating point number",
            TokenKind::IntegerNumber => "integer number",
            TokenKind::Literal => "literal",
            TokenKind::UnquotedId => "unquoted identifier",
            TokenKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// One token: its kind, raw text, and where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
}

/// Character-at-a-time tokenizer with line/column tracking.
pub struct Tokenizer<'a> {
    src: &'a str,
    iter: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            iter: src.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Current position in the stream.
    pub fn position(&mut self) -> Position {
        let offset = self
            .iter
            .peek()
            .map_or(self.src.len(), |&(offset, _)| offset);
        Position {
            line: self.line,
            column: self.column,
            offset,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let (offset, c) = self.iter.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some((offset, c))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.iter.peek().map(|&(_, c)| c)
    }

    fn syntax(&mut self, message: impl Into<String>) -> JsonError {
        JsonError::Syntax {
            message: message.into(),
            position: self.position(),
        }
    }

    /// The next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
        let position = self.position();
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        let structural = |kind| {
            Ok(Some(Token {
                kind,
                value: c.to_string(),
                position,
            }))
        };
        match c {
            '{' => {
                self.bump();
                structural(TokenKind::StartObject)
            }
            '}' => {
                self.bump();
                structural(TokenKind::EndObject)
            }
            '[' => {
                self.bump();
                structural(TokenKind::StartArray)
            }
            ']' => {
                self.bump();
                structural(TokenKind::EndArray)
            }
            ',' => {
                self.bump();
                structural(TokenKind::Comma)
            }
            ':' => {
                self.bump();
                structural(TokenKind::Colon)
            }
            '"' | '\'' => {
                let value = self.read_string_body()?;
                Ok(Some(Token {
                    kind: TokenKind::String,
                    value,
                    position,
                }))
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                self.read_number(position).map(Some)
            }
            c if is_identifier_start(c, IdentifierMode::Ecma6) => {
                self.read_word(position).map(Some)
            }
            c => Err(self.syntax(format!("unexpected character '{c}'"))),
        }
    }

    /// Consume a quoted string and return its raw body. The opening quote
    /// has been peeked but not consumed. Escaped quotes do not terminate
    /// the literal; quotes of the other kind are ordinary characters.
    fn read_string_body(&mut self) -> Result<String> {
        let (_, quote) = self.bump().unwrap();
        let mut body = String::new();
        loop {
            match self.bump() {
                Some((_, c)) if c == quote => return Ok(body),
                Some((_, '\\')) => {
                    body.push('\\');
                    if let Some((_, escaped)) = self.bump() {
                        body.push(escaped);
                    }
                }
                Some((_, c)) => body.push(c),
                None => return Err(self.syntax("unterminated string literal")),
            }
        }
    }

    /// Consume a numeric literal. Recognizes decimal and hex integers,
    /// floating point with optional exponent, and signed `Infinity`. The
    /// octal form is lexically a plain digit run here; the parser applies
    /// the octal interpretation.
    fn read_number(&mut self, position: Position) -> Result<Token> {
        let mut text = String::new();
        if matches!(self.peek_char(), Some('-' | '+')) {
            text.push(self.bump().unwrap().1);
        }

        if self.peek_char() == Some('I') {
            let word = self.read_identifier_run();
            if word == "Infinity" {
                text.push_str(&word);
                return Ok(Token {
                    kind: TokenKind::FloatingNumber,
                    value: text,
                    position,
                });
            }
            return Err(self.syntax(format!("malformed number '{text}{word}'")));
        }

        // Hex integers: 0x / 0X prefix.
        if self.peek_char() == Some('0') {
            text.push(self.bump().unwrap().1);
            if matches!(self.peek_char(), Some('x' | 'X')) {
                text.push(self.bump().unwrap().1);
                let digits = self.read_while(|c| c.is_ascii_hexdigit());
                if digits.is_empty() {
                    return Err(self.syntax("malformed hex number"));
                }
                text.push_str(&digits);
                return Ok(Token {
                    kind: TokenKind::IntegerNumber,
                    value: text,
                    position,
                });
            }
        }

        text.push_str(&self.read_while(|c| c.is_ascii_digit()));
        let mut floating = false;

        if self.peek_char() == Some('.') {
            // Only part of the number when a digit follows.
            let mut lookahead = self.iter.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some(&(_, d)) if d.is_ascii_digit()) {
                floating = true;
                text.push(self.bump().unwrap().1);
                text.push_str(&self.read_while(|c| c.is_ascii_digit()));
            }
        }

        if matches!(self.peek_char(), Some('e' | 'E'))
            && text.chars().any(|c| c.is_ascii_digit())
        {
            floating = true;
            text.push(self.bump().unwrap().1);
            if matches!(self.peek_char(), Some('-' | '+')) {
                text.push(self.bump().unwrap().1);
            }
            let digits = self.read_while(|c| c.is_ascii_digit());
            if digits.is_empty() {
                return Err(self.syntax("malformed exponent"));
            }
            text.push_str(&digits);
        }

        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.syntax(format!("malformed number '{text}'")));
        }

        Ok(Token {
            kind: if floating {
                TokenKind::FloatingNumber
            } else {
                TokenKind::IntegerNumber
            },
            value: text,
            position,
        })
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while matches!(self.peek_char(), Some(c) if pred(c)) {
            out.push(self.bump().unwrap().1);
        }
        out
    }

    fn read_identifier_run(&mut self) -> String {
        self.read_while(|c| is_identifier_part(c, IdentifierMode::Ecma6))
    }

    /// Consume an identifier run and classify it: a keyword literal, a
    /// numeric literal, the start of a `new Date("...")` constructor, or a
    /// plain unquoted identifier.
    fn read_word(&mut self, position: Position) -> Result<Token> {
        let word = self.read_identifier_run();
        let kind = match word.as_str() {
            "null" | "true" | "false" => TokenKind::Literal,
            "Infinity" | "NaN" => TokenKind::FloatingNumber,
            "new" => return self.read_date_constructor(position),
            _ => TokenKind::UnquotedId,
        };
        Ok(Token {
            kind,
            value: word,
            position,
        })
    }

    /// Consume the remainder of `new Date("...")` after the `new` keyword.
    /// The whole construct becomes one DATE token whose value is the raw
    /// quoted string body.
    fn read_date_constructor(&mut self, position: Position) -> Result<Token> {
        self.skip_whitespace();
        let ctor = self.read_identifier_run();
        if ctor != "Date" {
            return Err(self.syntax(format!("expected 'Date' after 'new', found '{ctor}'")));
        }
        self.skip_whitespace();
        if self.bump().map(|(_, c)| c) != Some('(') {
            return Err(self.syntax("expected '(' in date constructor"));
        }
        self.skip_whitespace();
        match self.peek_char() {
            Some('"' | '\'') => {}
            _ => return Err(self.syntax("expected string literal in date constructor")),
        }
        let value = self.read_string_body()?;
        self.skip_whitespace();
        if self.bump().map(|(_, c)| c) != Some(')') {
            return Err(self.syntax("expected ')' in date constructor"));
        }
        Ok(Token {
            kind: TokenKind::Date,
            value,
            position,
        })
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }
}
