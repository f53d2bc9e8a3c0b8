//! Error types for parsing and encoding.

use std::fmt;

use thiserror::Error;

use crate::tokenizer::TokenKind;

/// Location within the input character stream, tracked by the tokenizer
/// and attached to every parse-side error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in code points.
    pub column: usize,
    /// 0-based byte offset into the input.
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised by the parser, escape engine, and encoder.
///
/// Every variant represents invalid input or invalid configuration, never a
/// transient failure; callers should not retry. Programmatic handling should
/// match on the variant and its structured fields, not the message text.
#[derive(Error, Debug)]
pub enum JsonError {
    /// The parser met a token of the wrong kind.
    #[error("parse error at {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        position: Position,
    },

    /// The tokenizer could not form a token at all.
    #[error("parse error at {position}: {message}")]
    Syntax { message: String, position: Position },

    /// A property name failed identifier validation, or is a reserved word
    /// in a context where reserved words are disallowed.
    #[error("bad property name `{name}`: {reason}")]
    BadPropertyName { name: String, reason: String },

    /// Two keys of one object normalized to the same emitted text.
    #[error("duplicate property name `{name}` in object")]
    DuplicateProperty { name: String },

    /// A container was revisited while it was still on the encode path.
    #[error("data structure loop detected on {kind}")]
    DataStructureLoop { kind: &'static str },

    /// A surrogate escape without its partner, under the `Error` policy.
    #[error("unmatched surrogate U+{code_point:04X} at offset {offset}")]
    UnmatchedSurrogate { code_point: u32, offset: usize },

    /// A code point the Unicode tables mark unassigned, under the `Error`
    /// policy.
    #[error("undefined code point U+{code_point:04X} at offset {offset}")]
    UndefinedCodePoint { code_point: u32, offset: usize },

    /// A date token or date-typed string did not match any configured or
    /// built-in format.
    #[error("unparseable date `{text}`")]
    DateParse { text: String },

    /// Input nesting exceeded the configured bound. Raised instead of
    /// letting pathological input exhaust the call stack.
    #[error("maximum nesting depth of {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// I/O failure from a caller-supplied reader.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Write failure from a caller-supplied sink.
    #[error("output sink error")]
    Fmt(#[from] fmt::Error),
}

/// Convenience alias used throughout esjson-core.
pub type Result<T> = std::result::Result<T, JsonError>;
