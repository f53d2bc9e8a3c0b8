//! Identifier classification.
//!
//! Decides whether a code point may start or continue a property name, under
//! either the ECMAScript 6 identifier rules or the much looser rule of the
//! JSON standard, which allows nearly any defined code point in a (quoted)
//! key. The parser uses these predicates to validate unquoted identifiers;
//! the encoder uses them to decide whether a key may be emitted unquoted.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Which identifier grammar applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierMode {
    /// ECMAScript 6 `IdentifierName`: ID_Start plus `$` and `_` to start,
    /// ID_Continue plus `$`, ZWNJ and ZWJ to continue.
    Ecma6,
    /// The JSON standard: any defined code point at or above U+0020 except
    /// the quote and backslash characters. No start/part distinction.
    FullJson,
}

/// Zero-width non-joiner, allowed in identifier parts by ECMAScript.
const ZWNJ: char = '\u{200C}';
/// Zero-width joiner, allowed in identifier parts by ECMAScript.
const ZWJ: char = '\u{200D}';

/// ECMAScript reserved words, including future reserved words and the
/// literals. Keys matching one of these must be quoted unless the
/// configuration allows reserved words as identifiers.
static RESERVED_WORDS: &[&str] = &[
    "await",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "function",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "interface",
    "let",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "static",
    "super",
    "switch",
    "this",
    "throw",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// Is `word` an ECMAScript reserved word?
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.binary_search(&word).is_ok()
}

/// Is the code point assigned by the Unicode tables?
pub(crate) fn is_defined(c: char) -> bool {
    get_general_category(c) != GeneralCategory::Unassigned
}

/// May `c` begin an identifier under `mode`?
pub fn is_identifier_start(c: char, mode: IdentifierMode) -> bool {
    match mode {
        IdentifierMode::Ecma6 => c == '$' || c == '_' || unicode_ident::is_xid_start(c),
        IdentifierMode::FullJson => is_full_json_char(c),
    }
}

/// May `c` appear after the first character of an identifier under `mode`?
pub fn is_identifier_part(c: char, mode: IdentifierMode) -> bool {
    match mode {
        IdentifierMode::Ecma6 => {
            c == '$' || c == ZWNJ || c == ZWJ || unicode_ident::is_xid_continue(c)
        }
        IdentifierMode::FullJson => is_full_json_char(c),
    }
}

/// The JSON standard permits any defined code point in a key except the
/// string delimiters. Control characters below U+0020 are excluded because
/// they can never appear unescaped in the source text.
fn is_full_json_char(c: char) -> bool {
    c >= '\u{20}' && c != '"' && c != '\'' && c != '\\' && is_defined(c)
}

/// Validate a whole property name under `mode`. The empty string is never a
/// valid identifier.
pub fn is_valid_identifier(s: &str, mode: IdentifierMode) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first, mode) => {}
        _ => return false,
    }
    chars.all(|c| is_identifier_part(c, mode))
}

/// First code point of `s` that could not appear anywhere in an identifier
/// under `mode`, with its position in code points, for error reporting.
/// Quoted property names need no start character, so only the part rule
/// applies; the start rule gates bare emission through
/// [`is_valid_identifier`].
pub(crate) fn first_invalid_code_point(s: &str, mode: IdentifierMode) -> Option<(usize, char)> {
    s.chars()
        .enumerate()
        .find(|&(_, c)| !is_identifier_part(c, mode))
}
