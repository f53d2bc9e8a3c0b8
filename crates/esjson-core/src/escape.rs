//! Escaping and unescaping of string literals, code-point aware.
//!
//! The decode direction ([`unescape`]) recognizes every ECMAScript string
//! escape: the single-character escapes, legacy hex (`\xHH`) and octal
//! escapes, UTF-16 code-unit escapes (`\uXXXX`, joining surrogate pairs),
//! and the ECMAScript 6 code-point form (`\u{...}`). Malformed escapes are
//! passed through verbatim rather than failing hard.
//!
//! The encode direction ([`escape`]) applies the configured policies:
//! controls and structural characters always escape, non-ASCII and
//! supplementary-plane escaping are opt-in, and problem code points go
//! through the [`BadCharacterPolicy`].
//!
//! Rust strings are well-formed UTF-8, so an unmatched surrogate can only
//! ever arrive through an escape sequence; the encode-direction policy
//! therefore governs undefined code points, while the decode direction
//! governs both.

use crate::config::JsonConfig;
use crate::error::{JsonError, Result};
use crate::ident::is_defined;

/// Resolution for unmatched surrogates and undefined code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadCharacterPolicy {
    /// Substitute U+FFFD REPLACEMENT CHARACTER.
    #[default]
    Replace,
    /// Drop the offending code point.
    Discard,
    /// Raise an error naming the code point and its position.
    Error,
    /// Force a Unicode escape.
    Escape,
    /// Copy through verbatim.
    Pass,
}

/// The substitution character used by [`BadCharacterPolicy::Replace`].
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

const HIGH_SURROGATE: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const LOW_SURROGATE: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

/// One recognized escape sequence and the byte length it occupied.
enum Escape {
    /// A fully resolved character (single-char, hex, or octal escape).
    Char(char),
    /// A `\uXXXX` UTF-16 code unit, possibly half of a surrogate pair.
    CodeUnit(u32),
    /// A `\u{...}` code point, not yet range-checked.
    CodePoint(u32),
}

/// Match one escape sequence at the start of `s` (which begins with `\`).
/// Returns the parsed escape and its byte length, or `None` if the text
/// after the backslash forms no recognizable escape.
fn match_escape(s: &str) -> Option<(Escape, usize)> {
    let mut chars = s.chars();
    if chars.next() != Some('\\') {
        return None;
    }
    let c = chars.next()?;
    let simple = |ch: char| Some((Escape::Char(ch), 2));
    match c {
        'b' => simple('\u{8}'),
        't' => simple('\t'),
        'n' => simple('\n'),
        'v' => simple('\u{B}'),
        'f' => simple('\u{C}'),
        'r' => simple('\r'),
        '"' => simple('"'),
        '\'' => simple('\''),
        '/' => simple('/'),
        '\\' => simple('\\'),
        '0'..='7' => {
            // Legacy octal, up to three digits, max \377.
            let mut value = c.to_digit(8).unwrap();
            let mut len = 2;
            for d in chars.take(2) {
                match d.to_digit(8) {
                    Some(d) if value * 8 + d <= 0xFF => {
                        value = value * 8 + d;
                        len += 1;
                    }
                    _ => break,
                }
            }
            Some((Escape::Char(char::from_u32(value)?), len))
        }
        'x' => {
            let hex = s.get(2..4)?;
            let value = u32::from_str_radix(hex, 16).ok()?;
            Some((Escape::Char(char::from_u32(value)?), 4))
        }
        'u' => {
            if s.as_bytes().get(2) == Some(&b'{') {
                let close = s.find('}')?;
                let hex = &s[3..close];
                if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                let value = u32::from_str_radix(hex, 16).ok()?;
                Some((Escape::CodePoint(value), close + 1))
            } else {
                let hex = s.get(2..6)?;
                if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                let value = u32::from_str_radix(hex, 16).ok()?;
                Some((Escape::CodeUnit(value), 6))
            }
        }
        _ => None,
    }
}

/// Byte length of the recognized escape sequence at the start of `s`, used
/// by the pass-through policy. `None` if `s` does not start a recognized
/// escape.
pub(crate) fn recognized_escape_len(s: &str) -> Option<usize> {
    if !s.starts_with('\\') {
        return None;
    }
    match_escape(s).map(|(_, len)| len)
}

/// Resolve a problem code point from the decode direction. `original` is
/// the escape text as it appeared in the input, kept verbatim for the
/// `Escape` and `Pass` policies (a lone surrogate has no character form to
/// fall back to).
fn apply_decode_policy(
    cfg: &JsonConfig,
    cp: u32,
    offset: usize,
    original: &str,
    surrogate: bool,
    out: &mut String,
) -> Result<()> {
    match cfg.bad_character_policy {
        BadCharacterPolicy::Replace => out.push(REPLACEMENT_CHARACTER),
        BadCharacterPolicy::Discard => {}
        BadCharacterPolicy::Error => {
            return Err(if surrogate {
                JsonError::UnmatchedSurrogate { code_point: cp, offset }
            } else {
                JsonError::UndefinedCodePoint { code_point: cp, offset }
            });
        }
        BadCharacterPolicy::Escape | BadCharacterPolicy::Pass => {
            if let Some(c) = char::from_u32(cp) {
                if cfg.bad_character_policy == BadCharacterPolicy::Pass {
                    out.push(c);
                    return Ok(());
                }
            }
            out.push_str(original);
        }
    }
    Ok(())
}

/// Convert a raw string literal body into a string of real code points.
pub fn unescape(raw: &str, cfg: &JsonConfig) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let rest = &raw[i..];
        let c = rest.chars().next().unwrap();
        if c != '\\' {
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        let Some((esc, len)) = match_escape(rest) else {
            // Malformed escape: pass the backslash through verbatim.
            out.push('\\');
            i += 1;
            continue;
        };
        match esc {
            Escape::Char(ch) => {
                out.push(ch);
                i += len;
            }
            Escape::CodeUnit(unit) if HIGH_SURROGATE.contains(&unit) => {
                // A high surrogate must pair with a following \uXXXX low
                // surrogate to form one supplementary code point.
                let after = &raw[i + len..];
                if let Some((Escape::CodeUnit(low), low_len)) = match_escape(after) {
                    if LOW_SURROGATE.contains(&low) {
                        let cp = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        // Surrogate math always lands in plane 1..=16.
                        out.push(char::from_u32(cp).unwrap());
                        i += len + low_len;
                        continue;
                    }
                }
                apply_decode_policy(cfg, unit, i, &raw[i..i + len], true, &mut out)?;
                i += len;
            }
            Escape::CodeUnit(unit) if LOW_SURROGATE.contains(&unit) => {
                apply_decode_policy(cfg, unit, i, &raw[i..i + len], true, &mut out)?;
                i += len;
            }
            Escape::CodeUnit(unit) | Escape::CodePoint(unit) => {
                match char::from_u32(unit) {
                    Some(ch) if is_defined(ch) => out.push(ch),
                    _ => {
                        let surrogate =
                            HIGH_SURROGATE.contains(&unit) || LOW_SURROGATE.contains(&unit);
                        apply_decode_policy(cfg, unit, i, &raw[i..i + len], surrogate, &mut out)?;
                    }
                }
                i += len;
            }
        }
    }
    Ok(out)
}

/// Emit the Unicode escape for `c`, preferring the ECMAScript 6 code-point
/// form when it is enabled and not longer than the code-unit form.
fn push_unicode_escape(c: char, cfg: &JsonConfig, out: &mut String) {
    let cp = c as u32;
    if cp <= 0xFFFF {
        // Up to two hex digits the braced form is no longer than the
        // code-unit form; a third digit makes it seven characters.
        if cfg.use_ecma6 && cp <= 0xFF {
            out.push_str(&format!("\\u{{{cp:X}}}"));
        } else {
            out.push_str(&format!("\\u{cp:04X}"));
        }
    } else if cfg.use_ecma6 {
        // `\u{X}` caps at 10 characters, the surrogate pair is always 12.
        out.push_str(&format!("\\u{{{cp:X}}}"));
    } else {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04X}", unit));
        }
    }
}

/// Escape one code point of the encode direction, honoring the configured
/// policies. `prev` is the previous output character, consulted for the
/// contextual `</` escape.
fn escape_char(
    c: char,
    prev: Option<char>,
    offset: usize,
    cfg: &JsonConfig,
    out: &mut String,
) -> Result<()> {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\u{8}' => out.push_str("\\b"),
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '\u{C}' => out.push_str("\\f"),
        '\r' => out.push_str("\\r"),
        '/' if prev == Some('<') => out.push_str("\\/"),
        c if (c as u32) < 0x20 => push_unicode_escape(c, cfg, out),
        c if !is_defined(c) => match cfg.bad_character_policy {
            BadCharacterPolicy::Replace => out.push(REPLACEMENT_CHARACTER),
            BadCharacterPolicy::Discard => {}
            BadCharacterPolicy::Error => {
                return Err(JsonError::UndefinedCodePoint {
                    code_point: c as u32,
                    offset,
                });
            }
            BadCharacterPolicy::Escape => push_unicode_escape(c, cfg, out),
            BadCharacterPolicy::Pass => out.push(c),
        },
        c if cfg.escape_non_ascii() && (c as u32) >= 0x80 => push_unicode_escape(c, cfg, out),
        c if cfg.escape_surrogates() && (c as u32) > 0xFFFF => push_unicode_escape(c, cfg, out),
        c => out.push(c),
    }
    Ok(())
}

/// Escape a string for emission inside double quotes.
pub fn escape(s: &str, cfg: &JsonConfig) -> Result<String> {
    let mut out = String::with_capacity(s.len() + 2);
    let mut i = 0;
    let mut prev = None;
    while i < s.len() {
        let rest = &s[i..];
        if cfg.pass_through_escapes {
            if let Some(len) = recognized_escape_len(rest) {
                out.push_str(&rest[..len]);
                prev = rest[..len].chars().last();
                i += len;
                continue;
            }
        }
        let c = rest.chars().next().unwrap();
        escape_char(c, prev, i, cfg, &mut out)?;
        prev = Some(c);
        i += c.len_utf8();
    }
    Ok(out)
}
