//! Recursive-descent parser over the token stream.
//!
//! Produces a [`Value`] tree with exact numeric type selection: integers
//! are parsed through `BigInt` and narrowed to the smallest tier that holds
//! them exactly, decimals through `BigDecimal` with float/double round-trip
//! checks, so no literal ever loses precision silently. Strings may be
//! re-interpreted as dates or numbers under the configured policies, and
//! arrays may be compacted into flat primitive arrays.
//!
//! Duplicate keys are not rejected here: the ordered mapping keeps the last
//! write, matching object-literal semantics. Duplicate detection is an
//! encode-time invariant.

use std::io::Read;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::config::JsonConfig;
use crate::error::{JsonError, Result};
use crate::escape::unescape;
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::value::{Object, PrimitiveArray, Value};

/// Maximum significant digits representable by a 32-bit float.
const MAX_PRECISION_FOR_FLOAT: i64 = 9;
/// Maximum significant digits representable by a 64-bit double.
const MAX_PRECISION_FOR_DOUBLE: i64 = 17;
/// Maximum significant digits representable by a 64-bit integer.
const MAX_PRECISION_FOR_LONG: i64 = 19;

/// Parse JSON text under the current process-default configuration.
pub fn parse(text: &str) -> Result<Value> {
    parse_with(text, &JsonConfig::new())
}

/// Parse JSON text under an explicit configuration snapshot.
pub fn parse_with(text: &str, cfg: &JsonConfig) -> Result<Value> {
    let mut parser = Parser {
        tokens: Tokenizer::new(text),
        cfg,
        depth: 0,
    };
    let Some(token) = parser.tokens.next_token()? else {
        return Ok(Value::Null);
    };
    let value = parser.parse_token(token)?;
    if parser.tokens.next_token()?.is_some() {
        return Err(JsonError::Syntax {
            message: "unexpected content after value".to_string(),
            position: parser.tokens.position(),
        });
    }
    Ok(value)
}

/// Parse JSON from a caller-supplied reader. The input is buffered fully
/// before tokenizing; this is a convenience form, not a streaming contract.
pub fn parse_reader<R: Read>(mut reader: R, cfg: &JsonConfig) -> Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_with(&text, cfg)
}

struct Parser<'a> {
    tokens: Tokenizer<'a>,
    cfg: &'a JsonConfig,
    depth: usize,
}

impl Parser<'_> {
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.cfg.max_nesting_depth {
            return Err(JsonError::DepthExceeded {
                limit: self.cfg.max_nesting_depth,
            });
        }
        Ok(())
    }

    fn required_token(&mut self) -> Result<Token> {
        self.tokens.next_token()?.ok_or_else(|| JsonError::Syntax {
            message: "unexpected end of input".to_string(),
            position: self.tokens.position(),
        })
    }

    fn unexpected(&self, expected: TokenKind, found: &Token) -> JsonError {
        JsonError::UnexpectedToken {
            expected,
            found: found.kind,
            position: found.position,
        }
    }

    fn parse_token(&mut self, token: Token) -> Result<Value> {
        match token.kind {
            TokenKind::StartObject => self.parse_object(),
            TokenKind::StartArray => self.parse_array(),
            _ => self.value_of(token),
        }
    }

    /// Alternating (identifier-or-string, colon, value) entries separated
    /// by commas until the close brace. Duplicate keys collapse, last
    /// write wins.
    fn parse_object(&mut self) -> Result<Value> {
        self.enter()?;
        let mut map = Object::new();
        let mut token = self.required_token()?;
        loop {
            match token.kind {
                TokenKind::String | TokenKind::UnquotedId => {
                    let key = unescape(&token.value, self.cfg)?;
                    let colon = self.required_token()?;
                    if colon.kind != TokenKind::Colon {
                        return Err(self.unexpected(TokenKind::Colon, &colon));
                    }
                    let value_token = self.required_token()?;
                    let value = self.parse_token(value_token)?;
                    map.insert(key, value);
                }
                TokenKind::EndObject => break,
                _ => return Err(self.unexpected(TokenKind::EndObject, &token)),
            }
            token = self.required_token()?;
            match token.kind {
                TokenKind::EndObject => break,
                TokenKind::Comma => token = self.required_token()?,
                _ => return Err(self.unexpected(TokenKind::EndObject, &token)),
            }
        }
        self.depth -= 1;
        Ok(Value::from(map))
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.enter()?;
        let mut list = Vec::new();
        let mut token = self.required_token()?;
        while token.kind != TokenKind::EndArray {
            list.push(self.parse_token(token)?);
            token = self.required_token()?;
            match token.kind {
                TokenKind::EndArray => break,
                TokenKind::Comma => token = self.required_token()?,
                _ => return Err(self.unexpected(TokenKind::EndArray, &token)),
            }
        }
        self.depth -= 1;

        if self.cfg.use_primitive_arrays {
            if let Some(array) = compact_primitives(&list, self.cfg.small_numbers) {
                return Ok(Value::Primitives(array));
            }
        }
        Ok(Value::from(list))
    }

    /// Convert one non-structural token into a value.
    fn value_of(&mut self, token: Token) -> Result<Value> {
        match token.kind {
            TokenKind::String => {
                let unescaped = unescape(&token.value, self.cfg)?;
                if self.cfg.format_dates() {
                    if let Ok(date) = parse_date(&unescaped, self.cfg) {
                        return Ok(Value::Date(date));
                    }
                }
                if self.cfg.encode_numeric_strings_as_numbers {
                    if is_javascript_floating(&unescaped) {
                        return Ok(decimal_from_str(&unescaped, self.cfg.small_numbers));
                    }
                    if is_javascript_integer(&unescaped) {
                        return integer_from_str(&unescaped, self.cfg.small_numbers);
                    }
                }
                Ok(Value::String(unescaped))
            }
            TokenKind::FloatingNumber => Ok(decimal_from_str(&token.value, self.cfg.small_numbers)),
            TokenKind::IntegerNumber => integer_from_str(&token.value, self.cfg.small_numbers),
            TokenKind::Literal => Ok(match token.value.as_str() {
                "null" => Value::Null,
                "true" => Value::Bool(true),
                _ => Value::Bool(false),
            }),
            TokenKind::Date => {
                let unescaped = unescape(&token.value, self.cfg)?;
                Ok(Value::Date(parse_date(&unescaped, self.cfg)?))
            }
            TokenKind::StartObject | TokenKind::StartArray => self.parse_token(token),
            _ => Err(self.unexpected(TokenKind::String, &token)),
        }
    }
}

/// Does `s` match the ECMAScript floating-point grammar (requires a decimal
/// point or `Infinity`/`NaN`; a bare digit run is an integer)?
pub(crate) fn is_javascript_floating(s: &str) -> bool {
    if s == "NaN" {
        return true;
    }
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    if body == "Infinity" {
        return true;
    }
    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (body, None),
    };
    let Some((int_part, frac_part)) = mantissa.split_once('.') else {
        return false;
    };
    if frac_part.is_empty() || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if !int_part.is_empty() && !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && e.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

/// Does `s` match the ECMAScript integer grammar (decimal or hex)?
pub(crate) fn is_javascript_integer(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit())
}

fn is_octal(s: &str) -> bool {
    s.starts_with('0') && s.bytes().all(|b| (b'0'..=b'7').contains(&b))
}

/// Narrow an exact integer to the smallest tier that holds it. The
/// byte/short/int tiers are only tried in small-numbers mode.
fn integer_tier(big: BigInt, small_numbers: bool) -> Value {
    if small_numbers {
        if let Some(n) = big.to_i8() {
            return Value::Byte(n);
        }
        if let Some(n) = big.to_i16() {
            return Value::Short(n);
        }
        if let Some(n) = big.to_i32() {
            return Value::Int(n);
        }
    }
    match big.to_i64() {
        Some(n) => Value::Long(n),
        None => Value::BigInt(big),
    }
}

/// Parse an integer literal (decimal, hex, or octal) with arbitrary
/// precision, then narrow.
pub(crate) fn integer_from_str(s: &str, small_numbers: bool) -> Result<Value> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let parsed = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        BigInt::parse_bytes(hex.as_bytes(), 16)
    } else if is_octal(body) {
        BigInt::parse_bytes(body.as_bytes(), 8)
    } else {
        BigInt::parse_bytes(body.as_bytes(), 10)
    };
    let Some(mut big) = parsed else {
        return Err(JsonError::Syntax {
            message: format!("malformed integer '{s}'"),
            position: Default::default(),
        });
    };
    if negative {
        big = -big;
    }
    Ok(integer_tier(big, small_numbers))
}

/// Exact `i64` value of an integer-valued decimal, if it fits.
fn exact_i64(dec: &BigDecimal) -> Option<i64> {
    if !dec.is_integer() {
        return None;
    }
    dec.with_scale(0).into_bigint_and_exponent().0.to_i64()
}

/// Parse a decimal literal, selecting the narrowest representation that
/// loses no information. `NaN` and `Infinity` bypass arbitrary-precision
/// parsing, which cannot represent them.
pub(crate) fn decimal_from_str(s: &str, small_numbers: bool) -> Value {
    let Ok(dec) = BigDecimal::from_str(s) else {
        // NaN or signed Infinity.
        return if small_numbers {
            Value::Float(s.parse::<f32>().unwrap_or(f32::NAN))
        } else {
            Value::Double(s.parse::<f64>().unwrap_or(f64::NAN))
        };
    };

    let scale = dec.fractional_digit_count();
    let precision = dec.digits() as i64;

    if small_numbers && scale <= 0 && (precision - scale) <= MAX_PRECISION_FOR_LONG {
        if let Some(n) = exact_i64(&dec) {
            return integer_tier(BigInt::from(n), small_numbers);
        }
    }
    if small_numbers && precision <= MAX_PRECISION_FOR_FLOAT {
        if let Some(f) = dec.to_f32() {
            if f.is_finite() && decimal_round_trips(&dec, &format!("{f}")) {
                return Value::Float(f);
            }
        }
    }
    if precision <= MAX_PRECISION_FOR_DOUBLE {
        if let Some(d) = dec.to_f64() {
            if d.is_finite() && decimal_round_trips(&dec, &format!("{d}")) {
                return Value::Double(d);
            }
        }
    }
    if !small_numbers && scale <= 0 && (precision - scale) <= MAX_PRECISION_FOR_LONG {
        if let Some(n) = exact_i64(&dec) {
            // Too much precision for a double, but exact as a long.
            return Value::Long(n);
        }
    }
    if small_numbers && scale == 0 {
        return Value::BigInt(dec.with_scale(0).into_bigint_and_exponent().0);
    }
    Value::Decimal(dec)
}

fn decimal_round_trips(dec: &BigDecimal, rendered: &str) -> bool {
    BigDecimal::from_str(rendered).is_ok_and(|back| back == *dec)
}

/// Parse a date string: caller-configured formats first, in order, then the
/// built-in ISO 8601 extended variants (fractional seconds optional, zone
/// offset optional, `Z` or `±HH[:MM]`).
pub(crate) fn parse_date(s: &str, cfg: &JsonConfig) -> Result<DateTime<FixedOffset>> {
    for fmt in &cfg.date_parse_formats {
        if let Ok(date) = DateTime::parse_from_str(s, fmt) {
            return Ok(date);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    // Offsets without minutes, e.g. +09.
    if let Ok(date) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Ok(date);
    }
    // No zone offset: interpreted as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc().fixed_offset());
    }
    Err(JsonError::DateParse {
        text: s.to_string(),
    })
}

/// Work representation for primitive-array compaction.
#[derive(Clone, Copy)]
enum Num {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Byte(n) => Some(Num::Byte(*n)),
            Value::Short(n) => Some(Num::Short(*n)),
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Long(n) => Some(Num::Long(*n)),
            Value::Float(n) => Some(Num::Float(*n)),
            Value::Double(n) => Some(Num::Double(*n)),
            _ => None,
        }
    }

    fn literal(self) -> String {
        match self {
            Num::Byte(n) => n.to_string(),
            Num::Short(n) => n.to_string(),
            Num::Int(n) => n.to_string(),
            Num::Long(n) => n.to_string(),
            Num::Float(n) => format!("{n}"),
            Num::Double(n) => format!("{n}"),
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Num::Byte(n) => i64::from(n),
            Num::Short(n) => i64::from(n),
            Num::Int(n) => i64::from(n),
            Num::Long(n) => n,
            Num::Float(n) => n as i64,
            Num::Double(n) => n as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            // Parse the shortest rendering rather than widening the bits,
            // so a float keeps its decimal value as a double.
            Num::Float(n) => format!("{n}").parse().unwrap_or(f64::from(n)),
            Num::Double(n) => n,
            other => other.as_i64() as f64,
        }
    }

    fn as_f32(self) -> f32 {
        match self {
            Num::Float(n) => n,
            Num::Double(n) => n as f32,
            other => other.as_i64() as f32,
        }
    }
}

/// Try to flatten a parsed sequence into a homogeneous primitive array.
///
/// Booleans, single-character strings, and numbers are mutually exclusive
/// families; `null`, arbitrary-precision values, and anything non-primitive
/// abort compaction. Within the numeric family the minimal common width is
/// chosen, converting between the integer and floating families only when
/// no element loses information.
fn compact_primitives(list: &[Value], small_numbers: bool) -> Option<PrimitiveArray> {
    if list.is_empty() {
        return None;
    }

    let mut have_number = false;
    let mut have_boolean = false;
    let mut have_char = false;
    for value in list {
        match value {
            Value::Byte(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_) => have_number = true,
            Value::Bool(_) => have_boolean = true,
            Value::String(s) if s.chars().count() == 1 => have_char = true,
            _ => return None,
        }
    }

    if have_boolean {
        if have_number || have_char {
            return None;
        }
        let bools = list
            .iter()
            .map(|v| match v {
                Value::Bool(b) => *b,
                _ => unreachable!(),
            })
            .collect();
        return Some(PrimitiveArray::Bools(bools));
    }

    if have_char {
        if have_number {
            return None;
        }
        let chars = list
            .iter()
            .map(|v| match v {
                Value::String(s) => s.chars().next().unwrap(),
                _ => unreachable!(),
            })
            .collect();
        return Some(PrimitiveArray::Chars(chars));
    }

    let mut work: Vec<Num> = list.iter().filter_map(Num::of).collect();

    if !small_numbers {
        // Shrink every element to its narrowest exact tier first.
        for num in &mut work {
            if let Some(shrunk) = Num::of(&decimal_from_str(&num.literal(), true)) {
                *num = shrunk;
            }
        }
    }

    let mut have_double = false;
    let mut have_float = false;
    let mut have_long = false;
    let mut have_int = false;
    let mut have_short = false;
    for num in &work {
        match num {
            Num::Double(_) => have_double = true,
            Num::Float(_) => have_float = true,
            Num::Long(_) => have_long = true,
            Num::Int(_) => have_int = true,
            Num::Short(_) => have_short = true,
            Num::Byte(_) => {}
        }
    }

    if have_long && (have_float || have_double) {
        have_float = false;
        have_double = false;
        // Try to bring the floating values into the integer family.
        for num in work.iter_mut() {
            let converted = match *num {
                Num::Float(f) => {
                    let x = f as i64;
                    (x as f32 == f).then_some(Num::Long(x))
                }
                Num::Double(d) => {
                    let x = d as i64;
                    (x as f64 == d).then_some(Num::Long(x))
                }
                _ => continue,
            };
            match converted {
                Some(n) => *num = n,
                None => {
                    have_double = true;
                    break;
                }
            }
        }
        if have_double {
            // Integer family failed; try the floating family instead.
            for num in work.iter_mut() {
                if let Num::Long(x) = *num {
                    let d = x as f64;
                    if d as i64 == x {
                        *num = Num::Double(d);
                    } else {
                        return None; // data loss either way
                    }
                }
            }
        }
    }
    if have_int && have_float && !have_double {
        // If floats would hurt int precision, widen to double.
        for num in &work {
            if let Num::Int(x) = *num {
                if x as f32 as i32 != x {
                    have_double = true;
                    break;
                }
            }
        }
    }

    Some(if have_double {
        PrimitiveArray::Doubles(work.into_iter().map(Num::as_f64).collect())
    } else if have_float {
        PrimitiveArray::Floats(work.into_iter().map(Num::as_f32).collect())
    } else if have_long {
        PrimitiveArray::Longs(work.into_iter().map(Num::as_i64).collect())
    } else if have_int {
        PrimitiveArray::Ints(work.into_iter().map(|n| n.as_i64() as i32).collect())
    } else if have_short {
        PrimitiveArray::Shorts(work.into_iter().map(|n| n.as_i64() as i16).collect())
    } else {
        PrimitiveArray::Bytes(work.into_iter().map(|n| n.as_i64() as i8).collect())
    })
}
