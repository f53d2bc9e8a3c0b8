//! JSON text generation from a [`Value`] tree.
//!
//! The encoder enforces the output-side invariants: property names are
//! validated against the configured identifier grammar, emitted names must
//! be unique after normalization, container cycles are detected by
//! reference identity, and nesting depth is bounded. Numbers render in
//! their shortest exact form, with a floating marker kept on whole floats
//! and doubles so the tier survives a round trip.

use std::collections::HashSet;
use std::fmt::{self, Write};
use std::rc::Rc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use num_traits::ToPrimitive;

use crate::config::{JsonConfig, NumberClass};
use crate::error::{JsonError, Result};
use crate::escape::{escape, unescape};
use crate::ident::{first_invalid_code_point, is_reserved_word, is_valid_identifier, IdentifierMode};
use crate::parser::{is_javascript_floating, is_javascript_integer};
use crate::reflect::{reflect_object, Reflect};
use crate::value::{ArrayRef, ObjectRef, PrimitiveArray, Value};

/// Implemented by host objects that render their own JSON text.
///
/// The implementation is trusted: whatever it writes is spliced into the
/// output verbatim, with no validation.
pub trait ToJson {
    fn type_name(&self) -> &'static str;
    fn to_json(&self, cfg: &JsonConfig, out: &mut dyn fmt::Write) -> Result<()>;
}

/// Encode a value under the current process-default configuration.
pub fn encode(value: &Value) -> Result<String> {
    encode_with(value, &JsonConfig::new())
}

/// Encode a value under an explicit configuration snapshot.
pub fn encode_with(value: &Value, cfg: &JsonConfig) -> Result<String> {
    let mut out = String::new();
    encode_to_writer(value, cfg, &mut out)?;
    Ok(out)
}

/// Encode a value into a caller-supplied writer.
pub fn encode_to_writer<W: Write>(value: &Value, cfg: &JsonConfig, out: &mut W) -> Result<()> {
    let mut encoder = Encoder {
        cfg,
        visited: HashSet::new(),
        depth: 0,
    };
    encoder.value(value, out)
}

struct Encoder<'a> {
    cfg: &'a JsonConfig,
    /// Container addresses on the current recursion path.
    visited: HashSet<*const ()>,
    depth: usize,
}

impl Encoder<'_> {
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.cfg.max_nesting_depth {
            return Err(JsonError::DepthExceeded {
                limit: self.cfg.max_nesting_depth,
            });
        }
        Ok(())
    }

    fn guard(&mut self, ptr: *const (), kind: &'static str) -> Result<()> {
        if self.cfg.detect_loops && !self.visited.insert(ptr) {
            return Err(JsonError::DataStructureLoop { kind });
        }
        Ok(())
    }

    fn unguard(&mut self, ptr: *const ()) {
        if self.cfg.detect_loops {
            self.visited.remove(&ptr);
        }
    }

    /// Comma separator plus per-entry indentation.
    fn entry_sep(&self, first: bool, out: &mut dyn Write) -> Result<()> {
        if !first {
            out.write_char(',')?;
        }
        if let Some(pad) = &self.cfg.indent_padding {
            out.write_str(&pad.newline)?;
            for _ in 0..self.depth {
                out.write_str(&pad.padding)?;
            }
        }
        Ok(())
    }

    /// Indentation before a closing bracket, at the enclosing level.
    fn closing_indent(&self, out: &mut dyn Write) -> Result<()> {
        if let Some(pad) = &self.cfg.indent_padding {
            out.write_str(&pad.newline)?;
            for _ in 0..self.depth {
                out.write_str(&pad.padding)?;
            }
        }
        Ok(())
    }

    fn value(&mut self, value: &Value, out: &mut dyn Write) -> Result<()> {
        match value {
            Value::Null => out.write_str("null")?,
            Value::Bool(b) => out.write_str(if *b { "true" } else { "false" })?,
            Value::Byte(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::BigInt(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Decimal(_) => self.number(value, out)?,
            Value::String(s) => self.string(s, out)?,
            Value::Date(d) => self.date(d, out)?,
            Value::Object(o) => self.object(o, out)?,
            Value::Array(a) => self.array(a, out)?,
            Value::Primitives(p) => self.primitives(p, out)?,
            Value::Reflected(r) => self.reflected(r, out)?,
            Value::Custom(c) => c.to_json(self.cfg, out)?,
        }
        Ok(())
    }

    fn object(&mut self, obj: &ObjectRef, out: &mut dyn Write) -> Result<()> {
        let ptr = Rc::as_ptr(obj) as *const ();
        self.guard(ptr, "object")?;
        self.enter()?;
        out.write_char('{')?;
        let map = obj.borrow();
        let mut seen = HashSet::new();
        let mut first = true;
        for (key, value) in map.iter() {
            self.entry_sep(first, out)?;
            first = false;
            self.property_name(&mut seen, key, out)?;
            out.write_str(if self.cfg.indent_padding.is_some() { ": " } else { ":" })?;
            self.value(value, out)?;
        }
        drop(map);
        self.depth -= 1;
        if !first {
            self.closing_indent(out)?;
        }
        out.write_char('}')?;
        self.unguard(ptr);
        Ok(())
    }

    fn array(&mut self, arr: &ArrayRef, out: &mut dyn Write) -> Result<()> {
        let ptr = Rc::as_ptr(arr) as *const ();
        self.guard(ptr, "array")?;
        self.enter()?;
        out.write_char('[')?;
        let items = arr.borrow();
        let mut first = true;
        for item in items.iter() {
            self.entry_sep(first, out)?;
            first = false;
            self.value(item, out)?;
        }
        drop(items);
        self.depth -= 1;
        if !first {
            self.closing_indent(out)?;
        }
        out.write_char(']')?;
        self.unguard(ptr);
        Ok(())
    }

    fn reflected(&mut self, obj: &Rc<dyn Reflect>, out: &mut dyn Write) -> Result<()> {
        let ptr = Rc::as_ptr(obj) as *const ();
        self.guard(ptr, obj.type_name())?;
        self.enter()?;
        out.write_char('{')?;
        let pairs = reflect_object(obj.as_ref(), self.cfg);
        let mut seen = HashSet::new();
        let mut first = true;
        for (name, value) in &pairs {
            self.entry_sep(first, out)?;
            first = false;
            self.property_name(&mut seen, name, out)?;
            out.write_str(if self.cfg.indent_padding.is_some() { ": " } else { ":" })?;
            self.value(value, out)?;
        }
        self.depth -= 1;
        if !first {
            self.closing_indent(out)?;
        }
        out.write_char('}')?;
        self.unguard(ptr);
        Ok(())
    }

    fn primitives(&mut self, array: &PrimitiveArray, out: &mut dyn Write) -> Result<()> {
        self.enter()?;
        out.write_char('[')?;
        let mut first = true;
        macro_rules! emit {
            ($items:expr, $wrap:expr) => {
                for item in $items {
                    self.entry_sep(first, out)?;
                    first = false;
                    self.value(&$wrap(*item), out)?;
                }
            };
        }
        match array {
            PrimitiveArray::Bools(v) => emit!(v, Value::Bool),
            PrimitiveArray::Chars(v) => {
                for c in v {
                    self.entry_sep(first, out)?;
                    first = false;
                    self.string(&c.to_string(), out)?;
                }
            }
            PrimitiveArray::Bytes(v) => emit!(v, Value::Byte),
            PrimitiveArray::Shorts(v) => emit!(v, Value::Short),
            PrimitiveArray::Ints(v) => emit!(v, Value::Int),
            PrimitiveArray::Longs(v) => emit!(v, Value::Long),
            PrimitiveArray::Floats(v) => emit!(v, Value::Float),
            PrimitiveArray::Doubles(v) => emit!(v, Value::Double),
        }
        self.depth -= 1;
        if !first {
            self.closing_indent(out)?;
        }
        out.write_char(']')?;
        Ok(())
    }

    /// Normalize, validate, deduplicate, and emit one property name.
    ///
    /// Validation runs against the fully unescaped name, so a pre-escaped
    /// key passes or fails on the code points it denotes. A quoted name
    /// needs no start character, so validation applies the part rule to
    /// every position; the strict start rule only gates bare emission.
    /// Deduplication runs against the emitted text, so two spellings of
    /// the same name collide.
    fn property_name(
        &mut self,
        seen: &mut HashSet<String>,
        raw: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        let cfg = self.cfg;
        let semantic = unescape(raw, cfg)?;
        let escaped = if cfg.unescape_where_possible {
            escape(&semantic, cfg)?
        } else {
            escape(raw, cfg)?
        };

        if cfg.validate_property_names {
            if semantic.is_empty() {
                return Err(JsonError::BadPropertyName {
                    name: raw.to_string(),
                    reason: "empty name".to_string(),
                });
            }
            if let Some((offset, c)) = first_invalid_code_point(&semantic, cfg.identifier_mode()) {
                return Err(JsonError::BadPropertyName {
                    name: semantic,
                    reason: format!("code point U+{:04X} at offset {offset}", c as u32),
                });
            }
            if !cfg.quote_identifiers && !cfg.allow_reserved_words && is_reserved_word(&semantic) {
                return Err(JsonError::BadPropertyName {
                    name: semantic,
                    reason: "reserved word".to_string(),
                });
            }
        }

        if !seen.insert(escaped.clone()) {
            return Err(JsonError::DuplicateProperty { name: escaped });
        }

        // Bare names use the ECMAScript grammar even in full-JSON mode and
        // cannot carry escapes.
        let bare = !cfg.quote_identifiers
            && escaped == semantic
            && is_valid_identifier(&semantic, IdentifierMode::Ecma6)
            && (cfg.allow_reserved_words || !is_reserved_word(&semantic));
        if bare {
            out.write_str(&escaped)?;
        } else {
            write!(out, "\"{escaped}\"")?;
        }
        Ok(())
    }

    fn string(&mut self, s: &str, out: &mut dyn Write) -> Result<()> {
        let cfg = self.cfg;
        if cfg.encode_numeric_strings_as_numbers
            && (is_javascript_integer(s) || is_javascript_floating(s))
        {
            out.write_str(s)?;
            return Ok(());
        }
        if cfg.fast_strings {
            write!(out, "\"{s}\"")?;
            return Ok(());
        }
        let escaped = if cfg.unescape_where_possible {
            escape(&unescape(s, cfg)?, cfg)?
        } else {
            escape(s, cfg)?
        };
        write!(out, "\"{escaped}\"")?;
        Ok(())
    }

    fn date(&mut self, date: &DateTime<FixedOffset>, out: &mut dyn Write) -> Result<()> {
        let text = match &self.cfg.date_gen_format {
            Some(fmt) => date.format(fmt).to_string(),
            None => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let escaped = escape(&text, self.cfg)?;
        if self.cfg.encode_dates_as_objects() {
            write!(out, "new Date(\"{escaped}\")")?;
        } else {
            write!(out, "\"{escaped}\"")?;
        }
        Ok(())
    }

    fn number(&mut self, value: &Value, out: &mut dyn Write) -> Result<()> {
        if let Some(format) = self.cfg.number_formats.get(&number_class(value)) {
            let text = fixed_fraction(value, format.fraction_digits);
            out.write_str(&text)?;
            return Ok(());
        }
        let text = render_number(value);
        if self.cfg.precise_numbers && !double_exact(value) {
            write!(out, "\"{text}\"")?;
        } else {
            out.write_str(&text)?;
        }
        Ok(())
    }
}

fn number_class(value: &Value) -> NumberClass {
    match value {
        Value::Byte(_) => NumberClass::Byte,
        Value::Short(_) => NumberClass::Short,
        Value::Int(_) => NumberClass::Int,
        Value::Long(_) => NumberClass::Long,
        Value::BigInt(_) => NumberClass::BigInt,
        Value::Float(_) => NumberClass::Float,
        Value::Decimal(_) => NumberClass::Decimal,
        _ => NumberClass::Double,
    }
}

/// Shortest exact rendering. Finite floats and doubles keep a floating
/// marker so a round trip does not demote them to the integer tiers.
fn render_number(value: &Value) -> String {
    match value {
        Value::Byte(n) => n.to_string(),
        Value::Short(n) => n.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Long(n) => n.to_string(),
        Value::BigInt(n) => n.to_string(),
        Value::Float(f) => render_f32(*f),
        Value::Double(d) => render_f64(*d),
        Value::Decimal(d) => d.to_string(),
        _ => String::new(),
    }
}

// The shortest `{}` rendering never uses scientific notation, which turns
// 1e300 into a 301-digit literal that no longer reads back as a double.
// Large and small magnitudes use `{:e}` instead, and whole values keep a
// trailing ".0" so the floating tier survives a round trip.

fn render_f64(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    let abs = f.abs();
    let mut text = if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        format!("{f:e}")
    } else {
        format!("{f}")
    };
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text
}

fn render_f32(f: f32) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    let abs = f.abs();
    let mut text = if abs != 0.0 && !(1e-4..1e7).contains(&abs) {
        format!("{f:e}")
    } else {
        format!("{f}")
    };
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text
}

/// Fixed-fraction rendering for a custom number format.
fn fixed_fraction(value: &Value, digits: usize) -> String {
    match value {
        Value::BigInt(n) => fixed_fraction_decimal(&BigDecimal::from(n.clone()), digits),
        Value::Decimal(d) => fixed_fraction_decimal(d, digits),
        Value::Float(f) => format!("{:.digits$}", f64::from(*f)),
        Value::Double(d) => format!("{d:.digits$}"),
        Value::Byte(n) => format!("{:.digits$}", f64::from(*n)),
        Value::Short(n) => format!("{:.digits$}", f64::from(*n)),
        Value::Int(n) => format!("{:.digits$}", f64::from(*n)),
        Value::Long(n) => format!("{:.digits$}", *n as f64),
        other => render_number(other),
    }
}

fn fixed_fraction_decimal(dec: &BigDecimal, digits: usize) -> String {
    dec.with_scale_round(digits as i64, bigdecimal::RoundingMode::HalfUp)
        .to_string()
}

/// Is this number exactly representable as a 64-bit double?
fn double_exact(value: &Value) -> bool {
    match value {
        Value::Byte(_) | Value::Short(_) | Value::Int(_) | Value::Float(_) | Value::Double(_) => {
            true
        }
        Value::Long(n) => {
            // 2^63 - 1 rounds up to 2^63, which the return cast saturates
            // straight back to i64::MAX; bound the double first.
            let d = *n as f64;
            d >= i64::MIN as f64 && d < -(i64::MIN as f64) && d as i64 == *n
        }
        Value::BigInt(n) => survives_double(&BigDecimal::from(n.clone())),
        Value::Decimal(dec) => survives_double(dec),
        _ => true,
    }
}

/// Does converting to a double and rendering it back preserve the value?
fn survives_double(dec: &BigDecimal) -> bool {
    use std::str::FromStr;
    match dec.to_f64() {
        Some(d) if d.is_finite() => {
            BigDecimal::from_str(&format!("{d}")).is_ok_and(|back| back == *dec)
        }
        _ => false,
    }
}
