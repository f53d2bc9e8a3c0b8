//! Per-call configuration snapshots and process-wide defaults.
//!
//! A [`JsonConfig`] is an immutable-per-call snapshot of every behavioral
//! policy the engine consults. [`JsonConfig::new`] clones the current
//! process-wide defaults, after which the caller may adjust the copy freely;
//! the engine itself never mutates a config. The defaults live behind an
//! atomically swapped [`Arc`], so a parse or encode already in flight keeps
//! the snapshot it started with even if another thread replaces the
//! defaults mid-call.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::escape::BadCharacterPolicy;
use crate::ident::IdentifierMode;
use crate::reflect::Visibility;

/// Pad and line-terminator strings inserted per nesting level when
/// indented output is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentPadding {
    /// Inserted once per nesting level.
    pub padding: String,
    /// Inserted before each padded line.
    pub newline: String,
}

impl Default for IndentPadding {
    fn default() -> Self {
        Self {
            padding: "  ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

/// Numeric value classes a custom format rule can be registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberClass {
    Byte,
    Short,
    Int,
    Long,
    BigInt,
    Float,
    Double,
    Decimal,
}

/// A custom formatting rule for one numeric class, consulted before the
/// default formatting. Plain data so configs stay cloneable and sharable
/// across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// Emit exactly this many fraction digits.
    pub fraction_digits: usize,
}

/// One entry of a per-type field selection list: which declared field to
/// expose, and optionally under what name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub field: String,
    pub rename: Option<String>,
}

/// Snapshot of all behavioral policies for one parse or encode call.
///
/// Most policies are independent booleans; two pairs are mutually
/// exclusive and therefore only reachable through setters that clear the
/// complementary flag: dates-as-strings vs dates-as-objects, and
/// escape-non-ASCII vs escape-surrogates.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct JsonConfig {
    /// Validate property names as identifiers during encode.
    ///
    /// Default: `true`
    pub validate_property_names: bool,

    /// Quote property names in output. When `false`, names that are valid
    /// identifiers are emitted bare, which is not strict JSON.
    ///
    /// Default: `true`
    pub quote_identifiers: bool,

    /// Permit ECMAScript reserved words as unquoted identifiers.
    ///
    /// Default: `false`
    pub allow_reserved_words: bool,

    /// Validate identifiers against the full JSON standard rule instead of
    /// the ECMAScript 6 rule. JSON permits nearly any defined code point in
    /// a quoted key.
    ///
    /// Default: `false`
    pub full_json_identifiers: bool,

    /// Check containers for reference cycles during encode.
    ///
    /// Default: `true`
    pub detect_loops: bool,

    /// Policy for unmatched surrogates and undefined code points.
    ///
    /// Default: [`BadCharacterPolicy::Replace`]
    pub bad_character_policy: BadCharacterPolicy,

    /// Prefer ECMAScript 6 `\u{...}` code-point escapes when they are not
    /// longer than the equivalent surrogate-pair escape.
    ///
    /// Default: `false`
    pub use_ecma6: bool,

    /// Copy recognized escape sequences already present in input strings
    /// unchanged instead of re-escaping their backslashes.
    ///
    /// Default: `false`
    pub pass_through_escapes: bool,

    /// Unescape input strings before escaping, normalizing pre-escaped
    /// input to a single consistent output form.
    ///
    /// Default: `false`
    pub unescape_where_possible: bool,

    /// Skip the escape engine entirely for string values, on the caller's
    /// assertion that its strings need no escaping.
    ///
    /// Default: `false`
    pub fast_strings: bool,

    /// Emit numbers that cannot be represented exactly as a 64-bit double
    /// as quoted strings, protecting consumers that parse all JSON numbers
    /// into doubles.
    ///
    /// Default: `false`
    pub precise_numbers: bool,

    /// Prefer the narrowest exact-fit numeric type when parsing, down to
    /// signed bytes.
    ///
    /// Default: `false`
    pub small_numbers: bool,

    /// After parsing an array, try to flatten it into a homogeneous
    /// primitive array.
    ///
    /// Default: `false`
    pub use_primitive_arrays: bool,

    /// Convert strings that look like ECMAScript numbers into numeric
    /// values (both while parsing string values and while encoding them).
    ///
    /// Default: `false`
    pub encode_numeric_strings_as_numbers: bool,

    /// Visibility level the reflection mapper filters accessors by.
    ///
    /// Default: [`Visibility::Public`]
    pub reflection_visibility: Visibility,

    /// Cache reflection descriptor lists per (type, visibility).
    ///
    /// Default: `true`
    pub cache_reflection_data: bool,

    /// Indented output. `None` emits compact text.
    ///
    /// Default: `None`
    pub indent_padding: Option<IndentPadding>,

    /// Custom date parse formats (chrono format strings), tried in order
    /// before the built-in ISO 8601 variants.
    ///
    /// Default: empty
    pub date_parse_formats: Vec<String>,

    /// Custom date generation format (chrono format string). `None` emits
    /// ISO 8601 with millisecond precision.
    ///
    /// Default: `None`
    pub date_gen_format: Option<String>,

    /// Maximum container nesting accepted by the parser and the encoder.
    /// Exceeding it raises [`crate::JsonError::DepthExceeded`] rather than
    /// exhausting the call stack.
    ///
    /// Default: `512`
    pub max_nesting_depth: usize,

    /// Custom numeric format rules, consulted before default formatting.
    pub number_formats: HashMap<NumberClass, NumberFormat>,

    encode_dates_as_strings: bool,
    encode_dates_as_objects: bool,
    escape_non_ascii: bool,
    escape_surrogates: bool,
    reflect_field_selection: HashMap<TypeId, Vec<FieldSelection>>,
}

impl Default for JsonConfig {
    /// The factory settings: strict JSON output, lenient input, no
    /// reinterpretation of strings. Process-wide defaults start here; use
    /// [`JsonConfig::new`] to snapshot the current process defaults
    /// instead.
    fn default() -> Self {
        Self {
            validate_property_names: true,
            quote_identifiers: true,
            allow_reserved_words: false,
            full_json_identifiers: false,
            detect_loops: true,
            bad_character_policy: BadCharacterPolicy::Replace,
            use_ecma6: false,
            pass_through_escapes: false,
            unescape_where_possible: false,
            fast_strings: false,
            precise_numbers: false,
            small_numbers: false,
            use_primitive_arrays: false,
            encode_numeric_strings_as_numbers: false,
            reflection_visibility: Visibility::Public,
            cache_reflection_data: true,
            indent_padding: None,
            date_parse_formats: Vec::new(),
            date_gen_format: None,
            max_nesting_depth: 512,
            number_formats: HashMap::new(),
            encode_dates_as_strings: false,
            encode_dates_as_objects: false,
            escape_non_ascii: false,
            escape_surrogates: false,
            reflect_field_selection: HashMap::new(),
        }
    }
}

static DEFAULTS: LazyLock<RwLock<Arc<JsonConfig>>> =
    LazyLock::new(|| RwLock::new(Arc::new(JsonConfig::default())));

/// The current process-wide default configuration snapshot.
pub fn default_config() -> Arc<JsonConfig> {
    DEFAULTS.read().clone()
}

/// Replace the process-wide defaults. Calls already in flight keep the
/// snapshot they cloned at entry.
pub fn set_default_config(cfg: JsonConfig) {
    *DEFAULTS.write() = Arc::new(cfg);
}

impl JsonConfig {
    /// Clone the current process-wide defaults into an independent
    /// per-call snapshot.
    pub fn new() -> Self {
        (*default_config()).clone()
    }

    /// The identifier grammar in effect.
    pub fn identifier_mode(&self) -> IdentifierMode {
        if self.full_json_identifiers {
            IdentifierMode::FullJson
        } else {
            IdentifierMode::Ecma6
        }
    }

    /// Whether strings should be probed as dates while parsing.
    pub fn format_dates(&self) -> bool {
        self.encode_dates_as_strings || self.encode_dates_as_objects
    }

    pub fn encode_dates_as_strings(&self) -> bool {
        self.encode_dates_as_strings
    }

    /// Encode dates as ISO 8601 strings. Clears dates-as-objects.
    pub fn set_encode_dates_as_strings(&mut self, on: bool) -> &mut Self {
        self.encode_dates_as_strings = on;
        if on {
            self.encode_dates_as_objects = false;
        }
        self
    }

    pub fn encode_dates_as_objects(&self) -> bool {
        self.encode_dates_as_objects
    }

    /// Encode dates as `new Date("...")` constructor expressions, accepted
    /// only by this engine's own parser and permissive evaluators. Clears
    /// dates-as-strings.
    pub fn set_encode_dates_as_objects(&mut self, on: bool) -> &mut Self {
        self.encode_dates_as_objects = on;
        if on {
            self.encode_dates_as_strings = false;
        }
        self
    }

    pub fn escape_non_ascii(&self) -> bool {
        self.escape_non_ascii
    }

    /// Escape every code point at or above U+0080. Clears
    /// escape-surrogates, which it subsumes.
    pub fn set_escape_non_ascii(&mut self, on: bool) -> &mut Self {
        self.escape_non_ascii = on;
        if on {
            self.escape_surrogates = false;
        }
        self
    }

    pub fn escape_surrogates(&self) -> bool {
        self.escape_surrogates
    }

    /// Escape every supplementary-plane code point. Clears
    /// escape-non-ASCII.
    pub fn set_escape_surrogates(&mut self, on: bool) -> &mut Self {
        self.escape_surrogates = on;
        if on {
            self.escape_non_ascii = false;
        }
        self
    }

    /// Restrict and optionally rename the reflected fields of `T`. Order of
    /// `specs` becomes the emission order. An empty slice clears the
    /// selection, restoring declaration order of all visible fields.
    pub fn set_reflect_fields<T: 'static>(&mut self, specs: &[(&str, Option<&str>)]) -> &mut Self {
        let key = TypeId::of::<T>();
        if specs.is_empty() {
            self.reflect_field_selection.remove(&key);
        } else {
            let list = specs
                .iter()
                .map(|(field, rename)| FieldSelection {
                    field: (*field).to_string(),
                    rename: rename.map(str::to_string),
                })
                .collect();
            self.reflect_field_selection.insert(key, list);
        }
        self
    }

    pub(crate) fn reflect_field_selection(&self, type_id: TypeId) -> Option<&[FieldSelection]> {
        self.reflect_field_selection.get(&type_id).map(Vec::as_slice)
    }

    /// Register a custom format rule for one numeric class.
    pub fn set_number_format(&mut self, class: NumberClass, format: NumberFormat) -> &mut Self {
        self.number_formats.insert(class, format);
        self
    }
}
