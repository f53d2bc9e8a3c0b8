//! # esjson-core
//!
//! Bidirectional engine for a lenient, ECMAScript-flavored superset of JSON.
//!
//! The parser accepts everything strict JSON accepts plus the common
//! ECMAScript extensions: single-quoted strings, unquoted identifier keys,
//! hex and octal integer literals, `Infinity` and `NaN`, the full
//! ECMAScript escape repertoire, and `new Date("...")` constructor values.
//! Numbers parse through arbitrary precision and land in the narrowest
//! exact type, so nothing is silently rounded. The encoder walks a
//! [`Value`] tree back to text, validating property names, rejecting
//! duplicate keys and reference cycles, and optionally encoding host
//! objects through a reflection field table.
//!
//! ## Quick start
//!
//! ```rust
//! use esjson_core::{encode, parse, Value};
//!
//! // Lenient input: unquoted keys, single quotes, hex.
//! let value = parse(r#"{a: 1, "b": 2.5, c: 'three', d: 0xff}"#).unwrap();
//! let obj = value.as_object().unwrap();
//! assert_eq!(obj.borrow()["a"], Value::Long(1));
//! assert_eq!(obj.borrow()["d"], Value::Long(255));
//!
//! // Strict output by default.
//! let text = encode(&value).unwrap();
//! assert_eq!(text, r#"{"a":1,"b":2.5,"c":"three","d":255}"#);
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: text to [`Value`], with exact numeric type selection
//! - [`encoder`]: [`Value`] to text, plus the [`ToJson`] extension trait
//! - [`value`]: the value tree and its shared containers
//! - [`config`]: per-call policy snapshots and process-wide defaults
//! - [`escape`]: the escape engine and bad-character policies
//! - [`ident`]: identifier grammars and the reserved-word table
//! - [`reflect`]: field-descriptor reflection for host structs
//! - [`tokenizer`]: the lexer underlying the parser
//! - [`error`]: error types and source positions

pub mod config;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod ident;
pub mod parser;
pub mod reflect;
pub mod tokenizer;
pub mod value;

pub use config::{
    default_config, set_default_config, FieldSelection, IndentPadding, JsonConfig, NumberClass,
    NumberFormat,
};
pub use encoder::{encode, encode_to_writer, encode_with, ToJson};
pub use error::{JsonError, Position, Result};
pub use escape::BadCharacterPolicy;
pub use ident::{is_reserved_word, is_valid_identifier, IdentifierMode};
pub use parser::{parse, parse_reader, parse_with};
pub use reflect::{clear_reflection_cache, FieldDescriptor, FieldGetter, Reflect, Visibility};
pub use value::{ArrayRef, Object, ObjectRef, PrimitiveArray, Value};
