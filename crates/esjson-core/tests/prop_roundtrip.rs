//! Property-based round-trip tests.
//!
//! Generates random value trees and verifies that encoding then parsing
//! reproduces an equal tree under the default configuration, that the
//! output itself is stable across a second round trip, and that the
//! escape engine inverts cleanly. String content is drawn from assigned
//! code points only, since the default bad-character policy substitutes
//! unassigned ones by design.

use proptest::prelude::*;

use esjson_core::escape::{escape, unescape};
use esjson_core::{encode, parse, parse_with, JsonConfig, Value};

// ============================================================================
// Strategies
// ============================================================================

/// Object keys that survive default property-name validation.
fn arb_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_$][a-zA-Z0-9_$]{0,12}").unwrap()
}

/// String content from a well-trodden, fully assigned repertoire.
fn arb_safe_string() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 .,;:!?_'/-]{0,24}").unwrap(),
        Just(String::new()),
        Just("true".to_string()),
        Just("null".to_string()),
        Just("42".to_string()),
        Just("-3.14".to_string()),
        Just("caf\u{00e9}".to_string()),
        Just("\u{4f60}\u{597d}".to_string()),
        Just("\u{1F600}".to_string()),
        Just("tab\there \"and\" \\slash".to_string()),
        Just("</script>".to_string()),
    ]
}

fn arb_double() -> impl Strategy<Value = f64> {
    prop_oneof![
        prop::num::f64::NORMAL,
        prop::num::f64::ZERO,
        Just(4.0),
        Just(-0.001),
        Just(2.37e24),
        Just(f64::MAX),
        Just(f64::MIN_POSITIVE),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Long),
        arb_double().prop_map(Value::Double),
        arb_safe_string().prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::array_from),
            prop::collection::vec((arb_key(), inner), 0..6)
                .prop_map(|pairs| Value::object_from(pairs)),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn parse_inverts_encode(value in arb_value()) {
        let text = encode(&value).unwrap();
        let back = parse(&text).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn encoding_is_stable_after_one_round_trip(value in arb_value()) {
        let first = encode(&value).unwrap();
        let second = encode(&parse(&first).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn small_numbers_parse_to_an_equal_tree(value in arb_value()) {
        let text = encode(&value).unwrap();
        let mut cfg = JsonConfig::default();
        cfg.small_numbers = true;
        let back = parse_with(&text, &cfg).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn unescape_inverts_escape(s in arb_safe_string()) {
        let cfg = JsonConfig::default();
        let escaped = escape(&s, &cfg).unwrap();
        prop_assert_eq!(unescape(&escaped, &cfg).unwrap(), s);
    }

    #[test]
    fn longs_round_trip_exactly(n in any::<i64>()) {
        let text = encode(&Value::Long(n)).unwrap();
        prop_assert_eq!(parse(&text).unwrap(), Value::Long(n));
    }

    #[test]
    fn finite_doubles_round_trip_by_value(d in arb_double()) {
        let text = encode(&Value::Double(d)).unwrap();
        prop_assert_eq!(parse(&text).unwrap(), Value::Double(d));
    }
}

// ============================================================================
// Identifier classification
// ============================================================================

/// Rules that must hold over the entire code space: anything that may start
/// an ECMAScript identifier may also continue one, the full-JSON mode draws
/// no start/part distinction, and single-character validation agrees with
/// the start predicate.
#[test]
fn identifier_classes_are_consistent_across_the_code_space() {
    use esjson_core::ident::{is_identifier_part, is_identifier_start};
    use esjson_core::{is_valid_identifier, IdentifierMode};

    for cp in 0u32..=0x10FFFF {
        let Some(c) = char::from_u32(cp) else { continue };
        if is_identifier_start(c, IdentifierMode::Ecma6) {
            assert!(is_identifier_part(c, IdentifierMode::Ecma6), "U+{cp:04X}");
        }
        assert_eq!(
            is_identifier_start(c, IdentifierMode::FullJson),
            is_identifier_part(c, IdentifierMode::FullJson),
            "U+{cp:04X}"
        );
        let s = c.to_string();
        assert_eq!(
            is_valid_identifier(&s, IdentifierMode::Ecma6),
            is_identifier_start(c, IdentifierMode::Ecma6),
            "U+{cp:04X}"
        );
    }
}
