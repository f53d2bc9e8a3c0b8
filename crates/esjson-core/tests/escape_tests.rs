use esjson_core::escape::{escape, unescape, REPLACEMENT_CHARACTER};
use esjson_core::{encode_with, parse, parse_with, BadCharacterPolicy, JsonConfig, JsonError, Value};

fn with_policy(policy: BadCharacterPolicy) -> JsonConfig {
    let mut cfg = JsonConfig::default();
    cfg.bad_character_policy = policy;
    cfg
}

// ============================================================================
// Decoding escapes
// ============================================================================

#[test]
fn surrogate_pair_escapes_join_through_parse() {
    assert_eq!(
        parse(r#""\uD83D\uDE00""#).unwrap(),
        Value::from("\u{1F600}")
    );
}

#[test]
fn code_point_escape_through_parse() {
    assert_eq!(parse(r#""\u{1F600}""#).unwrap(), Value::from("\u{1F600}"));
    assert_eq!(parse(r#""\u{41}""#).unwrap(), Value::from("A"));
}

#[test]
fn legacy_hex_and_octal_escapes() {
    assert_eq!(parse(r#""\x41\101""#).unwrap(), Value::from("AA"));
}

// ============================================================================
// Bad character policies, decode direction
// ============================================================================

#[test]
fn lone_surrogate_replace() {
    let got = unescape(r"a\uD800b", &with_policy(BadCharacterPolicy::Replace)).unwrap();
    assert_eq!(got, format!("a{REPLACEMENT_CHARACTER}b"));
}

#[test]
fn lone_surrogate_discard() {
    let got = unescape(r"a\uD800b", &with_policy(BadCharacterPolicy::Discard)).unwrap();
    assert_eq!(got, "ab");
}

#[test]
fn lone_surrogate_error() {
    let err = unescape(r"a\uD800b", &with_policy(BadCharacterPolicy::Error)).unwrap_err();
    match err {
        JsonError::UnmatchedSurrogate { code_point, offset } => {
            assert_eq!(code_point, 0xD800);
            assert_eq!(offset, 1);
        }
        other => panic!("expected surrogate error, got {other:?}"),
    }
}

#[test]
fn lone_surrogate_escape_keeps_the_escape_text() {
    let got = unescape(r"a\uD800b", &with_policy(BadCharacterPolicy::Escape)).unwrap();
    assert_eq!(got, r"a\uD800b");
}

#[test]
fn lone_surrogate_pass_has_no_character_form() {
    // A lone surrogate cannot exist in a string, so pass falls back to the
    // escape text.
    let got = unescape(r"a\uD800b", &with_policy(BadCharacterPolicy::Pass)).unwrap();
    assert_eq!(got, r"a\uD800b");
}

#[test]
fn low_surrogate_alone_is_also_bad() {
    let err = unescape(r"\uDC00", &with_policy(BadCharacterPolicy::Error)).unwrap_err();
    assert!(matches!(err, JsonError::UnmatchedSurrogate { code_point: 0xDC00, .. }));
}

#[test]
fn undefined_code_point_escape_policies() {
    // U+0378 is unassigned.
    let raw = r"\u0378";
    assert_eq!(
        unescape(raw, &with_policy(BadCharacterPolicy::Replace)).unwrap(),
        REPLACEMENT_CHARACTER.to_string()
    );
    assert_eq!(
        unescape(raw, &with_policy(BadCharacterPolicy::Discard)).unwrap(),
        ""
    );
    assert!(matches!(
        unescape(raw, &with_policy(BadCharacterPolicy::Error)),
        Err(JsonError::UndefinedCodePoint { code_point: 0x378, .. })
    ));
    assert_eq!(
        unescape(raw, &with_policy(BadCharacterPolicy::Escape)).unwrap(),
        raw
    );
    // Unlike a surrogate, an undefined code point is still a character, so
    // pass copies it through.
    assert_eq!(
        unescape(raw, &with_policy(BadCharacterPolicy::Pass)).unwrap(),
        "\u{0378}"
    );
}

#[test]
fn error_policy_surfaces_through_parse() {
    let cfg = with_policy(BadCharacterPolicy::Error);
    assert!(matches!(
        parse_with(r#""\uD800""#, &cfg),
        Err(JsonError::UnmatchedSurrogate { .. })
    ));
}

// ============================================================================
// Bad character policies, encode direction
// ============================================================================

#[test]
fn undefined_code_point_in_output() {
    let bad = Value::from("a\u{0378}b");
    assert_eq!(
        encode_with(&bad, &with_policy(BadCharacterPolicy::Replace)).unwrap(),
        format!("\"a{REPLACEMENT_CHARACTER}b\"")
    );
    assert_eq!(
        encode_with(&bad, &with_policy(BadCharacterPolicy::Discard)).unwrap(),
        "\"ab\""
    );
    assert!(matches!(
        encode_with(&bad, &with_policy(BadCharacterPolicy::Error)),
        Err(JsonError::UndefinedCodePoint { code_point: 0x378, .. })
    ));
    assert_eq!(
        encode_with(&bad, &with_policy(BadCharacterPolicy::Escape)).unwrap(),
        "\"a\\u0378b\""
    );
    assert_eq!(
        encode_with(&bad, &with_policy(BadCharacterPolicy::Pass)).unwrap(),
        "\"a\u{0378}b\""
    );
}

// ============================================================================
// Optional escaping policies
// ============================================================================

#[test]
fn escape_non_ascii_covers_everything_above_7f() {
    let mut cfg = JsonConfig::default();
    cfg.set_escape_non_ascii(true);
    assert_eq!(escape("café", &cfg).unwrap(), r"caf\u00E9");
    assert_eq!(escape("\u{1F600}", &cfg).unwrap(), r"\uD83D\uDE00");
}

#[test]
fn escape_surrogates_covers_only_supplementary_planes() {
    let mut cfg = JsonConfig::default();
    cfg.set_escape_surrogates(true);
    assert_eq!(escape("café", &cfg).unwrap(), "café");
    assert_eq!(escape("\u{1F600}", &cfg).unwrap(), r"\uD83D\uDE00");
}

#[test]
fn ecma6_code_point_escapes() {
    let mut cfg = JsonConfig::default();
    cfg.use_ecma6 = true;
    cfg.set_escape_surrogates(true);
    assert_eq!(escape("\u{1F600}", &cfg).unwrap(), r"\u{1F600}");
}

#[test]
fn ecma6_form_only_when_not_longer() {
    let mut cfg = JsonConfig::default();
    cfg.use_ecma6 = true;
    cfg.set_escape_non_ascii(true);
    assert_eq!(escape("\u{FF}", &cfg).unwrap(), r"\u{FF}");
    // A third hex digit would make the braced form seven characters, one
    // more than the code-unit form.
    assert_eq!(escape("\u{ABC}", &cfg).unwrap(), r"\u0ABC");
}

#[test]
fn pass_through_keeps_recognized_escapes() {
    let mut cfg = JsonConfig::default();
    assert_eq!(escape(r"a\tb", &cfg).unwrap(), r"a\\tb");
    cfg.pass_through_escapes = true;
    assert_eq!(escape(r"a\tb", &cfg).unwrap(), r"a\tb");
    // Unrecognized escapes still get their backslash escaped.
    assert_eq!(escape(r"a\qb", &cfg).unwrap(), r"a\\qb");
}

#[test]
fn unescape_then_escape_is_stable() {
    let cfg = JsonConfig::default();
    let once = unescape(r#"tab\tquote\""#, &cfg).unwrap();
    assert_eq!(once, "tab\tquote\"");
    let escaped = escape(&once, &cfg).unwrap();
    assert_eq!(escaped, r#"tab\tquote\""#);
    assert_eq!(unescape(&escaped, &cfg).unwrap(), once);
}

// ============================================================================
// Full-range sweep
// ============================================================================

/// Every assigned code point escapes cleanly under the strict policy and
/// survives an unescape of its own escaped form; every unassigned one is
/// rejected with its code point in the error.
#[test]
fn assigned_code_points_escape_and_unescape_cleanly() {
    use unicode_general_category::{get_general_category, GeneralCategory};

    let cfg = with_policy(BadCharacterPolicy::Error);
    for cp in 0u32..=0x10FFFF {
        let Some(c) = char::from_u32(cp) else { continue };
        let s = c.to_string();
        if get_general_category(c) == GeneralCategory::Unassigned {
            assert!(
                matches!(
                    escape(&s, &cfg),
                    Err(JsonError::UndefinedCodePoint { code_point, .. }) if code_point == cp
                ),
                "U+{cp:04X} should be rejected"
            );
            continue;
        }
        let escaped = escape(&s, &cfg).unwrap();
        assert_eq!(unescape(&escaped, &cfg).unwrap(), s, "U+{cp:04X}");
    }
}
