// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    booleans       = { r#"{"idle": False, "paused": True}"#, r#"{"idle": false, "paused": true}"# },
    none           = { r#"[None, 1]"#, r#"[null, 1]"# },
    inside_string  = { r#"{"name": "True None"}"#, r#"{"name": "True None"}"# },
    escaped_quote  = { r#"["a\"True", False]"#, r#"["a\"True", false]"# },
    longer_word    = { r#"{"x": Truest}"#, r#"{"x": Truest}"# },
    plain_json     = { r#"{"id": "00", "n": 1.5}"#, r#"{"id": "00", "n": 1.5}"# },
)]
fn pyon_to_json(input: &str, expected: &str) {
    assert_eq!(to_json(input), expected);
}

#[test]
fn converted_payload_parses_as_json() {
    let json = to_json(r#"[{"id": "00", "idle": False, "options": {"paused": None}}]"#);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["idle"], serde_json::Value::Bool(false));
    assert!(value[0]["options"]["paused"].is_null());
}

#[yare::parameterized(
    newline   = { r#""line one\nline two""#, "line one\nline two" },
    quote     = { r#""say \"hi\"""#, "say \"hi\"" },
    backslash = { r#""C:\\fah""#, "C:\\fah" },
    hex       = { r#""\x41BC""#, "ABC" },
    utf8_hex  = { r#""caf\xc3\xa9""#, "café" },
    bad_utf8  = { r#""a\xffb""#, "a\u{fffd}b" },
    non_ascii = { r#""día""#, "día" },
    unquoted  = { "raw text", "raw text" },
)]
fn decode_string_literal(input: &str, expected: &str) {
    assert_eq!(decode_string(input), expected);
}
