use num_cmp::NumCmp;
use once_cell::sync::Lazy;
use serde_json::{Map, Number, Value};

use crate::{
    compilation::Parser,
    error::{CompileError, SchemaErrorKind},
    node::{Pattern, SchemaIndex},
};

macro_rules! num_cmp {
    ($method:ident, $left:expr, $right:expr) => {
        if let Some(b) = $right.as_u64() {
            NumCmp::$method($left, b)
        } else if let Some(b) = $right.as_i64() {
            NumCmp::$method($left, b)
        } else {
            NumCmp::$method($left, as_f64($right))
        }
    };
}

macro_rules! num_cmp_limit {
    ($method:ident, $number:expr, $limit:expr) => {
        if let Some(a) = $number.as_u64() {
            NumCmp::$method(a, $limit)
        } else if let Some(a) = $number.as_i64() {
            NumCmp::$method(a, $limit)
        } else {
            NumCmp::$method(as_f64($number), $limit)
        }
    };
}

#[inline]
pub(crate) fn as_f64(number: &Number) -> f64 {
    // Without `arbitrary_precision` every number has an `f64` representation
    number.as_f64().unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn less_than(number: &Number, limit: f64) -> bool {
    num_cmp_limit!(num_lt, number, limit)
}

#[inline]
pub(crate) fn less_or_equal(number: &Number, limit: f64) -> bool {
    num_cmp_limit!(num_le, number, limit)
}

#[inline]
pub(crate) fn greater_than(number: &Number, limit: f64) -> bool {
    num_cmp_limit!(num_gt, number, limit)
}

#[inline]
pub(crate) fn greater_or_equal(number: &Number, limit: f64) -> bool {
    num_cmp_limit!(num_ge, number, limit)
}

/// Deep equality where `1` equals `1.0` and object key order is irrelevant.
#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => {
            if let Some(a) = left.as_u64() {
                num_cmp!(num_eq, a, right)
            } else if let Some(a) = left.as_i64() {
                num_cmp!(num_eq, a, right)
            } else {
                num_cmp!(num_eq, as_f64(left), right)
            }
        }
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| equal(a, b))
}

#[inline]
pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| equal(value, other)))
}

pub(crate) fn number(
    parser: &Parser<'_>,
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<f64>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Number(number)) => Ok(Some(as_f64(number))),
        Some(_) => Err(parser.error(keyword, SchemaErrorKind::InvalidNumberValue)),
    }
}

/// A non-negative integer; integral floats such as `3.0` are accepted.
pub(crate) fn natural(
    parser: &Parser<'_>,
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<u64>, CompileError> {
    let Some(value) = object.get(keyword) else {
        return Ok(None);
    };
    if let Some(natural) = value.as_u64() {
        return Ok(Some(natural));
    }
    if let Some(value) = value.as_f64() {
        if value.trunc() == value && value >= 0. {
            // NOTE: Imprecise cast as big integers are not supported
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Ok(Some(value as u64));
        }
    }
    Err(parser.error(keyword, SchemaErrorKind::InvalidNaturalValue))
}

pub(crate) fn boolean(
    parser: &Parser<'_>,
    object: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<bool>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(parser.error(keyword, SchemaErrorKind::InvalidBoolValue)),
    }
}

pub(crate) fn regex(parser: &Parser<'_>, keyword: &str, pattern: &str) -> Result<Pattern, CompileError> {
    convert_regex(pattern)
        .map(|regex| Pattern::new(pattern, regex))
        .map_err(|_| parser.error(keyword, SchemaErrorKind::InvalidRegexpValue))
}

static CONTROL_GROUPS_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\\c[A-Za-z]").expect("Is a valid regex"));

/// Compile an ECMA 262 pattern.
///
/// `\cX` control escapes are expanded and the ASCII-only meaning of `\d`, `\w` and `\s` (plus
/// their negations) is spelled out, since `fancy_regex` would otherwise match Unicode classes.
pub(crate) fn convert_regex(pattern: &str) -> Result<fancy_regex::Regex, fancy_regex::Error> {
    let pattern = CONTROL_GROUPS_RE.replace_all(pattern, replace_control_group);
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(current) = chars.next() {
        if current != '\\' {
            out.push(current);
            continue;
        }
        match chars.next() {
            Some('d') => out.push_str("[0-9]"),
            Some('D') => out.push_str("[^0-9]"),
            Some('w') => out.push_str("[A-Za-z0-9_]"),
            Some('W') => out.push_str("[^A-Za-z0-9_]"),
            Some('s') => {
                out.push_str("[ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]");
            }
            Some('S') => {
                out.push_str("[^ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]");
            }
            Some(next) => {
                out.push(current);
                out.push(next);
            }
            // A trailing backslash is left for the regex parser to reject
            None => out.push(current),
        }
    }
    fancy_regex::Regex::new(&out)
}

fn replace_control_group(captures: &regex::Captures<'_>) -> String {
    // `\cA` is U+0001, `\cZ` is U+001A
    let letter = captures[0].as_bytes()[2].to_ascii_uppercase();
    char::from(letter - b'@').to_string()
}

pub(crate) fn optional_schema<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    keyword: &str,
) -> Result<Option<SchemaIndex>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(subschema) => parser.subschema(keyword, subschema, &[keyword]).map(Some),
    }
}

/// A non-empty array of sub-schemas, e.g. `allOf`.
pub(crate) fn schema_array<'a>(
    parser: &mut Parser<'a>,
    object: &'a Map<String, Value>,
    keyword: &str,
) -> Result<Vec<SchemaIndex>, CompileError> {
    match object.get(keyword) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) if !items.is_empty() => {
            let mut schemas = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let mut buffer = itoa::Buffer::new();
                schemas.push(parser.subschema(keyword, item, &[keyword, buffer.format(idx)])?);
            }
            Ok(schemas)
        }
        Some(_) => Err(parser.error(keyword, SchemaErrorKind::InvalidArrayValue)),
    }
}

#[cfg(test)]
mod tests {
    use super::{convert_regex, equal, greater_than, less_or_equal, less_than};
    use serde_json::{json, Number, Value};
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0))]
    #[test_case(&json!([2]), &json!([2.0]))]
    #[test_case(&json!([-3]), &json!([-3.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}))]
    #[test_case(&json!({"a": 1, "b": [null]}), &json!({"b": [null], "a": 1}); "key order")]
    fn are_equal(left: &Value, right: &Value) {
        assert!(equal(left, right));
    }

    #[test_case(&json!(1), &json!(2.0))]
    #[test_case(&json!([]), &json!(["foo"]))]
    #[test_case(&json!([-3]), &json!([-4.0]))]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0, "b": 2}))]
    #[test_case(&json!({"a": 1}), &json!({"b": 1}))]
    #[test_case(&json!(0), &json!(false))]
    fn are_not_equal(left: &Value, right: &Value) {
        assert!(!equal(left, right));
    }

    #[test]
    fn comparisons_are_exact_for_large_integers() {
        let number = Number::from(u64::MAX);
        assert!(!less_than(&number, 1e19));
        assert!(greater_than(&number, 1.8e19));
        assert!(less_or_equal(&Number::from(-5), -5.0));
    }

    #[test_case(r"^\d+$", "123", true; "ascii digits")]
    #[test_case(r"^\d+$", "١٢٣", false; "arabic indic digits")]
    #[test_case(r"^\D$", "x", true; "non digit")]
    #[test_case(r"^\w$", "é", false; "word is ascii only")]
    #[test_case(r"^\W$", "é", true; "non word")]
    #[test_case(r"^\s$", "\u{feff}", true; "byte order mark is space")]
    #[test_case(r"^\S$", "\u{2000}", true; "en quad is not space")]
    #[test_case(r"^\cJ$", "\n", true; "control escape")]
    #[test_case(r"^\cj$", "\n", true; "lowercase control escape")]
    #[test_case(r"^(?!x)", "y", true; "negative lookahead passes")]
    #[test_case(r"^(?!x)", "xy", false; "negative lookahead fails")]
    #[test_case(r"^(a)\1$", "aa", true; "backreference")]
    #[test_case(r"\.", "a.b", true; "other escapes are kept")]
    fn ecma_patterns(pattern: &str, text: &str, expected: bool) {
        let regex = convert_regex(pattern).expect("Valid pattern");
        assert_eq!(regex.is_match(text).expect("Match completes"), expected);
    }

    #[test_case(r"\"; "trailing backslash")]
    #[test_case("[[["; "unclosed class")]
    fn invalid_ecma_patterns(pattern: &str) {
        assert!(convert_regex(pattern).is_err());
    }
}
