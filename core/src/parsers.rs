//! Built-in value coercions for [`CliOption`](crate::CliOption).
//!
//! Each function has the [`ValueParser`](crate::ValueParser) shape and can be
//! passed straight to [`CliOption::with_parser`](crate::CliOption::with_parser).

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("static regex must compile")
});
static INT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("static regex must compile"));

/// Splits on commas and trims each item.
///
/// ```
/// use command_pipe_core::parsers::list;
/// use serde_json::json;
///
/// assert_eq!(list("a, b ,c"), json!(["a", "b", "c"]));
/// ```
pub fn list(value: &str) -> Value {
    Value::Array(
        value
            .split(',')
            .map(|item| Value::String(item.trim().to_string()))
            .collect(),
    )
}

/// `true` only for a case-insensitive `"true"`.
pub fn boolean(value: &str) -> Value {
    Value::Bool(value.eq_ignore_ascii_case("true"))
}

/// Leading decimal number of the value, or `null` when there is none.
///
/// Trailing garbage is ignored, so `"2.5px"` yields `2.5`.
pub fn number(value: &str) -> Value {
    FLOAT_PREFIX
        .find(value.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// Leading integer of the value, or `null` when there is none.
///
/// ```
/// use command_pipe_core::parsers::int;
/// use serde_json::json;
///
/// assert_eq!(int("42"), json!(42));
/// assert_eq!(int("7.9"), json!(7));
/// assert_eq!(int("abc"), json!(null));
/// ```
pub fn int(value: &str) -> Value {
    let Some(m) = INT_PREFIX.find(value.trim_start()) else {
        return Value::Null;
    };
    let digits = m.as_str();
    match digits.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => digits.parse::<f64>().map(Value::from).unwrap_or(Value::Null),
    }
}
