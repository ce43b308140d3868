//! Escaping and casting of raw values before they are interpolated into SQL.
//!
//! The query builder never escapes anything on its own. Callers either
//! sanitize values up front or ask `QueryBuilder::update` to run them through
//! an attached [`Sanitizer`].

use crate::value::{Value, ValueKind};

/// Escapes and casts raw values.
pub trait Sanitizer: Send + Sync {
    /// Escape `value` and convert the result to `kind`.
    ///
    /// `Null` must stay `Null`.
    fn sanitize(&self, value: &Value, kind: ValueKind) -> Value;
}

/// Sanitizer that only applies [`escape_string`] and [`cast`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeSanitizer;

impl Sanitizer for EscapeSanitizer {
    fn sanitize(&self, value: &Value, kind: ValueKind) -> Value {
        sanitize_with(value, kind, escape_string)
    }
}

/// Sanitize `value` using `escape` for the text step.
///
/// Lists are sanitized element by element, each element keeping its own kind.
pub fn sanitize_with(value: &Value, kind: ValueKind, escape: impl Fn(&str) -> String) -> Value {
    fn go(value: &Value, kind: ValueKind, escape: &dyn Fn(&str) -> String) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::List(items) => {
                Value::List(items.iter().map(|item| go(item, item.kind(), escape)).collect())
            }
            other => cast(&escape(&other.to_text()), kind),
        }
    }
    go(value, kind, &escape)
}

/// Backslash-escape the characters MySQL treats as special in string literals.
///
/// Escaped: NUL, `\n`, `\r`, `\`, `'`, `"` and Ctrl-Z.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Convert already-escaped text into a value of `kind`.
///
/// Numeric kinds read the longest numeric prefix and fall back to zero.
/// That makes the float cast lossy for non-finite input: the text of NaN
/// (`NAN`) and of infinities (`INF`, `-INF`) has no numeric prefix, so each
/// sanitizes to `0.0`.
pub fn cast(text: &str, kind: ValueKind) -> Value {
    match kind {
        ValueKind::Null => Value::Null,
        ValueKind::Text => Value::Text(text.to_string()),
        ValueKind::Integer => Value::Integer(leading_integer(text)),
        ValueKind::Float => Value::Float(leading_float(text)),
        ValueKind::Bool => Value::Bool(!(text.is_empty() || text == "0")),
        ValueKind::List => Value::List(vec![Value::Text(text.to_string())]),
    }
}

fn leading_integer(text: &str) -> i64 {
    let s = text.trim_start();
    let end = numeric_prefix_len(s, false);
    if end == 0 {
        return 0;
    }
    // Out-of-range prefixes saturate.
    s[..end].parse::<i64>().unwrap_or(if s.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn leading_float(text: &str) -> f64 {
    let s = text.trim_start();
    let end = numeric_prefix_len(s, true);
    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Length of the numeric prefix of `s` (sign, digits, and for floats an
/// optional fraction and exponent).
fn numeric_prefix_len(s: &str, float: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > digits_start;
    if float {
        if i < bytes.len() && bytes[i] == b'.' {
            let frac_start = i + 1;
            let mut j = frac_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if has_digits || j > frac_start {
                has_digits = true;
                i = j;
            }
        }
        if has_digits && i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+' | b'-')) {
                j += 1;
            }
            let exp_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > exp_start {
                i = j;
            }
        }
    }
    if has_digits { i } else { 0 }
}
