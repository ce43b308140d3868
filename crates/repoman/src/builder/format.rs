use crate::sanitize::Sanitizer;
use crate::value::Value;

/// Write a value the way INSERT / REPLACE / UPDATE expect it.
///
/// `kind_of` decides the quoting, `value` supplies the text. They differ only
/// when `value` is the sanitized form of `kind_of`.
pub(super) fn push_assigned(out: &mut String, kind_of: &Value, value: &Value) {
    match kind_of {
        Value::Null => out.push_str("NULL"),
        Value::Text(_) | Value::Float(_) => push_quoted(out, value),
        Value::Integer(_) | Value::Bool(_) | Value::List(_) => value.write_text(out),
    }
}

/// Write one `WHERE` condition.
///
/// List elements are written unquoted, unlike scalar text.
pub(super) fn push_where_condition(out: &mut String, column: &str, value: &Value) {
    out.push_str(column);
    match value {
        Value::Null => out.push_str(" IS NULL"),
        Value::Integer(_) => {
            out.push_str(" = ");
            value.write_text(out);
        }
        Value::List(_) => {
            out.push_str(" IN(");
            value.write_text(out);
            out.push(')');
        }
        Value::Float(_) | Value::Bool(_) | Value::Text(_) => {
            out.push_str(" = ");
            push_quoted(out, value);
        }
    }
}

/// Write one `ON` condition. Non-null values are column references and stay unquoted.
pub(super) fn push_on_condition(out: &mut String, column: &str, value: &Value) {
    out.push_str(column);
    match value {
        Value::Null => out.push_str(" IS NULL"),
        _ => {
            out.push_str(" = ");
            value.write_text(out);
        }
    }
}

/// Run `value` through `sanitizer` when one is given.
pub(super) fn sanitized(value: &Value, sanitizer: Option<&dyn Sanitizer>) -> Value {
    match (value, sanitizer) {
        (Value::Null, _) | (_, None) => value.clone(),
        (_, Some(s)) => s.sanitize(value, value.kind()),
    }
}

fn push_quoted(out: &mut String, value: &Value) {
    out.push('"');
    value.write_text(out);
    out.push('"');
}
