//! Scalar and list values interpolated into SQL text.
//!
//! [`Value`] is the closed set of value kinds the query builder knows how to
//! format. Every formatting rule in [`crate::builder`] is an exhaustive `match`
//! over these variants.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A value that can be written into a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    Null,
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// Boolean literal, written as `1` / `0`
    Bool(bool),
    /// Text literal
    Text(String),
    /// List of values, used for `IN(...)` conditions
    List(Vec<Value>),
}

/// The kind of a [`Value`], without its payload.
///
/// Also used as the target kind when sanitizing raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Integer,
    Float,
    Bool,
    Text,
    List,
}

impl ValueKind {
    /// Lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "boolean",
            ValueKind::Text => "string",
            ValueKind::List => "list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text of this value as it appears unquoted in SQL.
    ///
    /// Lists are joined with `,` and no separator space.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    /// Append the unquoted text of this value to `out`.
    pub fn write_text(&self, out: &mut String) {
        use std::fmt::Write as _;

        match self {
            Value::Null => out.push_str("NULL"),
            Value::Integer(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Float(v) if v.is_nan() => out.push_str("NAN"),
            Value::Float(v) if v.is_infinite() => {
                out.push_str(if v.is_sign_negative() { "-INF" } else { "INF" })
            }
            Value::Float(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Bool(v) => out.push(if *v { '1' } else { '0' }),
            Value::Text(v) => out.push_str(v),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_text(out);
                }
            }
        }
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(v: Cow<'_, str>) -> Self {
        Value::Text(v.into_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::from(v.naive_utc())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or_else(|| Value::Text(n.to_string())),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            obj @ serde_json::Value::Object(_) => Value::Text(obj.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
        }
    }
}

/// An ordered list of `(column, value)` pairs.
pub type Fields = Vec<(String, Value)>;

/// Build an ordered [`Fields`] list from `column => value` pairs.
///
/// ```rust
/// use repoman::{fields, Value};
///
/// let f = fields! { "name" => "Test name", "age" => 25, "col" => Value::Null };
/// assert_eq!(f[1], ("age".to_string(), Value::Integer(25)));
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<(::std::string::String, $crate::Value)>::new()
    };
    ($($col:expr => $val:expr),+ $(,)?) => {
        ::std::vec![$((::std::string::String::from($col), $crate::Value::from($val))),+]
    };
}
