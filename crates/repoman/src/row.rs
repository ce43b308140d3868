//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::sync::Arc;

/// One row of a tabular result.
///
/// Column names are shared between all rows of the same result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. Extra values beyond the column count are dropped and
    /// missing ones are filled with `Null`.
    pub fn new(columns: Arc<[String]>, mut values: Vec<Value>) -> Self {
        values.resize(columns.len(), Value::Null);
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of `column`, if the column exists.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Typed value of `column`, returning [`OrmError::Decode`] on failure.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "column not present in row"))?;
        T::from_value(value).map_err(|message| OrmError::decode(column, message))
    }

    /// The row as a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(c, v)| (c.clone(), serde_json::Value::from(v)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Conversion from a row value into a Rust type.
pub trait FromValue: Sized {
    /// Convert `value`, returning a human-readable reason on failure.
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {}", value.kind())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        if let Some(v) = value.as_i64() {
            return Ok(v);
        }
        match value {
            Value::Bool(b) => Ok(i64::from(*b)),
            // Drivers commonly hand numbers back as text.
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("integer", value)),
            _ => Err(mismatch("integer", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| format!("integer {v} out of range for i32"))
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        u32::try_from(v).map_err(|_| format!("integer {v} out of range for u32"))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("float", value)),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Integer(v) => Ok(*v != 0),
            Value::Text(s) if s == "0" || s == "1" => Ok(s == "1"),
            _ => Err(mismatch("boolean", value)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Err(mismatch("string", value)),
            Value::List(_) => Err(mismatch("string", value)),
            other => Ok(other.to_text()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Decodes a whole row into a typed value.
///
/// Used by [`RepositoryBase::fetch_all`](crate::RepositoryBase::fetch_all) for
/// result shapes that are not entities (aggregates, joins).
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}
