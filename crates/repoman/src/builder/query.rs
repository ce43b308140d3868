use super::format::{push_assigned, push_on_condition, push_where_condition, sanitized};
use crate::sanitize::Sanitizer;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Fluent, append-only SQL string builder.
///
/// Call [`QueryBuilder::init`] before each logical query, then chain clause
/// methods in SQL order and read the text with [`QueryBuilder::finalize`].
///
/// # Example
///
/// ```rust
/// use repoman::{fields, QueryBuilder};
///
/// let mut qb = QueryBuilder::new();
/// let sql = qb
///     .init("users")
///     .select(&["id", "name"])
///     .where_clause(fields! { "status" => "active" })
///     .order("name")
///     .limit(10)
///     .finalize();
/// assert_eq!(
///     sql,
///     r#"SELECT id, name FROM users WHERE status = "active" ORDER BY name DESC LIMIT 10"#
/// );
/// ```
#[derive(Clone, Default)]
pub struct QueryBuilder {
    /// Current table
    table: String,
    /// Accumulated SQL text
    query: String,
    /// Used by `update(.., true)`
    sanitizer: Option<Arc<dyn Sanitizer>>,
}

impl QueryBuilder {
    /// Create an empty builder with no table and no sanitizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder already initialized on `table`.
    pub fn for_table(table: &str) -> Self {
        let mut qb = Self::new();
        qb.init(table);
        qb
    }

    /// Attach the sanitizer used by [`QueryBuilder::update`] when asked to sanitize.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Start a new query on `table`, discarding any accumulated text.
    ///
    /// The attached sanitizer is kept.
    pub fn init(&mut self, table: &str) -> &mut Self {
        self.query.clear();
        self.table.clear();
        self.table.push_str(table);
        self
    }

    /// The table set by the last [`QueryBuilder::init`].
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Append `SELECT <fields> FROM <table>`; no fields means `*`.
    pub fn select(&mut self, fields: &[&str]) -> &mut Self {
        if fields.is_empty() {
            return self.select_all();
        }
        self.query.push_str("SELECT ");
        self.query.push_str(&fields.join(", "));
        self.query.push_str(" FROM ");
        self.query.push_str(&self.table);
        self
    }

    /// Append `SELECT * FROM <table>`.
    pub fn select_all(&mut self) -> &mut Self {
        self.query.push_str("SELECT * FROM ");
        self.query.push_str(&self.table);
        self
    }

    /// Append `DELETE FROM <table>`.
    pub fn delete(&mut self) -> &mut Self {
        self.query.push_str("DELETE FROM ");
        self.query.push_str(&self.table);
        self
    }

    /// Append `INSERT INTO <table> (cols) VALUES (values)`.
    ///
    /// Values are not escaped. Text and floats are double-quoted, `NULL`
    /// is written bare, everything else uses its literal text.
    pub fn insert<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.push_insert_like("INSERT INTO ", fields)
    }

    /// Same as [`QueryBuilder::insert`] but emits `REPLACE INTO`.
    pub fn replace_into<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.push_insert_like("REPLACE INTO ", fields)
    }

    fn push_insert_like<I, K, V>(&mut self, keyword: &str, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut columns = String::new();
        let mut values = String::new();
        for (i, (col, val)) in fields.into_iter().enumerate() {
            if i > 0 {
                columns.push_str(", ");
                values.push_str(", ");
            }
            columns.push_str(col.as_ref());
            let val = val.into();
            push_assigned(&mut values, &val, &val);
        }

        self.query.push_str(keyword);
        self.query.push_str(&self.table);
        self.query.push_str(" (");
        self.query.push_str(&columns);
        self.query.push_str(") VALUES (");
        self.query.push_str(&values);
        self.query.push(')');
        self
    }

    /// Append `UPDATE <table> SET col = value, ...`.
    ///
    /// With `sanitize` set and a sanitizer attached, each non-null value is
    /// sanitized first. Quoting still follows the kind of the value passed in.
    /// Without an attached sanitizer the flag is ignored.
    pub fn update<I, K, V>(&mut self, fields: I, sanitize: bool) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let sanitizer = if sanitize { self.sanitizer.as_deref() } else { None };

        let mut assignments = String::new();
        for (i, (col, val)) in fields.into_iter().enumerate() {
            if i > 0 {
                assignments.push_str(", ");
            }
            let val = val.into();
            let written = sanitized(&val, sanitizer);
            assignments.push_str(col.as_ref());
            assignments.push_str(" = ");
            push_assigned(&mut assignments, &val, &written);
        }

        self.query.push_str("UPDATE ");
        self.query.push_str(&self.table);
        self.query.push_str(" SET ");
        self.query.push_str(&assignments);
        self
    }

    /// Append ` WHERE a AND b ...`; nothing when `conditions` is empty.
    ///
    /// - `Null` → `col IS NULL`
    /// - integer → `col = 5`
    /// - list → `col IN(a,b)`, elements **unquoted**, even text
    /// - anything else → `col = "value"`
    ///
    /// Pre-format list elements yourself; they are written verbatim.
    pub fn where_clause<I, K, V>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.push_conditions(" WHERE ", conditions, push_where_condition)
    }

    /// Append ` ON a AND b ...` for the preceding join; nothing when empty.
    ///
    /// Values are column references: they are written unquoted, `Null` becomes `IS NULL`.
    pub fn on<I, K, V>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.push_conditions(" ON ", conditions, push_on_condition)
    }

    fn push_conditions<I, K, V>(
        &mut self,
        keyword: &str,
        conditions: I,
        push: fn(&mut String, &str, &Value),
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut clause = String::new();
        for (i, (col, val)) in conditions.into_iter().enumerate() {
            if i > 0 {
                clause.push_str(" AND ");
            }
            push(&mut clause, col.as_ref(), &val.into());
        }

        if !clause.is_empty() {
            self.query.push_str(keyword);
            self.query.push_str(&clause);
        }
        self
    }

    /// Append ` JOIN <table>`. Follow with [`QueryBuilder::on`].
    pub fn join(&mut self, table: &str) -> &mut Self {
        self.query.push_str(" JOIN ");
        self.query.push_str(table);
        self
    }

    /// Append ` LEFT JOIN <table>`.
    pub fn left_join(&mut self, table: &str) -> &mut Self {
        self.query.push_str(" LEFT JOIN ");
        self.query.push_str(table);
        self
    }

    /// Append ` RIGHT JOIN <table>`.
    pub fn right_join(&mut self, table: &str) -> &mut Self {
        self.query.push_str(" RIGHT JOIN ");
        self.query.push_str(table);
        self
    }

    /// Append ` ORDER BY <field> DESC`.
    pub fn order(&mut self, field: &str) -> &mut Self {
        self.order_by(field, "DESC")
    }

    /// Append ` ORDER BY <field> <DIRECTION>`.
    ///
    /// The direction is upper-cased and not validated.
    pub fn order_by(&mut self, field: &str, direction: &str) -> &mut Self {
        self.query.push_str(" ORDER BY ");
        self.query.push_str(field);
        self.query.push(' ');
        self.query.push_str(&direction.to_uppercase());
        self
    }

    /// Append ` LIMIT <limit>`.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.query.push_str(&format!(" LIMIT {limit}"));
        self
    }

    /// Append ` LIMIT <offset>,<limit>`. Note the offset is written first.
    pub fn limit_with_offset(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.query.push_str(&format!(" LIMIT {offset},{limit}"));
        self
    }

    /// The accumulated SQL text, unvalidated.
    pub fn finalize(&self) -> String {
        self.query.clone()
    }

    /// Borrow the accumulated SQL text.
    pub fn as_sql(&self) -> &str {
        &self.query
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("query", &self.query)
            .field("sanitizer", &self.sanitizer.as_ref().map(|_| "<dyn Sanitizer>"))
            .finish()
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}
