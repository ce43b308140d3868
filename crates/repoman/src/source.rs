//! The data source seam: anything that can run a SQL string.

use crate::error::OrmResult;
use crate::row::Row;

/// Result of running one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Returned rows (empty for statements that return none).
    pub rows: Vec<Row>,
    /// Rows changed by a mutation.
    pub affected_rows: u64,
}

impl QueryOutput {
    /// A successful statement with no rows and nothing affected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result set.
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            affected_rows: 0,
        }
    }

    /// A mutation that changed `n` rows.
    pub fn affected(n: u64) -> Self {
        Self {
            rows: Vec::new(),
            affected_rows: n,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Consume and return the first row, if any.
    pub fn into_first(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

/// A relational data source that executes finished SQL text.
///
/// Connection handling, drivers and result decoding live behind this trait.
/// Failures are reported as `Err`; a statement that succeeds but returns no
/// rows is `Ok` with an empty [`QueryOutput`].
pub trait DataSource: Send + Sync {
    /// Execute `sql` and return its rows / affected count.
    fn query(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<QueryOutput>> + Send;

    /// Escape raw text for interpolation inside a quoted literal.
    ///
    /// The default applies MySQL-style backslash escaping.
    fn escape_string(&self, raw: &str) -> String {
        crate::sanitize::escape_string(raw)
    }

    /// Id generated by the most recent INSERT, if the source tracks one.
    fn last_insert_id(&self) -> Option<i64> {
        None
    }
}

impl<S: DataSource> DataSource for std::sync::Arc<S> {
    fn query(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<QueryOutput>> + Send {
        (**self).query(sql)
    }

    fn escape_string(&self, raw: &str) -> String {
        (**self).escape_string(raw)
    }

    fn last_insert_id(&self) -> Option<i64> {
        (**self).last_insert_id()
    }
}
