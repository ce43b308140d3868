use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    /// `REPLACE INTO` upsert
    Replace,
    Update,
    Delete,
    /// Anything else (DDL, custom statements)
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    ///
    /// Leading whitespace, comments and opening parentheses are skipped.
    pub fn from_sql(sql: &str) -> Self {
        let head = skip_sql_prefix(sql);
        const KEYWORDS: [(&str, QueryType); 5] = [
            ("SELECT", QueryType::Select),
            ("INSERT", QueryType::Insert),
            ("REPLACE", QueryType::Replace),
            ("UPDATE", QueryType::Update),
            ("DELETE", QueryType::Delete),
        ];
        KEYWORDS
            .iter()
            .find(|(kw, _)| starts_with_keyword(head, kw))
            .map(|(_, ty)| *ty)
            .unwrap_or(QueryType::Other)
    }

    /// Lowercase keyword, as used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Insert => "insert",
            QueryType::Replace => "replace",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
            QueryType::Other => "other",
        }
    }

    /// Whether the statement changes data.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            QueryType::Insert | QueryType::Replace | QueryType::Update | QueryType::Delete
        )
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn skip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            s = match rest.find('\n') {
                Some(pos) => &rest[pos + 1..],
                None => "",
            };
        } else if let Some(rest) = s.strip_prefix("/*") {
            s = match rest.find("*/") {
                Some(pos) => &rest[pos + 2..],
                None => "",
            };
        } else if let Some(rest) = s.strip_prefix('(') {
            s = rest;
        }
        if s.len() == before.len() {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    let Some(prefix) = s.get(..keyword.len()) else {
        return false;
    };
    prefix.eq_ignore_ascii_case(keyword)
        && s[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// Information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL that will be sent to the data source.
    pub sql: String,
    /// Detected statement kind.
    pub query_type: QueryType,
    /// Optional name identifying the statement, e.g. `users.delete`.
    pub tag: Option<String>,
    /// Low-cardinality structured fields (entity name, operation, ...).
    pub fields: BTreeMap<String, String>,
}

impl QueryContext {
    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            tag: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace the SQL and re-detect its kind.
    pub(crate) fn set_sql(&mut self, sql: String) {
        self.query_type = QueryType::from_sql(&sql);
        self.sql = sql;
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, as seen by monitors.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement changed rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::Error(if msg.len() > MAX_ERROR_LEN {
            super::truncate_sql(&msg, Some(MAX_ERROR_LEN))
        } else {
            msg
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Receives execution events.
///
/// Only called when monitoring is enabled.
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement is sent.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes, successfully or not.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a statement exceeds the slow query threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// What to do with a statement after a hook has seen it.
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    /// Run the statement unchanged.
    Continue,
    /// Run this SQL instead.
    ModifySql(String),
    /// Do not run the statement; fail with this reason.
    Abort(String),
}

/// Intercepts statements before they reach the data source.
pub trait QueryHook: Send + Sync {
    /// Inspect the statement. Runs whether or not monitoring is enabled.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after completion when monitoring is enabled, before monitors.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
