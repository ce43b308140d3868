use super::truncate_sql;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

/// Logs statements through `tracing` under target `repoman.sql`.
///
/// The statement is emitted from [`QueryHook::before_query`], so it is logged
/// even with monitoring disabled. Completion events (duration, outcome) are
/// emitted from `after_query`, which only runs when monitoring is enabled.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Level for statement events. Failures are always `WARN`.
    pub level: Level,
    /// Truncate long SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Emit completion events too.
    pub log_completion: bool,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            log_completion: true,
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Only log statements, not their outcome.
    pub fn without_completion(mut self) -> Self {
        self.log_completion = false;
        self
    }
}

// `tracing` macros need the level at compile time.
macro_rules! event_at {
    ($level:expr, $($rest:tt)*) => {
        if $level == Level::TRACE {
            tracing::trace!($($rest)*)
        } else if $level == Level::DEBUG {
            tracing::debug!($($rest)*)
        } else if $level == Level::INFO {
            tracing::info!($($rest)*)
        } else if $level == Level::WARN {
            tracing::warn!($($rest)*)
        } else {
            tracing::error!($($rest)*)
        }
    };
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let sql = truncate_sql(&ctx.sql, self.max_sql_length);
        event_at!(
            self.level,
            target: "repoman.sql",
            query_type = %ctx.query_type,
            tag = ctx.tag.as_deref().unwrap_or("-"),
            fields = ?ctx.fields,
            "{sql}"
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if !self.log_completion {
            return;
        }
        match result {
            QueryResult::Error(error) => tracing::warn!(
                target: "repoman.sql",
                query_type = %ctx.query_type,
                ?duration,
                %error,
                "statement failed"
            ),
            outcome => event_at!(
                self.level,
                target: "repoman.sql",
                query_type = %ctx.query_type,
                ?duration,
                %outcome,
                "statement finished"
            ),
        }
    }
}
