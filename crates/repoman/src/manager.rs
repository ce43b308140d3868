//! Executes SQL on a [`DataSource`] with hooks, timeouts and monitoring.

use crate::config::ManagerConfig;
use crate::error::{OrmError, OrmResult};
use crate::monitor::{
    CompositeHook, HookAction, NoopMonitor, QueryContext, QueryHook, QueryMonitor, QueryResult,
    QueryType,
};
use crate::sanitize::{Sanitizer, sanitize_with};
use crate::source::{DataSource, QueryOutput};
use crate::value::{Value, ValueKind};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Front door to a data source.
///
/// Every statement a repository runs goes through [`DataManager::execute`].
/// The manager is also the [`Sanitizer`] repositories attach to their query
/// builders, escaping text with the source's own rules.
///
/// Monitoring must be explicitly enabled via [`ManagerConfig::enable_monitoring`].
pub struct DataManager<S> {
    source: S,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: ManagerConfig,
}

impl<S: DataSource> DataManager<S> {
    /// Wrap `source` with default settings and no monitoring.
    pub fn new(source: S) -> Self {
        Self {
            source,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: ManagerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(self, monitor: M) -> Self {
        self.with_monitor_arc(Arc::new(monitor))
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replace the hook.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a hook after any existing one.
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    /// Run `sql` against the source.
    pub async fn execute(&self, sql: &str) -> OrmResult<QueryOutput> {
        self.execute_with(QueryContext::new(sql)).await
    }

    /// Run the statement described by `ctx`; tag and fields reach hooks and monitors.
    pub async fn execute_with(&self, mut ctx: QueryContext) -> OrmResult<QueryOutput> {
        self.apply_hook(&mut ctx)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.run_with_timeout(&ctx.sql).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(output) if ctx.query_type == QueryType::Select || !output.rows.is_empty() => {
                QueryResult::Rows(output.rows.len())
            }
            Ok(output) => QueryResult::Affected(output.affected_rows),
            Err(OrmError::Timeout(d)) => QueryResult::error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.log_result(&ctx, duration, &query_result);
        self.report_result(&ctx, duration, &query_result);
        result
    }

    /// Escape `value` with the source's rules and cast it to `kind`.
    pub fn sanitize(&self, value: &Value, kind: ValueKind) -> Value {
        sanitize_with(value, kind, |raw| self.source.escape_string(raw))
    }

    /// Id generated by the last INSERT, as reported by the source.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.source.last_insert_id()
    }

    fn apply_hook(&self, ctx: &mut QueryContext) -> OrmResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };

        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::ModifySql(sql) => {
                ctx.set_sql(sql);
                Ok(())
            }
            HookAction::Abort(reason) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    target: "repoman.manager",
                    reason = %reason,
                    sql = %self.logged_sql(&ctx.sql),
                    "statement aborted by hook"
                );
                Err(OrmError::validation(format!("Query aborted by hook: {reason}")))
            }
        }
    }

    async fn run_with_timeout(&self, sql: &str) -> OrmResult<QueryOutput> {
        match self.config.query_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.source.query(sql))
                .await
                .map_err(|_| OrmError::Timeout(timeout))?,
            None => self.source.query(sql).await,
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if !self.config.monitoring_enabled {
            return;
        }

        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if self
            .config
            .slow_query_threshold
            .is_some_and(|threshold| duration > threshold)
        {
            self.monitor.on_slow_query(ctx, duration);
        }
    }

    #[cfg(feature = "tracing")]
    fn log_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let sql = self.logged_sql(&ctx.sql);
        match result {
            QueryResult::Error(message) => tracing::warn!(
                target: "repoman.manager",
                query_type = ?ctx.query_type,
                ?duration,
                error = %message,
                sql = %sql,
                "statement failed"
            ),
            _ => tracing::debug!(
                target: "repoman.manager",
                query_type = ?ctx.query_type,
                ?duration,
                result = %result,
                sql = %sql,
                "statement executed"
            ),
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn log_result(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}

    #[cfg(feature = "tracing")]
    fn logged_sql(&self, sql: &str) -> String {
        crate::monitor::truncate_sql(sql, self.config.max_logged_sql_length)
    }
}

impl<S: DataSource> Sanitizer for DataManager<S> {
    fn sanitize(&self, value: &Value, kind: ValueKind) -> Value {
        DataManager::sanitize(self, value, kind)
    }
}

impl<S: fmt::Debug> fmt::Debug for DataManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataManager")
            .field("source", &self.source)
            .field("has_hook", &self.hook.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;
    use crate::monitor::StatsMonitor;
    use crate::row::Row;

    struct SlowSource(Duration);

    impl DataSource for SlowSource {
        async fn query(&self, _sql: &str) -> OrmResult<QueryOutput> {
            tokio::time::sleep(self.0).await;
            Ok(QueryOutput::affected(1))
        }
    }

    struct ForbidDelete;

    impl QueryHook for ForbidDelete {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            if ctx.query_type == QueryType::Delete {
                HookAction::Abort("delete is forbidden".to_string())
            } else {
                HookAction::Continue
            }
        }
    }

    struct Rewrite;

    impl QueryHook for Rewrite {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            HookAction::ModifySql(ctx.sql.replace("users", "users_v2"))
        }
    }

    #[tokio::test]
    async fn passes_sql_through() {
        let manager = DataManager::new(MemorySource::new());
        manager
            .source()
            .push_rows(vec![Row::from_pairs([("id", Value::from(1))])]);

        let output = manager.execute("SELECT * FROM users").await.unwrap();
        assert_eq!(output.row_count(), 1);
        assert_eq!(
            manager.source().executed(),
            vec!["SELECT * FROM users".to_string()]
        );
    }

    #[tokio::test]
    async fn hook_can_abort() {
        let manager = DataManager::new(MemorySource::new()).with_hook(ForbidDelete);
        let err = manager.execute("DELETE FROM users").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Query aborted by hook: delete is forbidden"
        );
        assert!(manager.source().executed().is_empty());
    }

    #[tokio::test]
    async fn hooks_compose_in_order() {
        let manager = DataManager::new(MemorySource::new())
            .add_hook(Rewrite)
            .add_hook(ForbidDelete);
        manager.execute("SELECT * FROM users").await.unwrap();
        assert_eq!(
            manager.source().last_executed().as_deref(),
            Some("SELECT * FROM users_v2")
        );
        assert!(manager.execute("DELETE FROM users").await.is_err());
    }

    #[tokio::test]
    async fn times_out() {
        let manager = DataManager::new(SlowSource(Duration::from_millis(200)))
            .with_config(ManagerConfig::new().with_query_timeout(Duration::from_millis(10)));
        let err = manager.execute("UPDATE users SET a = 1").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn reports_only_when_monitoring_enabled() {
        let stats = Arc::new(StatsMonitor::new());
        let quiet = DataManager::new(MemorySource::new()).with_monitor_arc(stats.clone());
        quiet.execute("SELECT 1").await.unwrap();
        assert_eq!(stats.stats().total_queries, 0);

        let loud = DataManager::new(MemorySource::new())
            .with_config(ManagerConfig::new().enable_monitoring())
            .with_monitor_arc(stats.clone());
        loud.source().push_error("gone away");
        assert!(loud.execute("SELECT 1").await.is_err());
        loud.execute("DELETE FROM users").await.unwrap();

        let snapshot = stats.stats();
        assert_eq!(snapshot.total_queries, 2);
        assert_eq!(snapshot.failed_queries, 1);
        assert_eq!(snapshot.delete_count, 1);
    }

    #[tokio::test]
    async fn flags_slow_queries() {
        let stats = Arc::new(StatsMonitor::new());
        let manager = DataManager::new(SlowSource(Duration::from_millis(20)))
            .with_config(
                ManagerConfig::new()
                    .with_slow_query_threshold(Duration::from_millis(1))
                    .enable_monitoring(),
            )
            .with_monitor_arc(stats.clone());
        manager.execute("UPDATE users SET a = 1").await.unwrap();
        assert_eq!(stats.stats().slow_queries, 1);
    }

    #[test]
    fn sanitizes_with_source_escaping() {
        let manager = DataManager::new(MemorySource::new());
        assert_eq!(
            manager.sanitize(&Value::from("O'Brien"), ValueKind::Text),
            Value::from("O\\'Brien")
        );
        assert_eq!(
            manager.sanitize(&Value::from("42abc"), ValueKind::Integer),
            Value::Integer(42)
        );
        assert_eq!(manager.sanitize(&Value::Null, ValueKind::Text), Value::Null);
    }
}
