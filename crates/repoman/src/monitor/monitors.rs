use super::truncate_sql;
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A monitor that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// A monitor that prints statements to stderr.
#[derive(Debug, Clone)]
pub struct LoggingMonitor {
    /// Only log statements at least this slow.
    pub min_duration: Option<Duration>,
    /// Truncate long SQL (in bytes). `None` prints it whole.
    pub max_sql_length: Option<usize>,
    /// Prefix for every line.
    pub prefix: String,
}

impl Default for LoggingMonitor {
    fn default() -> Self {
        Self {
            min_duration: None,
            max_sql_length: Some(200),
            prefix: "[repoman]".to_string(),
        }
    }
}

impl LoggingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The line printed for a completed statement, e.g.
    /// `[repoman] select users.list 1.2ms 4 rows :: SELECT * FROM users`.
    pub fn format_line(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) -> String {
        let mut line = format!("{} {}", self.prefix, ctx.query_type);
        if let Some(tag) = &ctx.tag {
            line.push(' ');
            line.push_str(tag);
        }
        line.push_str(&format!(
            " {duration:?} {result} :: {}",
            truncate_sql(&ctx.sql, self.max_sql_length)
        ));
        line
    }
}

impl QueryMonitor for LoggingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if self.min_duration.is_some_and(|min| duration < min) {
            return;
        }
        eprintln!("{}", self.format_line(ctx, duration, result));
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        eprintln!(
            "{} slow {} {duration:?} :: {}",
            self.prefix,
            ctx.query_type,
            truncate_sql(&ctx.sql, self.max_sql_length)
        );
    }
}

/// Snapshot of counters collected by [`StatsMonitor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub slow_queries: u64,
    pub select_count: u64,
    pub insert_count: u64,
    pub replace_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    /// SQL of the slowest statement seen.
    pub slowest_query: Option<String>,
}

/// A monitor that aggregates counters per statement kind.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    stats: Mutex<QueryStats>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_stats<R>(&self, f: impl FnOnce(&mut QueryStats) -> R) -> R {
        let mut guard = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Current counters.
    pub fn stats(&self) -> QueryStats {
        self.with_stats(|s| s.clone())
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.with_stats(|s| *s = QueryStats::default());
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.with_stats(|s| {
            s.total_queries += 1;
            s.total_duration = s.total_duration.saturating_add(duration);
            match ctx.query_type {
                QueryType::Select => s.select_count += 1,
                QueryType::Insert => s.insert_count += 1,
                QueryType::Replace => s.replace_count += 1,
                QueryType::Update => s.update_count += 1,
                QueryType::Delete => s.delete_count += 1,
                QueryType::Other => {}
            }
            if result.is_error() {
                s.failed_queries += 1;
            }
            if duration > s.max_duration || s.slowest_query.is_none() {
                s.max_duration = duration;
                s.slowest_query = Some(ctx.sql.clone());
            }
        });
    }

    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {
        self.with_stats(|s| s.slow_queries += 1);
    }
}

/// Fans events out to several monitors in order.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        self.monitors.iter().for_each(|m| m.on_query_start(ctx));
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.monitors
            .iter()
            .for_each(|m| m.on_query_complete(ctx, duration, result));
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        self.monitors
            .iter()
            .for_each(|m| m.on_slow_query(ctx, duration));
    }
}

/// Runs several hooks in sequence.
///
/// Each hook sees the SQL as rewritten by the hooks before it; the first
/// `Abort` wins.
#[derive(Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let mut current = ctx.clone();
        for hook in &self.hooks {
            match hook.before_query(&current) {
                HookAction::Continue => {}
                HookAction::ModifySql(sql) => current.set_sql(sql),
                abort @ HookAction::Abort(_) => return abort,
            }
        }
        if current.sql != ctx.sql {
            HookAction::ModifySql(current.sql)
        } else {
            HookAction::Continue
        }
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for hook in &self.hooks {
            hook.after_query(ctx, duration, result);
        }
    }
}
