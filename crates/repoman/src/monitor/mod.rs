//! Query monitoring and hooks for statement execution.
//!
//! [`DataManager`](crate::DataManager) runs every statement through an
//! optional [`QueryHook`] (inspect, rewrite or abort before execution) and
//! reports completed statements to a [`QueryMonitor`] when monitoring is
//! enabled in [`ManagerConfig`](crate::ManagerConfig).
//!
//! # Example
//!
//! ```rust,ignore
//! use repoman::monitor::{LoggingMonitor, StatsMonitor, CompositeMonitor};
//! use repoman::{DataManager, ManagerConfig};
//! use std::time::Duration;
//!
//! let stats = std::sync::Arc::new(StatsMonitor::new());
//! let manager = DataManager::new(source)
//!     .with_config(
//!         ManagerConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(50))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(CompositeMonitor::new().add(LoggingMonitor::new()).add_arc(stats.clone()));
//! ```

mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;


pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

/// Cut `sql` to at most `max` bytes on a char boundary, appending `...` when cut.
pub(crate) fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}
