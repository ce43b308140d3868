//! Execution settings for the data manager.

use crate::error::{OrmError, OrmResult};
use std::time::Duration;

/// Environment variable read by [`ManagerConfig::from_env`]: timeout in milliseconds.
pub const ENV_QUERY_TIMEOUT_MS: &str = "REPOMAN_QUERY_TIMEOUT_MS";
/// Environment variable read by [`ManagerConfig::from_env`]: slow threshold in milliseconds.
pub const ENV_SLOW_QUERY_MS: &str = "REPOMAN_SLOW_QUERY_MS";
/// Environment variable read by [`ManagerConfig::from_env`]: `1`/`true` enables monitoring.
pub const ENV_MONITORING: &str = "REPOMAN_MONITORING";

/// Settings for a [`DataManager`](crate::DataManager).
///
/// Monitoring is off until enabled. SQL in log lines is cut at
/// `max_logged_sql_length` bytes.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Give up on a statement after this long. `None` waits forever.
    pub query_timeout: Option<Duration>,
    /// Statements slower than this are reported through `on_slow_query`.
    pub slow_query_threshold: Option<Duration>,
    /// Whether monitors and `after_query` hooks receive events.
    pub monitoring_enabled: bool,
    /// Truncation for SQL in log output. `None` logs it whole.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: None,
            monitoring_enabled: false,
            max_logged_sql_length: Some(200),
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `REPOMAN_*` environment variables on top of the defaults.
    ///
    /// Unset variables keep their default; malformed ones are an error.
    pub fn from_env() -> OrmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ManagerConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OrmResult<Self> {
        let mut config = Self::default();
        if let Some(ms) = lookup(ENV_QUERY_TIMEOUT_MS) {
            config.query_timeout = Some(parse_millis(ENV_QUERY_TIMEOUT_MS, &ms)?);
        }
        if let Some(ms) = lookup(ENV_SLOW_QUERY_MS) {
            config.slow_query_threshold = Some(parse_millis(ENV_SLOW_QUERY_MS, &ms)?);
        }
        if let Some(flag) = lookup(ENV_MONITORING) {
            config.monitoring_enabled = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(OrmError::validation(format!(
                        "{ENV_MONITORING}: expected a boolean, got '{other}'"
                    )));
                }
            };
        }
        Ok(config)
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_sql_truncation(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.monitoring_enabled = false;
        self
    }
}

fn parse_millis(key: &str, raw: &str) -> OrmResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| OrmError::validation(format!("{key}: expected milliseconds, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ManagerConfig::new();
        assert!(!config.monitoring_enabled);
        assert_eq!(config.query_timeout, None);
        assert_eq!(config.max_logged_sql_length, Some(200));
    }

    #[test]
    fn reads_overrides() {
        let config = ManagerConfig::from_lookup(lookup(&[
            (ENV_QUERY_TIMEOUT_MS, "1500"),
            (ENV_SLOW_QUERY_MS, " 20 "),
            (ENV_MONITORING, "true"),
        ]))
        .unwrap();
        assert_eq!(config.query_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.slow_query_threshold, Some(Duration::from_millis(20)));
        assert!(config.monitoring_enabled);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = ManagerConfig::from_lookup(lookup(&[(ENV_QUERY_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_QUERY_TIMEOUT_MS));
        assert!(ManagerConfig::from_lookup(lookup(&[(ENV_MONITORING, "maybe")])).is_err());
    }
}
