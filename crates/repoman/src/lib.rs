//! # repoman
//!
//! A small repository-pattern ORM built around a fluent SQL string builder.
//!
//! ## Features
//!
//! - **Fluent builder**: `QueryBuilder` appends SQL fragments in call order
//! - **Entity registry**: named prototypes cloned into fresh entities
//! - **Repositories**: `read` / `find` / `delete` for free, `create` / `update` per entity
//! - **Pluggable data source**: anything implementing `DataSource` can execute the SQL
//! - **Query monitoring**: hooks, timeouts, slow query reports and `tracing` events
//!
//! ## Query Builder
//!
//! ```rust
//! use repoman::{fields, QueryBuilder};
//!
//! let mut qb = QueryBuilder::new();
//!
//! let sql = qb.init("users").select_all().where_clause(fields! { "id" => 1 }).finalize();
//! assert_eq!(sql, "SELECT * FROM users WHERE id = 1");
//!
//! let sql = qb.init("users").delete().where_clause(fields! { "id" => 1 }).limit(1).finalize();
//! assert_eq!(sql, "DELETE FROM users WHERE id = 1 LIMIT 1");
//! ```
//!
//! Values are written as literals and are **not escaped** by the builder.
//! Sanitize input through a [`Sanitizer`] (the [`DataManager`] is one) first.

pub mod builder;
pub mod config;
pub mod entity;
pub mod error;
pub mod manager;
pub mod memory;
pub mod monitor;
pub mod repository;
pub mod row;
pub mod sanitize;
pub mod source;
pub mod value;

pub mod prelude;

pub use builder::QueryBuilder;
pub use config::ManagerConfig;
pub use entity::{Entity, EntityRegistry};
pub use error::{OrmError, OrmResult};
pub use manager::DataManager;
pub use memory::MemorySource;
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, LoggingMonitor, NoopMonitor, QueryContext,
    QueryHook, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor,
};
pub use repository::{Repository, RepositoryBase};
pub use row::{FromRow, FromValue, Row};
pub use sanitize::{EscapeSanitizer, Sanitizer, escape_string};
pub use source::{DataSource, QueryOutput};
pub use value::{Fields, Value, ValueKind};

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;
