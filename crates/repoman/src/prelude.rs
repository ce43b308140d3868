//! Convenient imports for typical `repoman` usage.
//!
//! ```ignore
//! use repoman::prelude::*;
//! ```

pub use crate::fields;
pub use crate::{
    DataManager, DataSource, Entity, EntityRegistry, FromRow, FromValue, ManagerConfig, OrmError,
    OrmResult, QueryBuilder, QueryOutput, Repository, RepositoryBase, Row, Sanitizer, Value,
    ValueKind,
};
