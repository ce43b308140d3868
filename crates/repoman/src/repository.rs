//! Repositories: per-entity CRUD over a [`DataManager`].
//!
//! A concrete repository owns a [`RepositoryBase`] and implements
//! [`Repository`], supplying row mapping plus `create` and `update`.
//! `read`, `find` and `delete` come for free.
//!
//! ```rust,ignore
//! struct UserRepository {
//!     base: RepositoryBase<MemorySource>,
//! }
//!
//! impl Repository for UserRepository {
//!     type Entity = User;
//!     type Source = MemorySource;
//!
//!     fn base(&self) -> &RepositoryBase<MemorySource> {
//!         &self.base
//!     }
//!
//!     fn data_to_entity(&self, row: &Row) -> OrmResult<User> {
//!         Ok(User { id: row.try_get("id")?, name: row.try_get("name")? })
//!     }
//!
//!     async fn create(&self, user: &mut User) -> OrmResult<()> {
//!         if let Some(id) = self.base.insert(fields! { "name" => &user.name }).await? {
//!             user.set_id(id);
//!         }
//!         Ok(())
//!     }
//!
//!     async fn update(&self, user: &User) -> OrmResult<()> {
//!         let id = user.id().ok_or_else(|| OrmError::validation("user has no id"))?;
//!         self.base.update_by_id(id, fields! { "name" => &user.name }).await?;
//!         Ok(())
//!     }
//! }
//! ```

use crate::builder::QueryBuilder;
use crate::entity::{Entity, EntityRegistry};
use crate::error::{OrmError, OrmResult};
use crate::manager::DataManager;
use crate::monitor::QueryContext;
use crate::row::{FromRow, Row};
use crate::sanitize::Sanitizer;
use crate::source::{DataSource, QueryOutput};
use crate::value::{Value, ValueKind};
use std::future::Future;
use std::sync::Arc;

/// Shared state and helpers for one entity's repository.
#[derive(Debug)]
pub struct RepositoryBase<S> {
    manager: Arc<DataManager<S>>,
    registry: Arc<EntityRegistry>,
    entity: String,
}

impl<S: DataSource + 'static> RepositoryBase<S> {
    /// Bind a repository to `entity`, which doubles as the table name.
    ///
    /// Fails with [`OrmError::EntityNotRegistered`] if the registry does not know it.
    pub fn new(
        manager: Arc<DataManager<S>>,
        registry: Arc<EntityRegistry>,
        entity: &str,
    ) -> OrmResult<Self> {
        registry.ensure_registered(entity)?;
        Ok(Self {
            manager,
            registry,
            entity: entity.to_string(),
        })
    }

    /// Entity (and table) name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn manager(&self) -> &DataManager<S> {
        &self.manager
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// A builder initialized on this table, sanitizing through the data manager.
    pub fn query_builder(&self) -> QueryBuilder {
        let sanitizer: Arc<dyn Sanitizer> = self.manager.clone();
        QueryBuilder::for_table(&self.entity).with_sanitizer(sanitizer)
    }

    /// A fresh copy of this entity's registered prototype.
    pub fn new_entity<T: Entity + Clone>(&self) -> OrmResult<T> {
        self.registry.create(&self.entity)
    }

    /// Run `sql`; any failure is reported as [`OrmError::QueryFailed`].
    pub async fn execute_query(&self, sql: &str) -> OrmResult<QueryOutput> {
        let ctx = QueryContext::new(sql).with_field("entity", self.entity.as_str());
        self.manager
            .execute_with(ctx)
            .await
            .map_err(|e| OrmError::QueryFailed {
                query: sql.to_string(),
                entity: self.entity.clone(),
                message: e.to_string(),
            })
    }

    /// Run `sql` and return every row.
    ///
    /// Both a failed statement and an empty result are [`OrmError::NotFound`],
    /// naming the query.
    pub async fn execute_for_rows(&self, sql: &str) -> OrmResult<Vec<Row>> {
        match self.execute_query(sql).await {
            Ok(output) if !output.rows.is_empty() => Ok(output.rows),
            _ => Err(OrmError::not_found(format!(
                "Record not found in {} with query \"{}\"",
                self.entity, sql
            ))),
        }
    }

    /// Run `sql` and decode every row as `T`.
    ///
    /// Fails like [`RepositoryBase::execute_for_rows`], or with the first decode error.
    pub async fn fetch_all<T: FromRow>(&self, sql: &str) -> OrmResult<Vec<T>> {
        self.execute_for_rows(sql)
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// Run `sql` and return the first row.
    ///
    /// Both a failed statement and an empty result are [`OrmError::NotFound`].
    pub async fn execute_for_row(&self, sql: &str) -> OrmResult<Row> {
        self.execute_query(sql)
            .await
            .ok()
            .and_then(QueryOutput::into_first)
            .ok_or_else(|| OrmError::not_found(format!("Record not found in {}", self.entity)))
    }

    /// Sanitize every value and `INSERT` them. Returns the generated id, if any.
    pub async fn insert<I, K, V>(&self, fields: I) -> OrmResult<Option<i64>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let fields: Vec<(K, Value)> = fields
            .into_iter()
            .map(|(col, val)| {
                let val = val.into();
                let clean = self.manager.sanitize(&val, val.kind());
                (col, clean)
            })
            .collect();
        let sql = self.query_builder().insert(fields).finalize();
        self.execute_query(&sql).await?;
        Ok(self.manager.last_insert_id())
    }

    /// `UPDATE` the row with this id, sanitizing every value. Returns affected rows.
    pub async fn update_by_id<I, K, V>(&self, id: i64, fields: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let sql = self
            .query_builder()
            .update(fields, true)
            .where_clause([("id", id)])
            .limit(1)
            .finalize();
        Ok(self.execute_query(&sql).await?.affected_rows)
    }
}

/// CRUD for one entity type.
///
/// Implementors provide row mapping, `create` and `update`; `read`, `find`
/// and `delete` are built on [`RepositoryBase`].
pub trait Repository: Send + Sync {
    type Entity: Entity;
    type Source: DataSource + 'static;

    fn base(&self) -> &RepositoryBase<Self::Source>;

    /// Map one row to an entity.
    fn data_to_entity(&self, row: &Row) -> OrmResult<Self::Entity>;

    /// Persist a new entity, typically setting its id.
    fn create(&self, entity: &mut Self::Entity) -> impl Future<Output = OrmResult<()>> + Send;

    /// Persist changes to an existing entity.
    fn update(&self, entity: &Self::Entity) -> impl Future<Output = OrmResult<()>> + Send;

    /// Every row of the table. An empty table or a failed query is [`OrmError::NotFound`].
    fn read(&self) -> impl Future<Output = OrmResult<Vec<Self::Entity>>> + Send {
        async move {
            let base = self.base();
            let sql = base.query_builder().select_all().finalize();
            let rows = base.execute_for_rows(&sql).await?;
            rows.iter()
                .map(|row| self.data_to_entity(row))
                .collect::<OrmResult<Vec<_>>>()
        }
    }

    /// The row with this id.
    fn find(&self, id: i64) -> impl Future<Output = OrmResult<Self::Entity>> + Send {
        async move {
            let base = self.base();
            let sql = base
                .query_builder()
                .select_all()
                .where_clause([("id", id)])
                .limit(1)
                .finalize();
            let row = base.execute_for_row(&sql).await?;
            self.data_to_entity(&row)
        }
    }

    /// Delete the entity's row. Returns affected rows.
    ///
    /// An entity without an id is a validation error; nothing is executed.
    fn delete(&self, entity: &Self::Entity) -> impl Future<Output = OrmResult<u64>> + Send {
        async move {
            let base = self.base();
            let id = entity.id().ok_or_else(|| {
                OrmError::validation(format!("cannot delete from {}: entity has no id", base.entity()))
            })?;
            let id = base.manager().sanitize(&Value::Integer(id), ValueKind::Integer);
            let sql = base
                .query_builder()
                .delete()
                .where_clause([("id", id)])
                .limit(1)
                .finalize();
            Ok(base.execute_query(&sql).await?.affected_rows)
        }
    }
}
