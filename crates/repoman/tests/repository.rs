use repoman::monitor::{HookAction, QueryContext, QueryHook, QueryType, StatsMonitor};
use repoman::prelude::*;
use repoman::MemorySource;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
struct FakeEntity {
    id: Option<i64>,
    name: String,
    age: i64,
}

impl Entity for FakeEntity {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

struct FakeRepository {
    base: RepositoryBase<MemorySource>,
}

impl Repository for FakeRepository {
    type Entity = FakeEntity;
    type Source = MemorySource;

    fn base(&self) -> &RepositoryBase<MemorySource> {
        &self.base
    }

    fn data_to_entity(&self, row: &Row) -> OrmResult<FakeEntity> {
        let mut entity: FakeEntity = self.base.new_entity()?;
        entity.set_id(row.try_get("id")?);
        entity.name = row.try_get("name")?;
        entity.age = row.try_get("age")?;
        Ok(entity)
    }

    async fn create(&self, entity: &mut FakeEntity) -> OrmResult<()> {
        let id = self
            .base
            .insert(fields! { "name" => &entity.name, "age" => entity.age })
            .await?;
        if let Some(id) = id {
            entity.set_id(id);
        }
        Ok(())
    }

    async fn update(&self, entity: &FakeEntity) -> OrmResult<()> {
        let id = entity
            .id()
            .ok_or_else(|| OrmError::validation("fake entity has no id"))?;
        self.base
            .update_by_id(id, fields! { "name" => &entity.name, "age" => entity.age })
            .await?;
        Ok(())
    }
}

fn registry() -> Arc<EntityRegistry> {
    let mut registry = EntityRegistry::new();
    registry.register("fake", FakeEntity::default()).unwrap();
    Arc::new(registry)
}

fn setup(manager: DataManager<MemorySource>) -> (Arc<DataManager<MemorySource>>, FakeRepository) {
    let manager = Arc::new(manager);
    let base = RepositoryBase::new(manager.clone(), registry(), "fake").unwrap();
    (manager, FakeRepository { base })
}

fn fake_row(id: i64, name: &str, age: i64) -> Row {
    Row::from_pairs([
        ("id", Value::from(id)),
        ("name", Value::from(name)),
        ("age", Value::from(age)),
    ])
}

fn fake(id: Option<i64>, name: &str, age: i64) -> FakeEntity {
    FakeEntity {
        id,
        name: name.to_string(),
        age,
    }
}

#[test]
fn unregistered_entity_is_rejected() {
    let manager = Arc::new(DataManager::new(MemorySource::new()));
    let err = RepositoryBase::new(manager, registry(), "unknown_name").unwrap_err();
    assert_eq!(err.to_string(), "Entity (unknown_name) is not registered");
}

#[tokio::test]
async fn read_maps_every_row() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager
        .source()
        .push_rows(vec![fake_row(1, "Ann", 31), fake_row(2, "Bob", 42)]);

    let all = repo.read().await.unwrap();
    assert_eq!(all, vec![fake(Some(1), "Ann", 31), fake(Some(2), "Bob", 42)]);
    assert_eq!(
        manager.source().last_executed().as_deref(),
        Some("SELECT * FROM fake")
    );
}

#[tokio::test]
async fn read_without_rows_is_not_found() {
    let (_, repo) = setup(DataManager::new(MemorySource::new()));
    let err = repo.read().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Not found: Record not found in fake with query \"SELECT * FROM fake\""
    );
}

#[tokio::test]
async fn read_on_failing_source_is_not_found() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_error("gone away");
    let err = repo.read().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "Not found: Record not found in fake with query \"SELECT * FROM fake\""
    );
}

#[derive(Debug, PartialEq)]
struct AgeBucket {
    age: i64,
    total: i64,
}

impl FromRow for AgeBucket {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(AgeBucket {
            age: row.try_get("age")?,
            total: row.try_get("total")?,
        })
    }
}

#[tokio::test]
async fn fetch_all_decodes_custom_shapes() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    let sql = "SELECT age, COUNT(*) AS total FROM fake GROUP BY age";
    manager.source().push_rows(vec![
        Row::from_pairs([("age", Value::from(31)), ("total", Value::from(2))]),
        Row::from_pairs([("age", Value::from(42)), ("total", Value::from("1"))]),
    ]);

    let buckets: Vec<AgeBucket> = repo.base().fetch_all(sql).await.unwrap();
    assert_eq!(
        buckets,
        vec![AgeBucket { age: 31, total: 2 }, AgeBucket { age: 42, total: 1 }]
    );

    manager.source().push_rows(vec![fake_row(1, "Ann", 31)]);
    let rows: Vec<Row> = repo.base().fetch_all("SELECT * FROM fake").await.unwrap();
    assert_eq!(rows, vec![fake_row(1, "Ann", 31)]);
}

#[tokio::test]
async fn fetch_all_reports_missing_columns() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager
        .source()
        .push_rows(vec![Row::from_pairs([("age", Value::from(31))])]);
    let err = repo
        .base()
        .fetch_all::<AgeBucket>("SELECT age FROM fake")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("total"));
}

#[test]
fn new_entity_clones_the_registered_prototype() {
    let (_, repo) = setup(DataManager::new(MemorySource::new()));
    let entity: FakeEntity = repo.base().new_entity().unwrap();
    assert_eq!(entity, FakeEntity::default());
}

#[tokio::test]
async fn find_selects_one_row_by_id() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_rows(vec![fake_row(2, "Bob", 42)]);

    let found = repo.find(2).await.unwrap();
    assert_eq!(found, fake(Some(2), "Bob", 42));
    assert_eq!(
        manager.source().last_executed().as_deref(),
        Some("SELECT * FROM fake WHERE id = 2 LIMIT 1")
    );

    let err = repo.find(3).await.unwrap_err();
    assert_eq!(err.to_string(), "Not found: Record not found in fake");
}

#[tokio::test]
async fn single_row_failure_is_not_found() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_error("lost connection");
    let err = repo.find(1).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_emits_limited_statement() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_affected(1);

    let affected = repo.delete(&fake(Some(1), "Ann", 31)).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        manager.source().executed(),
        vec!["DELETE FROM fake WHERE id = 1 LIMIT 1".to_string()]
    );
}

#[tokio::test]
async fn delete_without_id_runs_nothing() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    let err = repo.delete(&fake(None, "Ann", 31)).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(manager.source().executed().is_empty());
}

#[tokio::test]
async fn failing_source_reports_query_and_entity() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_error("lost connection");

    let err = repo.delete(&fake(Some(1), "Ann", 31)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Query (DELETE FROM fake WHERE id = 1 LIMIT 1) not executed for (fake): \
         Data source error: lost connection"
    );
}

#[tokio::test]
async fn create_sanitizes_and_sets_generated_id() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_insert(9);

    let mut entity = fake(None, "O'Brien", 25);
    repo.create(&mut entity).await.unwrap();
    assert_eq!(entity.id(), Some(9));
    assert_eq!(
        manager.source().last_executed().as_deref(),
        Some(r#"INSERT INTO fake (name, age) VALUES ("O\'Brien", 25)"#)
    );
}

#[tokio::test]
async fn update_targets_one_row() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()));
    manager.source().push_affected(1);

    repo.update(&fake(Some(3), "Bob \"B\"", 30)).await.unwrap();
    assert_eq!(
        manager.source().last_executed().as_deref(),
        Some(r#"UPDATE fake SET name = "Bob \"B\"", age = 30 WHERE id = 3 LIMIT 1"#)
    );
}

struct ReadOnly;

impl QueryHook for ReadOnly {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        if ctx.query_type.is_mutation() {
            HookAction::Abort(format!("read-only: {:?}", ctx.query_type))
        } else {
            HookAction::Continue
        }
    }
}

#[tokio::test]
async fn hook_abort_surfaces_as_query_failure() {
    let (manager, repo) = setup(DataManager::new(MemorySource::new()).with_hook(ReadOnly));

    let err = repo.delete(&fake(Some(1), "Ann", 31)).await.unwrap_err();
    match err {
        OrmError::QueryFailed { entity, message, .. } => {
            assert_eq!(entity, "fake");
            assert!(message.contains("Query aborted by hook: read-only: Delete"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(manager.source().executed().is_empty());
}

#[tokio::test]
async fn monitored_repository_counts_statements() {
    let stats = Arc::new(StatsMonitor::new());
    let (manager, repo) = setup(
        DataManager::new(MemorySource::new())
            .with_config(ManagerConfig::new().enable_monitoring())
            .with_monitor_arc(stats.clone()),
    );
    manager.source().push_rows(vec![fake_row(1, "Ann", 31)]);
    manager.source().push_affected(1);

    let first = repo.read().await.unwrap().remove(0);
    repo.delete(&first).await.unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 2);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(QueryType::from_sql(&manager.source().executed()[1]), QueryType::Delete);
}
