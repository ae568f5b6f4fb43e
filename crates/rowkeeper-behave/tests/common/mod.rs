#![allow(dead_code)]

use rowkeeper_behave::prelude::{
    BehaviorKind, Dialect, Entity, SqliteIntrospector, StateMachineViolation, TemplateStore,
    TriggerCompiler, ViolationReason, apply, schema_sql,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub const ARTICLE_TABLE_SQL: &str = r"
CREATE TABLE article (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT,
    title TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL DEFAULT '',
    url_past TEXT,
    machine_state TEXT,
    stated_at TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
";

pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    for ddl in schema_sql(Dialect::Sqlite) {
        sqlx::query(ddl).execute(&pool).await.unwrap();
    }
    sqlx::query(ARTICLE_TABLE_SQL).execute(&pool).await.unwrap();
    pool
}

pub fn article() -> Entity {
    Entity::new("article").url_column("title").url_prefix("/posts")
}

/// Creates the article table with the given behaviors applied.
pub async fn article_with(behaviors: &[BehaviorKind]) -> SqlitePool {
    let pool = create_test_pool().await;
    let store = TemplateStore::new(Dialect::Sqlite);
    let introspector = SqliteIntrospector::new(pool.clone());
    let entity = article();
    let statements = TriggerCompiler::new(&store)
        .compile(&entity, behaviors, &introspector)
        .await
        .unwrap();
    apply(&pool, &entity.table, &statements).await.unwrap();
    pool
}

pub async fn insert(pool: &SqlitePool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query(sql)
        .execute(pool)
        .await
        .map(|r| r.last_insert_rowid())
}

pub async fn text_column(pool: &SqlitePool, column: &str, id: i64) -> Option<String> {
    let (value,): (Option<String>,) =
        sqlx::query_as(&format!("SELECT {column} FROM article WHERE id = ?"))
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap();
    value
}

pub fn violation(err: &sqlx::Error) -> ViolationReason {
    StateMachineViolation::from_sqlx(err)
        .unwrap_or_else(|| panic!("expected a state machine violation, got {err}"))
        .reason
}
