//! Storage for state machine definitions and the transition queue.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::{StateMachineDefinition, Transition};
use crate::dialect::Dialect;
use crate::error::Result;

const SQLITE_SCHEMA: [&str; 2] = [
    r"CREATE TABLE IF NOT EXISTS state_machine (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity TEXT NOT NULL UNIQUE,
    default_state TEXT,
    entry_states TEXT,
    states TEXT,
    transitions TEXT
)",
    r"CREATE TABLE IF NOT EXISTS state_machine_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    created_at TEXT,
    updated_at TEXT,
    old_state TEXT NOT NULL DEFAULT '',
    new_state TEXT NOT NULL
)",
];

const MYSQL_SCHEMA: [&str; 2] = [
    r"CREATE TABLE IF NOT EXISTS state_machine (
    id INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    entity VARCHAR(128) NOT NULL UNIQUE,
    default_state VARCHAR(128) NULL,
    entry_states JSON NULL,
    states JSON NULL,
    transitions JSON NULL
)",
    r"CREATE TABLE IF NOT EXISTS state_machine_queue (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    entity VARCHAR(128) NOT NULL,
    entity_id BIGINT UNSIGNED NOT NULL,
    created_at DATETIME NULL,
    updated_at DATETIME NULL,
    old_state VARCHAR(128) NOT NULL DEFAULT '',
    new_state VARCHAR(128) NOT NULL,
    KEY idx_state_machine_queue_entity (entity, entity_id)
)",
];

/// Returns the DDL for the `state_machine` and `state_machine_queue` tables.
#[must_use]
pub const fn schema_sql(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Sqlite => &SQLITE_SCHEMA,
        Dialect::MySql => &MYSQL_SCHEMA,
    }
}

/// One queued state change, as appended by the stateful triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// Queue row id (insertion order).
    pub id: i64,
    /// Entity (table) of the changed row.
    pub entity: String,
    /// Primary key of the changed row.
    pub entity_id: i64,
    /// Row's `created_at` at the time of the change.
    pub created_at: Option<String>,
    /// Row's `updated_at` at the time of the change.
    pub updated_at: Option<String>,
    /// Previous state; empty for a first assignment.
    pub old_state: String,
    /// State entered.
    pub new_state: String,
}

/// Validates and stores a definition, replacing any previous one for the
/// same entity.
pub async fn save_definition(pool: &SqlitePool, definition: &StateMachineDefinition) -> Result<()> {
    definition.validate()?;

    sqlx::query(
        "INSERT INTO state_machine (entity, default_state, entry_states, states, transitions)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(entity) DO UPDATE SET
             default_state = excluded.default_state,
             entry_states = excluded.entry_states,
             states = excluded.states,
             transitions = excluded.transitions",
    )
    .bind(&definition.entity)
    .bind(&definition.default_state)
    .bind(serde_json::to_string(&definition.entry_states)?)
    .bind(serde_json::to_string(&definition.states)?)
    .bind(serde_json::to_string(&definition.transitions)?)
    .execute(pool)
    .await?;

    debug!(entity = %definition.entity, "Saved state machine definition");
    Ok(())
}

/// Loads the definition for an entity, if one exists.
pub async fn load_definition(
    pool: &SqlitePool,
    entity: &str,
) -> Result<Option<StateMachineDefinition>> {
    let row: Option<(Option<String>, Option<String>, Option<String>, Option<String>)> =
        sqlx::query_as(
            "SELECT default_state, entry_states, states, transitions FROM state_machine WHERE entity = ?",
        )
        .bind(entity)
        .fetch_optional(pool)
        .await?;

    let Some((default_state, entry_states, states, transitions)) = row else {
        return Ok(None);
    };

    Ok(Some(StateMachineDefinition {
        entity: entity.to_string(),
        default_state,
        entry_states: parse_set::<String>(entry_states.as_deref())?,
        states: parse_set::<String>(states.as_deref())?,
        transitions: parse_set::<Transition>(transitions.as_deref())?,
    }))
}

/// Returns the queued state changes of an entity, oldest first.
pub async fn transitions_for(pool: &SqlitePool, entity: &str) -> Result<Vec<StateTransition>> {
    let rows: Vec<(i64, String, i64, Option<String>, Option<String>, String, String)> =
        sqlx::query_as(
            "SELECT id, entity, entity_id, created_at, updated_at, old_state, new_state
             FROM state_machine_queue WHERE entity = ? ORDER BY id",
        )
        .bind(entity)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, entity, entity_id, created_at, updated_at, old_state, new_state)| {
                StateTransition {
                    id,
                    entity,
                    entity_id,
                    created_at,
                    updated_at,
                    old_state,
                    new_state,
                }
            },
        )
        .collect())
}

fn parse_set<T: DeserializeOwned + Ord>(json: Option<&str>) -> Result<BTreeSet<T>> {
    match json {
        Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(text)?),
        _ => Ok(BTreeSet::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BehaveError;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        for ddl in schema_sql(Dialect::Sqlite) {
            sqlx::query(ddl).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let pool = create_test_pool().await;
        let def = StateMachineDefinition::new("article")
            .states(["draft", "live"])
            .entry_states(["draft"])
            .default_state("draft")
            .transition("draft", "live");

        save_definition(&pool, &def).await.unwrap();
        let loaded = load_definition(&pool, "article").await.unwrap().unwrap();
        assert_eq!(loaded, def);

        assert!(load_definition(&pool, "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_existing() {
        let pool = create_test_pool().await;
        save_definition(&pool, &StateMachineDefinition::new("article").states(["a"]))
            .await
            .unwrap();
        save_definition(&pool, &StateMachineDefinition::new("article").states(["b"]))
            .await
            .unwrap();

        let loaded = load_definition(&pool, "article").await.unwrap().unwrap();
        assert_eq!(loaded.states.into_iter().collect::<Vec<_>>(), vec!["b"]);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM state_machine")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_definition() {
        let pool = create_test_pool().await;
        let def = StateMachineDefinition::new("article")
            .states(["draft"])
            .default_state("live");
        let result = save_definition(&pool, &def).await;
        assert!(matches!(result, Err(BehaveError::InvalidDefinition { .. })));
    }

    #[tokio::test]
    async fn test_null_columns_load_as_open_sets() {
        let pool = create_test_pool().await;
        sqlx::query("INSERT INTO state_machine (entity) VALUES ('loose')")
            .execute(&pool)
            .await
            .unwrap();

        let loaded = load_definition(&pool, "loose").await.unwrap().unwrap();
        assert!(loaded.states.is_empty());
        assert!(loaded.transitions.is_empty());
        assert!(loaded.default_state.is_none());
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let pool = create_test_pool().await;
        assert!(transitions_for(&pool, "article").await.unwrap().is_empty());
    }
}
