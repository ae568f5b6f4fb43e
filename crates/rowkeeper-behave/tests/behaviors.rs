//! Integration tests for uid, soft delete and timed behaviors, alone and
//! combined, on SQLite.

mod common;

use std::collections::HashSet;

use common::{article, article_with, create_test_pool, insert, text_column};
use rowkeeper_behave::prelude::*;

#[tokio::test]
async fn test_soft_delete() {
    let pool = article_with(&[BehaviorKind::SoftDelete]).await;
    let id = insert(&pool, "INSERT INTO article (title) VALUES ('a')")
        .await
        .unwrap();

    let err = sqlx::query("DELETE FROM article WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("Cannot delete records from table. Instead set deleted=1"),
        "{err}"
    );

    sqlx::query("UPDATE article SET deleted = 1 WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(text_column(&pool, "deleted_at", id).await.is_some());

    sqlx::query("UPDATE article SET deleted = 0 WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(text_column(&pool, "deleted_at", id).await.is_none());
}

#[tokio::test]
async fn test_uid_lengths_and_uniqueness() {
    for (kind, len) in [(BehaviorKind::Uid10, 10), (BehaviorKind::Uid8, 8)] {
        let pool = article_with(&[kind]).await;

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = insert(&pool, "INSERT INTO article (title) VALUES ('a')")
                .await
                .unwrap();
            let uid = text_column(&pool, "uid", id).await.unwrap();
            assert_eq!(uid.len(), len, "{kind}: {uid}");
            assert!(uid.chars().all(|c| c.is_ascii_hexdigit()), "{uid}");
            assert!(seen.insert(uid), "{kind} produced a duplicate");
        }
    }
}

#[tokio::test]
async fn test_supplied_uid_is_kept() {
    let pool = article_with(&[BehaviorKind::Uid10]).await;
    let id = insert(&pool, "INSERT INTO article (uid) VALUES ('given')")
        .await
        .unwrap();
    assert_eq!(text_column(&pool, "uid", id).await.as_deref(), Some("given"));
}

#[tokio::test]
async fn test_timed_compiles_once() {
    let pool = create_test_pool().await;
    let store = TemplateStore::new(Dialect::Sqlite);
    let compiler = TriggerCompiler::new(&store);
    let introspector = SqliteIntrospector::new(pool.clone());
    let entity = article();

    let first = compiler
        .compile(&entity, &[BehaviorKind::Timed], &introspector)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    apply(&pool, &entity.table, &first).await.unwrap();

    for _ in 0..2 {
        let again = compiler
            .compile(&entity, &[BehaviorKind::Timed], &introspector)
            .await
            .unwrap();
        assert!(again.is_empty());
    }
}

#[tokio::test]
async fn test_timed_refreshes_updated_at() {
    let pool = article_with(&[BehaviorKind::Timed]).await;
    let id = insert(&pool, "INSERT INTO article (title) VALUES ('a')")
        .await
        .unwrap();

    // An explicit value is kept
    sqlx::query("UPDATE article SET updated_at = '2000-01-01 00:00:00' WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(
        text_column(&pool, "updated_at", id).await.as_deref(),
        Some("2000-01-01 00:00:00")
    );

    sqlx::query("UPDATE article SET title = 'b' WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    let refreshed = text_column(&pool, "updated_at", id).await.unwrap();
    assert_ne!(refreshed, "2000-01-01 00:00:00");
}

#[tokio::test]
async fn test_behaviors_combine() {
    let pool = article_with(&[
        BehaviorKind::Uid10,
        BehaviorKind::SoftDelete,
        BehaviorKind::Stateful,
        BehaviorKind::Timed,
        BehaviorKind::Seo,
    ])
    .await;
    let def = StateMachineDefinition::new("article")
        .states(["draft", "live"])
        .entry_states(["draft"])
        .default_state("draft")
        .transition("draft", "live");
    save_definition(&pool, &def).await.unwrap();

    let first = insert(&pool, "INSERT INTO article (title) VALUES ('Same Name')")
        .await
        .unwrap();
    let second = insert(&pool, "INSERT INTO article (title) VALUES ('Same Name')")
        .await
        .unwrap();

    for id in [first, second] {
        assert_eq!(text_column(&pool, "uid", id).await.unwrap().len(), 10);
        assert_eq!(
            text_column(&pool, "machine_state", id).await.as_deref(),
            Some("draft")
        );
    }
    assert_eq!(
        text_column(&pool, "url", second).await.as_deref(),
        Some("/posts/same-name1")
    );

    sqlx::query("UPDATE article SET machine_state = 'live', deleted = 1 WHERE id = ?")
        .bind(first)
        .execute(&pool)
        .await
        .unwrap();
    assert!(text_column(&pool, "deleted_at", first).await.is_some());

    let queue = transitions_for(&pool, "article").await.unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[2].entity_id, first);
    assert_eq!(queue[2].new_state, "live");

    assert!(sqlx::query("DELETE FROM article").execute(&pool).await.is_err());
}
