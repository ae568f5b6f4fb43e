//! Integration tests for the SEO URL behavior on SQLite.

mod common;

use common::{article_with, insert, text_column};
use rowkeeper_behave::prelude::BehaviorKind;
use sqlx::sqlite::SqlitePool;

async fn seo() -> SqlitePool {
    article_with(&[BehaviorKind::Seo]).await
}

async fn set_url(pool: &SqlitePool, id: i64, url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE article SET url = ? WHERE id = ?")
        .bind(url)
        .bind(id)
        .execute(pool)
        .await
        .map(|_| ())
}

fn history(raw: Option<String>) -> Vec<String> {
    raw.map(|json| serde_json::from_str(&json).unwrap())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_urls_are_derived_and_unique() {
    let pool = seo().await;

    let mut urls = Vec::new();
    for _ in 0..3 {
        let id = insert(&pool, "INSERT INTO article (title) VALUES ('Hello World')")
            .await
            .unwrap();
        urls.push(text_column(&pool, "url", id).await.unwrap());
    }

    assert_eq!(
        urls,
        vec![
            "/posts/hello-world",
            "/posts/hello-world1",
            "/posts/hello-world2"
        ]
    );
}

#[tokio::test]
async fn test_freed_suffix_is_reused() {
    let pool = seo().await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(
            insert(&pool, "INSERT INTO article (title) VALUES ('Hello World')")
                .await
                .unwrap(),
        );
    }

    set_url(&pool, ids[1], "/elsewhere").await.unwrap();

    let id = insert(&pool, "INSERT INTO article (title) VALUES ('Hello World')")
        .await
        .unwrap();
    assert_eq!(
        text_column(&pool, "url", id).await.as_deref(),
        Some("/posts/hello-world1")
    );
}

#[tokio::test]
async fn test_supplied_url_gets_leading_slash() {
    let pool = seo().await;
    let id = insert(&pool, "INSERT INTO article (title, url) VALUES ('x', 'custom')")
        .await
        .unwrap();

    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/custom"));
    assert!(text_column(&pool, "url_past", id).await.is_none());
}

#[tokio::test]
async fn test_supplied_url_collision_is_suffixed() {
    let pool = seo().await;
    insert(&pool, "INSERT INTO article (url) VALUES ('/custom')")
        .await
        .unwrap();
    let id = insert(&pool, "INSERT INTO article (url) VALUES ('/custom')")
        .await
        .unwrap();

    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/custom1"));
    assert!(text_column(&pool, "url_past", id).await.is_none());
}

#[tokio::test]
async fn test_update_records_history() {
    let pool = seo().await;
    let id = insert(&pool, "INSERT INTO article (title) VALUES ('First Title')")
        .await
        .unwrap();

    set_url(&pool, id, "/second").await.unwrap();
    set_url(&pool, id, "third").await.unwrap();

    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/third"));
    assert_eq!(
        history(text_column(&pool, "url_past", id).await),
        vec!["/posts/first-title", "/second"]
    );

    // Returning to a past URL does not duplicate it
    set_url(&pool, id, "/second").await.unwrap();
    assert_eq!(
        history(text_column(&pool, "url_past", id).await),
        vec!["/posts/first-title", "/second", "/third"]
    );
}

#[tokio::test]
async fn test_empty_url_is_rejected() {
    let pool = seo().await;
    let id = insert(&pool, "INSERT INTO article (title) VALUES ('Kept')")
        .await
        .unwrap();

    let err = set_url(&pool, id, "").await.unwrap_err();
    assert!(
        err.to_string().contains("article.url cannot be updated to EMPTY"),
        "{err}"
    );
    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/posts/kept"));
}

#[tokio::test]
async fn test_other_columns_leave_url_alone() {
    let pool = seo().await;
    let id = insert(&pool, "INSERT INTO article (title) VALUES ('Stable')")
        .await
        .unwrap();

    sqlx::query("UPDATE article SET title = 'Renamed' WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/posts/stable"));
    assert!(text_column(&pool, "url_past", id).await.is_none());
}

#[tokio::test]
async fn test_history_keeps_url_shared_with_another_row() {
    let pool = seo().await;
    let first = insert(&pool, "INSERT INTO article (title) VALUES ('x')")
        .await
        .unwrap();
    let second = insert(&pool, "INSERT INTO article (title) VALUES ('x')")
        .await
        .unwrap();
    assert!(text_column(&pool, "url_past", second).await.is_none());

    // Updates may reuse a URL held by another row
    set_url(&pool, second, "/posts/x").await.unwrap();
    assert_eq!(
        history(text_column(&pool, "url_past", second).await),
        vec!["/posts/x1"]
    );

    set_url(&pool, first, "/new").await.unwrap();
    assert_eq!(text_column(&pool, "url", first).await.as_deref(), Some("/new"));
    assert_eq!(
        history(text_column(&pool, "url_past", first).await),
        vec!["/posts/x"]
    );
}

#[tokio::test]
async fn test_inserted_history_is_kept() {
    let pool = seo().await;
    insert(&pool, "INSERT INTO article (url) VALUES ('/taken')")
        .await
        .unwrap();
    let id = insert(
        &pool,
        r#"INSERT INTO article (url, url_past) VALUES ('taken', '["/legacy"]')"#,
    )
    .await
    .unwrap();

    assert_eq!(text_column(&pool, "url", id).await.as_deref(), Some("/taken1"));
    assert_eq!(
        history(text_column(&pool, "url_past", id).await),
        vec!["/legacy"]
    );
}
