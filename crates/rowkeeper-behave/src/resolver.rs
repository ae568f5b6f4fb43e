//! Schema-aware trigger generation for dynamic behaviors.

use tracing::debug;

use crate::behavior::{BehaviorKind, Entity};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::introspect::ModelIntrospector;
use crate::templates::{mysql, sqlite};

/// Generates the bodies of a dynamic behavior for an entity.
///
/// Static behaviors yield nothing here; they are served by the
/// [`TemplateStore`](crate::templates::TemplateStore). Returned bodies
/// still carry the table placeholder.
pub async fn resolve<I: ModelIntrospector>(
    kind: BehaviorKind,
    dialect: Dialect,
    entity: &Entity,
    introspector: &I,
) -> Result<Vec<String>> {
    match kind {
        BehaviorKind::Timed => resolve_timed(dialect, entity, introspector).await,
        BehaviorKind::Seo => Ok(resolve_seo(dialect, entity)),
        BehaviorKind::Uid10 | BehaviorKind::Uid8 | BehaviorKind::SoftDelete | BehaviorKind::Stateful => {
            Ok(Vec::new())
        }
    }
}

async fn resolve_timed<I: ModelIntrospector>(
    dialect: Dialect,
    entity: &Entity,
    introspector: &I,
) -> Result<Vec<String>> {
    let column = introspector.column(&entity.table, "updated_at").await?;

    if column.as_ref().is_some_and(|c| c.auto_updates()) {
        debug!(table = %entity.table, "updated_at already refreshes on update");
        return Ok(Vec::new());
    }

    let body = match dialect {
        Dialect::Sqlite => sqlite::TIMED,
        Dialect::MySql => mysql::TIMED,
    };
    Ok(vec![body.to_string()])
}

fn resolve_seo(dialect: Dialect, entity: &Entity) -> Vec<String> {
    let seo = &entity.seo;
    match dialect {
        Dialect::Sqlite => sqlite::seo(&seo.url_column, &seo.url_prefix),
        Dialect::MySql => mysql::seo(&seo.url_column, &seo.url_prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BehaveError, SchemaIntrospectionError};
    use crate::introspect::{ColumnInfo, ON_UPDATE_CURRENT_TIMESTAMP};

    struct FixedColumn(Option<ColumnInfo>);

    impl ModelIntrospector for FixedColumn {
        async fn column(
            &self,
            _table: &str,
            _column: &str,
        ) -> std::result::Result<Option<ColumnInfo>, SchemaIntrospectionError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl ModelIntrospector for Broken {
        async fn column(
            &self,
            table: &str,
            column: &str,
        ) -> std::result::Result<Option<ColumnInfo>, SchemaIntrospectionError> {
            Err(SchemaIntrospectionError::new(table, column, "connection reset"))
        }
    }

    fn updated_at(extra: &str) -> FixedColumn {
        FixedColumn(Some(ColumnInfo {
            name: "updated_at".to_string(),
            data_type: "datetime".to_string(),
            extra: extra.to_string(),
            ..ColumnInfo::default()
        }))
    }

    #[tokio::test]
    async fn test_timed_emits_alter_when_missing() {
        let entity = Entity::new("post");
        let bodies = resolve(BehaviorKind::Timed, Dialect::MySql, &entity, &updated_at(""))
            .await
            .unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].starts_with("ALTER TABLE <<Table>> MODIFY COLUMN updated_at"));
        assert!(bodies[0].ends_with("ON UPDATE CURRENT_TIMESTAMP"));
    }

    #[tokio::test]
    async fn test_timed_is_idempotent() {
        let entity = Entity::new("post");
        let introspector = updated_at(ON_UPDATE_CURRENT_TIMESTAMP);
        for _ in 0..2 {
            let bodies = resolve(BehaviorKind::Timed, Dialect::MySql, &entity, &introspector)
                .await
                .unwrap();
            assert!(bodies.is_empty());
        }
    }

    #[tokio::test]
    async fn test_timed_without_column_still_emits() {
        let entity = Entity::new("post");
        let bodies = resolve(BehaviorKind::Timed, Dialect::Sqlite, &entity, &FixedColumn(None))
            .await
            .unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("_timed_aft_update"));
    }

    #[tokio::test]
    async fn test_introspection_failure_propagates() {
        let entity = Entity::new("post");
        let result = resolve(BehaviorKind::Timed, Dialect::MySql, &entity, &Broken).await;
        match result {
            Err(BehaveError::SchemaIntrospection(e)) => {
                assert_eq!(e.table, "post");
                assert_eq!(e.column, "updated_at");
            }
            other => panic!("expected introspection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_seo_uses_entity_settings() {
        let entity = Entity::new("article")
            .url_column("title")
            .url_prefix("/blog");
        for dialect in [Dialect::Sqlite, Dialect::MySql] {
            let bodies = resolve(BehaviorKind::Seo, dialect, &entity, &Broken)
                .await
                .unwrap();
            assert!(bodies.len() >= 2, "{dialect}");
            assert!(bodies.iter().all(|b| b.contains("<<Table>>_seo_")));
            assert!(bodies.iter().any(|b| b.contains("NEW.title")));
            assert!(bodies.iter().any(|b| b.contains("'/blog/'")));
        }
    }

    #[tokio::test]
    async fn test_static_kinds_resolve_to_nothing() {
        let entity = Entity::new("post");
        let bodies = resolve(BehaviorKind::Stateful, Dialect::Sqlite, &entity, &Broken)
            .await
            .unwrap();
        assert!(bodies.is_empty());
    }
}
