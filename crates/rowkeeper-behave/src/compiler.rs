//! Behavior-to-trigger compilation.
//!
//! The compiler turns an entity and its attached behaviors into the
//! ordered list of statements that enforce them. Schema-sync tooling
//! applies the list once, when the table is created.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::behavior::{BehaviorKind, Entity, Resolver, TABLE_PLACEHOLDER};
use crate::error::Result;
use crate::introspect::ModelIntrospector;
use crate::resolver;
use crate::templates::TemplateStore;

/// Compiles behaviors into executable trigger statements.
#[derive(Debug, Clone, Copy)]
pub struct TriggerCompiler<'a> {
    store: &'a TemplateStore,
}

impl<'a> TriggerCompiler<'a> {
    /// Creates a compiler over a template registry.
    #[must_use]
    pub const fn new(store: &'a TemplateStore) -> Self {
        Self { store }
    }

    /// Returns the registry this compiler reads from.
    #[must_use]
    pub const fn store(&self) -> &'a TemplateStore {
        self.store
    }

    /// Compiles the behaviors of an entity, in the order given.
    ///
    /// Repeated behaviors are compiled once. Nothing is cached between
    /// calls, so generated behaviors see the schema as it is now.
    pub async fn compile<I: ModelIntrospector>(
        &self,
        entity: &Entity,
        behaviors: &[BehaviorKind],
        introspector: &I,
    ) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        let mut seen = Vec::with_capacity(behaviors.len());

        for &kind in behaviors {
            if seen.contains(&kind) {
                continue;
            }
            seen.push(kind);

            let templates = match kind.resolver() {
                Resolver::Static => self
                    .store
                    .lookup(kind)
                    .iter()
                    .map(|t| (*t).to_string())
                    .collect(),
                Resolver::Generated => {
                    resolver::resolve(kind, self.store.dialect(), entity, introspector).await?
                }
            };

            debug!(
                table = %entity.table,
                behavior = %kind,
                count = templates.len(),
                "Resolved behavior"
            );

            statements.extend(
                templates
                    .iter()
                    .map(|t| t.replace(TABLE_PLACEHOLDER, &entity.table)),
            );
        }

        Ok(statements)
    }
}

/// Executes compiled statements in order against a SQLite database.
pub async fn apply(pool: &SqlitePool, table: &str, statements: &[String]) -> Result<()> {
    for sql in statements {
        debug!(sql = %sql, "Executing trigger SQL");
        sqlx::query(sql).execute(pool).await?;
    }
    info!(table = %table, count = statements.len(), "Applied behavior triggers");
    Ok(())
}
