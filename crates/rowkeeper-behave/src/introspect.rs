//! Column metadata lookup for schema-aware behaviors.
//!
//! The compiler only defines what it needs to know about a column through
//! [`ModelIntrospector`]; [`SqliteIntrospector`] answers it from a live
//! SQLite database.

use std::future::Future;

use sqlx::sqlite::SqlitePool;

use crate::error::SchemaIntrospectionError;

/// Extra modifier reported for columns that refresh themselves on update.
pub const ON_UPDATE_CURRENT_TIMESTAMP: &str = "on update CURRENT_TIMESTAMP";

/// Metadata of one column, shaped like MySQL's `SHOW COLUMNS` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Key role (`PRI`, `UNI`, `MUL` or empty).
    pub key: String,
    /// Default expression.
    pub default: Option<String>,
    /// Extra modifiers such as `auto_increment`.
    pub extra: String,
}

impl ColumnInfo {
    /// Returns whether the column already refreshes itself on update.
    #[must_use]
    pub fn auto_updates(&self) -> bool {
        self.extra
            .to_lowercase()
            .contains(&ON_UPDATE_CURRENT_TIMESTAMP.to_lowercase())
    }
}

/// Reads current column metadata for an entity.
pub trait ModelIntrospector {
    /// Returns the column's metadata, or `None` if the table has no such
    /// column.
    fn column(
        &self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = Result<Option<ColumnInfo>, SchemaIntrospectionError>> + Send;
}

/// Introspector backed by `pragma_table_info` and `sqlite_master`.
///
/// SQLite has no `ON UPDATE` column clause. A column counts as
/// auto-updating when a trigger on its table assigns it
/// `CURRENT_TIMESTAMP`, and is then reported with the
/// [`ON_UPDATE_CURRENT_TIMESTAMP`] extra modifier.
#[derive(Debug, Clone)]
pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    /// Creates an introspector over a pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ModelIntrospector for SqliteIntrospector {
    async fn column(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Option<ColumnInfo>, SchemaIntrospectionError> {
        let fail = |e: sqlx::Error| SchemaIntrospectionError::new(table, column, e);

        let row: Option<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) WHERE name = ?"#,
        )
        .bind(table)
        .bind(column)
        .fetch_optional(&self.pool)
        .await
        .map_err(fail)?;

        let Some((name, data_type, not_null, default, pk)) = row else {
            return Ok(None);
        };

        let (refreshers,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'trigger' AND tbl_name = ? AND sql LIKE ?",
        )
        .bind(table)
        .bind(format!("%SET {column} = CURRENT_TIMESTAMP%"))
        .fetch_one(&self.pool)
        .await
        .map_err(fail)?;

        Ok(Some(ColumnInfo {
            name,
            data_type,
            nullable: not_null == 0,
            key: if pk > 0 { "PRI".to_string() } else { String::new() },
            default,
            extra: if refreshers > 0 {
                ON_UPDATE_CURRENT_TIMESTAMP.to_string()
            } else {
                String::new()
            },
        }))
    }
}
