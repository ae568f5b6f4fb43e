//! Migration ledger.
//!
//! This module manages the `sql_migration_task` table, one row per
//! migration file, recording the outcome of its last execution and whether
//! the operator asked for it to run again.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::identity::ExecutorIdentity;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "sql_migration_task";

/// SQL to create the ledger table (SQLite).
pub const CREATE_LEDGER_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS sql_migration_task (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,
    re_run INTEGER NOT NULL DEFAULT 0,
    remarks TEXT NOT NULL DEFAULT '',
    who TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Remarks recorded for a statement that executed.
pub const REMARKS_SUCCESS: &str = "Success";

/// One ledger row.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    /// Unique ID in the ledger table.
    pub id: i64,
    /// Migration file name, relative to the migration directory.
    pub filename: String,
    /// Whether the file runs again on the next pass.
    pub re_run: bool,
    /// `Success` or the last error text.
    pub remarks: String,
    /// Host that last executed the file.
    pub who: Option<ExecutorIdentity>,
    /// First execution.
    pub created_at: DateTime<Utc>,
    /// Last execution.
    pub updated_at: DateTime<Utc>,
}

type LedgerRow = (i64, String, i64, String, Option<String>, String, String);

/// Reads and writes the migration ledger.
#[derive(Debug, Clone)]
pub struct MigrationLedger {
    pool: SqlitePool,
}

impl MigrationLedger {
    /// Creates a ledger over a pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns whether the ledger table exists.
    pub async fn has_table(&self) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(LEDGER_TABLE)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Ensures the ledger table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_LEDGER_TABLE_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns the candidates that must run, in the order given.
    ///
    /// A candidate is pending when it has no ledger row or its row is
    /// flagged for re-run. When the ledger table does not exist yet it is
    /// created and every candidate is pending.
    pub async fn pending(&self, candidates: &[String]) -> Result<Vec<String>> {
        if !self.has_table().await? {
            debug!("Ledger table missing, creating it");
            self.ensure_table().await?;
            return Ok(candidates.to_vec());
        }

        let placeholders = vec!["?"; candidates.len()].join(", ");
        let sql = if candidates.is_empty() {
            "SELECT filename, re_run FROM sql_migration_task WHERE re_run = 1".to_string()
        } else {
            format!(
                "SELECT filename, re_run FROM sql_migration_task WHERE filename IN ({placeholders}) OR re_run = 1"
            )
        };

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
        for name in candidates {
            query = query.bind(name);
        }
        let executed: HashMap<String, bool> = query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|(name, re_run)| (name, re_run == 1))
            .collect();

        Ok(candidates
            .iter()
            .filter(|name| executed.get(*name).copied().unwrap_or(true))
            .cloned()
            .collect())
    }

    /// Records the outcome of one statement of a file.
    ///
    /// Inserts the file's row or updates it in place. The re-run flag is
    /// cleared whatever the outcome.
    pub async fn record(&self, filename: &str, remarks: &str, who: &ExecutorIdentity) -> Result<()> {
        let upsert = |source| MigrateError::LedgerUpsert {
            file: filename.to_string(),
            source,
        };
        let who = serde_json::to_string(who)?;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        sqlx::query(
            r"INSERT INTO sql_migration_task (filename, re_run, remarks, who, created_at, updated_at)
VALUES (?, 0, ?, ?, ?, ?)
ON CONFLICT(filename) DO UPDATE SET
    re_run = 0,
    remarks = excluded.remarks,
    who = excluded.who,
    updated_at = excluded.updated_at",
        )
        .bind(filename)
        .bind(remarks)
        .bind(who)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(upsert)?;
        Ok(())
    }

    /// Flags a file to run again on the next pass, or clears the flag.
    pub async fn set_rerun(&self, filename: &str, re_run: bool) -> Result<()> {
        let result = sqlx::query("UPDATE sql_migration_task SET re_run = ? WHERE filename = ?")
            .bind(i64::from(re_run))
            .bind(filename)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MigrateError::UnknownFile(filename.to_string()));
        }
        Ok(())
    }

    /// Returns the ledger row of a file.
    pub async fn entry(&self, filename: &str) -> Result<Option<LedgerEntry>> {
        let row: Option<LedgerRow> = sqlx::query_as(
            "SELECT id, filename, re_run, remarks, who, created_at, updated_at FROM sql_migration_task WHERE filename = ?",
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_entry).transpose()
    }

    /// Returns every ledger row, oldest first.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.has_table().await? {
            return Ok(Vec::new());
        }

        let rows: Vec<LedgerRow> = sqlx::query_as(
            "SELECT id, filename, re_run, remarks, who, created_at, updated_at FROM sql_migration_task ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_entry).collect()
    }
}

fn to_entry(row: LedgerRow) -> Result<LedgerEntry> {
    let (id, filename, re_run, remarks, who, created_at, updated_at) = row;
    let who = who
        .filter(|json| !json.is_empty())
        .map(|json| serde_json::from_str(&json))
        .transpose()?;

    Ok(LedgerEntry {
        id,
        filename,
        re_run: re_run == 1,
        remarks,
        who,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime format fallback
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .map(|dt| dt.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}
