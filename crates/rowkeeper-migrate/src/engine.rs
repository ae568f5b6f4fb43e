//! Migration execution engine.
//!
//! Files are processed one at a time in the order given, and the
//! statements of a file in file order. Every executed or refused statement
//! upserts the file's ledger row. A failing statement is recorded and the
//! run moves on.

use rand::RngExt;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::confirm::{Challenge, ConfirmationProvider};
use crate::error::{MigrateError, Result};
use crate::identity::{ExecutorIdentity, HostIdentity};
use crate::ledger::{MigrationLedger, REMARKS_SUCCESS};
use crate::scanner;
use crate::script::{self, Statement};

const LOG_MESSAGE: &str = "Running SQL Migration";

/// What happened to one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// The statement executed.
    Succeeded,
    /// The database rejected the statement.
    Failed(String),
    /// The statement was not confirmed and did not run.
    Skipped(String),
}

impl StatementOutcome {
    /// Remarks stored in the ledger for this outcome.
    #[must_use]
    pub fn remarks(&self) -> &str {
        match self {
            Self::Succeeded => REMARKS_SUCCESS,
            Self::Failed(text) | Self::Skipped(text) => text,
        }
    }

    /// Returns whether the statement was sent to the database.
    #[must_use]
    pub fn executed(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Outcome of one statement of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementReport {
    /// Migration file.
    pub file: String,
    /// Position of the statement in the file.
    pub index: usize,
    /// What happened.
    pub outcome: StatementOutcome,
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Files that were pending, in execution order.
    pub files: Vec<String>,
    /// One entry per non-blank statement of every readable pending file.
    pub statements: Vec<StatementReport>,
    /// Pending files that could not be read.
    pub unreadable: Vec<String>,
}

impl RunReport {
    /// Number of statements sent to the database.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| s.outcome.executed())
            .count()
    }

    /// Number of statements that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Succeeded))
    }

    /// Number of statements the database rejected.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Failed(_)))
    }

    /// Number of statements refused by the operator.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Skipped(_)))
    }

    /// Outcomes of one file, in statement order.
    pub fn for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a StatementReport> {
        self.statements.iter().filter(move |s| s.file == file)
    }

    fn count(&self, pred: impl Fn(&StatementOutcome) -> bool) -> usize {
        self.statements.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Runs migration scripts against a database.
pub struct MigrationEngine<C, H> {
    pool: SqlitePool,
    ledger: MigrationLedger,
    config: MigrationConfig,
    confirmation: C,
    host: H,
}

impl<C: ConfirmationProvider, H: HostIdentity> MigrationEngine<C, H> {
    /// Creates an engine.
    pub fn new(pool: SqlitePool, config: MigrationConfig, confirmation: C, host: H) -> Self {
        let ledger = MigrationLedger::new(pool.clone());
        Self {
            pool,
            ledger,
            config,
            confirmation,
            host,
        }
    }

    /// Returns the ledger.
    #[must_use]
    pub fn ledger(&self) -> &MigrationLedger {
        &self.ledger
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Returns the confirmation provider.
    #[must_use]
    pub fn confirmation(&self) -> &C {
        &self.confirmation
    }

    /// Scans the configured directory and runs the pending files.
    pub async fn run_directory(&mut self) -> Result<RunReport> {
        let candidates = scanner::scan(&self.config)?;
        self.run(&candidates).await
    }

    /// Runs the pending files among `candidates`.
    ///
    /// Candidate names are relative to the configured directory. Only a
    /// failure to read the ledger aborts the run.
    pub async fn run(&mut self, candidates: &[String]) -> Result<RunReport> {
        let pending = self.ledger.pending(candidates).await.map_err(|e| {
            error!(error = %e, "{LOG_MESSAGE}");
            e
        })?;

        let mut report = RunReport {
            files: pending.clone(),
            ..RunReport::default()
        };

        if pending.is_empty() {
            info!(msg = "No new files found", "{LOG_MESSAGE}");
            return Ok(report);
        }

        let who = self.host.identity();

        for file in &pending {
            let path = self.config.dir.join(file);
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "{LOG_MESSAGE}");
                    report.unreadable.push(file.clone());
                    continue;
                }
            };

            let statements = script::split(&content);
            if statements.is_empty() {
                // Nothing to run, but the file is done
                info!(file_name = %file, msg = "No statements found", "{LOG_MESSAGE}");
                self.record(file, &StatementOutcome::Succeeded, &who).await;
                continue;
            }

            for statement in statements {
                let outcome = self.execute(file, &statement).await;
                self.record(file, &outcome, &who).await;
                report.statements.push(StatementReport {
                    file: file.clone(),
                    index: statement.index,
                    outcome,
                });
            }
        }

        info!(
            files = report.files.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Migration run finished"
        );
        Ok(report)
    }

    async fn execute(&mut self, file: &str, statement: &Statement) -> StatementOutcome {
        info!(file_name = %file, query = %statement.sql.trim(), "{LOG_MESSAGE}");

        if statement.is_restricted() && !self.confirm(file) {
            let err = MigrateError::RestrictedKeyword {
                file: file.to_string(),
            };
            info!(file_name = %file, status = "Failed", error = %err, "{LOG_MESSAGE}");
            return StatementOutcome::Skipped(err.to_string());
        }

        match sqlx::raw_sql(&statement.sql).execute(&self.pool).await {
            Ok(_) => {
                info!(file_name = %file, status = "Success", "{LOG_MESSAGE}");
                StatementOutcome::Succeeded
            }
            Err(e) => {
                let err = MigrateError::Execution(e);
                info!(file_name = %file, status = "Failed", error = %err, "{LOG_MESSAGE}");
                StatementOutcome::Failed(err.to_string())
            }
        }
    }

    fn confirm(&mut self, file: &str) -> bool {
        let challenge = Challenge::new(file, confirmation_code());
        let confirmed = match self.confirmation.ask(&challenge) {
            Ok(reply) => challenge.accepts(&reply),
            Err(e) => {
                warn!(file_name = %file, error = %e, "Could not read confirmation");
                false
            }
        };
        if !confirmed {
            self.confirmation.rejected(&challenge);
        }
        confirmed
    }

    async fn record(&self, file: &str, outcome: &StatementOutcome, who: &ExecutorIdentity) {
        // The statement already ran; a lost ledger row is only reported
        if let Err(e) = self.ledger.record(file, outcome.remarks(), who).await {
            error!(file_name = %file, error = %e, "Update Status Failed");
        } else {
            debug!(file_name = %file, remarks = %outcome.remarks(), "Recorded ledger entry");
        }
    }
}

/// Draws a four-digit confirmation code.
fn confirmation_code() -> u16 {
    rand::rng().random_range(1000..10000)
}
