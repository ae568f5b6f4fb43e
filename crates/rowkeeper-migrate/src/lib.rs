//! Run-once SQL migration scripts with an execution ledger.
//!
//! `rowkeeper-migrate` executes `.sql` files from a migration directory,
//! each at most once unless an operator flags it for re-run, and records
//! the outcome and the executing host in the `sql_migration_task` table.
//!
//! # Features
//!
//! - **Ledger** - one row per file with remarks, re-run flag and executor
//! - **Multi-statement files** - chunks separated by `------` run and are
//!   recorded one by one
//! - **Confirmation gate** - statements mentioning `DELETE` need the
//!   operator to type back a random four-digit code
//! - **Partial failure** - a failing statement is recorded and the run
//!   continues
//!
//! # Example
//!
//! ```rust,ignore
//! use rowkeeper_migrate::prelude::*;
//!
//! let mut engine = MigrationEngine::new(
//!     pool,
//!     MigrationConfig::default(),
//!     ConsoleConfirmation::stdio(),
//!     SystemIdentity,
//! );
//! let report = engine.run_directory().await?;
//! println!("{} statements executed", report.executed());
//! ```

pub mod config;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod manifest;
pub mod scanner;
pub mod script;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::MigrationConfig;
    pub use crate::confirm::{
        Challenge, ConfirmationProvider, ConsoleConfirmation, Reply, ScriptedConfirmation,
    };
    pub use crate::engine::{MigrationEngine, RunReport, StatementOutcome, StatementReport};
    pub use crate::error::{MigrateError, Result};
    pub use crate::identity::{ExecutorIdentity, HostIdentity, StaticIdentity, SystemIdentity};
    pub use crate::ledger::{LedgerEntry, MigrationLedger};
    pub use crate::manifest::{DetachedIntrospector, EntityManifest, Manifest};
    pub use crate::scanner::scan;
    pub use crate::script::{STATEMENT_SEPARATOR, Statement, split};
}
