//! rowkeeper CLI
//!
//! Command-line tool for running migration scripts and installing
//! behavior triggers.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use rowkeeper_behave::prelude::{
    Dialect, SqliteIntrospector, TemplateStore, TriggerCompiler, apply, save_definition,
    schema_sql,
};
use rowkeeper_migrate::config::DEFAULT_MIGRATION_DIR;
use rowkeeper_migrate::prelude::*;

/// Run-once SQL migrations and database-enforced entity behaviors.
#[derive(Parser)]
#[command(name = "rowkeeper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:rowkeeper.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run pending migration scripts.
    Migrate {
        /// Files to consider, relative to the migration directory
        /// (all scripts in the directory if not specified).
        files: Vec<String>,

        /// Migration directory.
        #[arg(long, env = "ROWKEEPER_MIGRATION_DIR", default_value = DEFAULT_MIGRATION_DIR)]
        dir: PathBuf,
    },

    /// Show the migration ledger.
    Status,

    /// Flag a file to run again on the next migrate.
    Rerun {
        /// File name as recorded in the ledger.
        file: String,
    },

    /// Compile behavior triggers from a manifest.
    ///
    /// Printing does not read a live schema: `updated_at` is always treated
    /// as missing, so the timed trigger is printed even when the column
    /// already updates itself. `--apply` inspects the target database and
    /// skips it there.
    Triggers {
        /// JSON manifest of entities and behaviors.
        #[arg(short, long)]
        manifest: PathBuf,

        /// SQL dialect to compile for.
        #[arg(long, value_enum, default_value_t = DialectArg::Sqlite)]
        dialect: DialectArg,

        /// Install the triggers instead of printing them (SQLite only).
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Sqlite,
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Migration statements share one session
    let options = SqliteConnectOptions::from_str(&cli.database)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    match cli.command {
        Commands::Migrate { files, dir } => {
            let mut engine = MigrationEngine::new(
                pool,
                MigrationConfig::new(dir),
                ConsoleConfirmation::stdio(),
                SystemIdentity,
            );

            let report = if files.is_empty() {
                engine.run_directory().await?
            } else {
                engine.run(&files).await?
            };

            for file in &report.unreadable {
                warn!(file = %file, "Skipped unreadable migration file");
            }
            info!(
                executed = report.executed(),
                failed = report.failed(),
                skipped = report.skipped(),
                "Done"
            );
        }

        Commands::Status => {
            let entries = MigrationLedger::new(pool).entries().await?;

            if entries.is_empty() {
                info!("No migrations have been run yet.");
            } else {
                println!("\nMigration ledger:");
                println!("{:-<60}", "");

                for entry in &entries {
                    let mark = if entry.re_run { "R" } else { "X" };
                    println!(
                        " [{}] {} ({}) {}",
                        mark,
                        entry.filename,
                        entry.updated_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.remarks
                    );
                }
                println!();
            }
        }

        Commands::Rerun { file } => {
            MigrationLedger::new(pool).set_rerun(&file, true).await?;
            info!(file = %file, "Flagged for re-run");
        }

        Commands::Triggers {
            manifest,
            dialect,
            apply,
        } => {
            let manifest = Manifest::load(&manifest)?;
            let dialect = Dialect::from(dialect);

            if apply {
                if dialect != Dialect::Sqlite {
                    bail!("--apply is only supported for the sqlite dialect");
                }
                install(&pool, &manifest).await?;
            } else {
                print_triggers(dialect, &manifest).await?;
            }
        }
    }

    Ok(())
}

async fn print_triggers(dialect: Dialect, manifest: &Manifest) -> anyhow::Result<()> {
    let store = TemplateStore::new(dialect);
    let compiler = TriggerCompiler::new(&store);

    for item in &manifest.entities {
        let statements = compiler
            .compile(&item.entity, &item.behaviors, &DetachedIntrospector)
            .await?;

        println!("-- {} ({})", item.entity.table, dialect);
        for sql in &statements {
            println!("{sql};");
            if dialect == Dialect::MySql {
                println!("------");
            }
        }
        println!();
    }
    Ok(())
}

async fn install(pool: &SqlitePool, manifest: &Manifest) -> anyhow::Result<()> {
    for ddl in schema_sql(Dialect::Sqlite) {
        sqlx::query(ddl).execute(pool).await?;
    }

    let store = TemplateStore::new(Dialect::Sqlite);
    let compiler = TriggerCompiler::new(&store);
    let introspector = SqliteIntrospector::new(pool.clone());

    for item in &manifest.entities {
        if let Some(def) = item.definition() {
            save_definition(pool, &def).await?;
        }
        let statements = compiler
            .compile(&item.entity, &item.behaviors, &introspector)
            .await?;
        apply(pool, &item.entity.table, &statements).await?;
    }
    Ok(())
}
