//! edsync-backfill - one-shot historical migration
//!
//! One subcommand per entity family, each reading source snapshot files
//! and reconciling against the destination database. Runs are idempotent;
//! rerunning a migration converges on the same destination state.

use anyhow::Result;
use clap::{Parser, Subcommand};
use edsync_common::db::{init_database, SyncStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edsync-backfill", about = "EdSync historical data migration")]
struct Args {
    /// Destination database path (falls back to EDSYNC_DATABASE, then the
    /// config file, then the platform default)
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrate cohorts and their custom-field values
    Cohorts {
        /// NDJSON export of source cohort rows
        #[arg(long)]
        cohorts: PathBuf,
        /// NDJSON export of the source field-values table
        #[arg(long)]
        field_values: PathBuf,
    },
    /// Migrate cohort memberships
    CohortMembers {
        #[arg(long)]
        members: PathBuf,
    },
    /// Migrate historical attendance into monthly tracker rows
    Attendance {
        #[arg(long)]
        attendance: PathBuf,
    },
    /// Migrate tenant/role registrations
    Registrations {
        #[arg(long)]
        registrations: PathBuf,
    },
    /// Migrate projects from solution documents
    Projects {
        #[arg(long)]
        solutions: PathBuf,
    },
    /// Migrate project tasks from project documents
    ProjectTasks {
        #[arg(long)]
        projects: PathBuf,
    },
    /// Migrate completed-task tracking from project documents
    TaskTrackings {
        #[arg(long)]
        projects: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting edsync-backfill");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = edsync_common::config::resolve_database_path(args.database.as_deref());
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    let store = SyncStore::new(pool).await;

    let stats = match &args.command {
        Command::Cohorts {
            cohorts,
            field_values,
        } => edsync_backfill::runners::cohorts::run(&store, cohorts, field_values).await?,
        Command::CohortMembers { members } => {
            edsync_backfill::runners::members::run(&store, members).await?
        }
        Command::Attendance { attendance } => {
            edsync_backfill::runners::attendance::run(&store, attendance).await?
        }
        Command::Registrations { registrations } => {
            edsync_backfill::runners::registrations::run(&store, registrations).await?
        }
        Command::Projects { solutions } => {
            edsync_backfill::runners::projects::run(&store, solutions).await?
        }
        Command::ProjectTasks { projects } => {
            edsync_backfill::runners::tasks::run(&store, projects).await?
        }
        Command::TaskTrackings { projects } => {
            edsync_backfill::runners::task_trackings::run(&store, projects).await?
        }
    };

    info!("Backfill complete: {}", stats.display_string());

    Ok(())
}
