//! edsync-ingest - live-mode event synchronization
//!
//! Replays an NDJSON event stream against the destination database. The
//! stream is the transport stand-in: broker consumption, offsets and
//! retries live upstream and deliver the same shape.

use anyhow::Result;
use clap::Parser;
use edsync_common::db::{init_database, SyncStore};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edsync-ingest", about = "EdSync live event synchronization")]
struct Args {
    /// Destination database path (falls back to EDSYNC_DATABASE, then the
    /// config file, then the platform default)
    #[arg(long)]
    database: Option<String>,

    /// NDJSON event stream to replay; stdin when omitted
    #[arg(long)]
    events: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting edsync-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = edsync_common::config::resolve_database_path(args.database.as_deref());
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    let store = SyncStore::new(pool).await;

    let stats = match &args.events {
        Some(path) => {
            info!("Replaying events from {}", path.display());
            let reader = BufReader::new(File::open(path)?);
            edsync_ingest::stream::replay(&store, reader).await?
        }
        None => {
            info!("Replaying events from stdin");
            let stdin = io::stdin();
            let reader = stdin.lock();
            edsync_ingest::stream::replay(&store, reader).await?
        }
    };

    info!("Replay complete: {}", stats.display_string());

    Ok(())
}
